use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use client_core::{
    ClientError, ClientResult, DeleteOutcome, EventDraft, EventHandle, EventKind, LookupData,
    OperationFailure,
};
use shared::{
    domain::{
        ActivityId, ActivityTypeId, EventId, InstitutionId, ResponsiblePartyId, TargetAudienceId,
        ThemeId, UniqueActivityId,
    },
    protocol::{
        ActivityType, Event, EventFields, Institution, ResponsibleParty, TargetAudience, Theme,
    },
};

pub fn sample_lookups() -> LookupData {
    LookupData {
        themes: vec![
            Theme {
                id: ThemeId(1),
                name: "Inteligência Artificial".into(),
            },
            Theme {
                id: ThemeId(2),
                name: "Carreira".into(),
            },
        ],
        activity_types: vec![ActivityType {
            id: ActivityTypeId(1),
            name: "Palestra".into(),
        }],
        institutions: vec![Institution {
            id: InstitutionId(1),
            name: "UFPE".into(),
        }],
        target_audiences: vec![TargetAudience {
            id: TargetAudienceId(1),
            description: "Estudantes".into(),
        }],
        responsible_parties: vec![ResponsibleParty {
            id: ResponsiblePartyId(1),
            name: "Ana".into(),
        }],
    }
}

pub fn stored_event(id: i64, title: &str) -> Event {
    Event {
        id: EventId(id),
        fields: EventFields {
            title: title.into(),
            ..EventFields::default()
        },
        activities: Vec::new(),
        unique_activities: Vec::new(),
    }
}

/// In-memory `EventHandle` that records every call and fails the named ones.
#[derive(Default)]
pub struct FakeHandle {
    events: Mutex<Vec<Event>>,
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<&'static str>>,
    delete_outcome: Mutex<DeleteOutcome>,
    next_id: Mutex<i64>,
}

impl FakeHandle {
    pub fn with_events(events: Vec<Event>) -> Arc<Self> {
        let next_id = events.iter().map(|event| event.id.0).max().unwrap_or(0);
        Arc::new(Self {
            events: Mutex::new(events),
            next_id: Mutex::new(next_id),
            ..Self::default()
        })
    }

    pub fn fail(&self, operation: &'static str) {
        self.failing.lock().expect("lock").insert(operation);
    }

    pub fn heal(&self, operation: &'static str) {
        self.failing.lock().expect("lock").remove(operation);
    }

    pub fn set_delete_outcome(&self, outcome: DeleteOutcome) {
        *self.delete_outcome.lock().expect("lock") = outcome;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock").clone()
    }

    pub fn stored(&self) -> Vec<Event> {
        self.events.lock().expect("lock").clone()
    }

    fn record(&self, call: String, operation: &'static str) -> ClientResult<()> {
        self.calls.lock().expect("lock").push(call);
        if self.failing.lock().expect("lock").contains(operation) {
            return Err(ClientError::Transport {
                message: format!("{operation} failed with status 503"),
                status: Some(503),
            });
        }
        Ok(())
    }

    fn materialize(&self, id: EventId, draft: &EventDraft) -> Event {
        let mut next_child = id.0 * 100;
        let activities = draft
            .kind
            .activities()
            .iter()
            .cloned()
            .map(|mut activity| {
                next_child += 1;
                activity.id.get_or_insert(ActivityId(next_child));
                activity.event_id = Some(id);
                activity
            })
            .collect();
        let unique_activities = draft
            .kind
            .unique_activities()
            .iter()
            .cloned()
            .map(|mut unique| {
                unique.id.get_or_insert(UniqueActivityId(id.0));
                unique.event_id = Some(id);
                unique
            })
            .collect();
        Event {
            id,
            fields: draft.fields.clone(),
            activities,
            unique_activities,
        }
    }
}

#[async_trait]
impl EventHandle for FakeHandle {
    async fn list_events(&self) -> ClientResult<Vec<Event>> {
        self.record("list".into(), "list")?;
        Ok(self.stored())
    }

    async fn get_event(&self, event_id: EventId) -> ClientResult<Event> {
        self.record(format!("get {event_id}"), "get")?;
        self.stored()
            .into_iter()
            .find(|event| event.id == event_id)
            .ok_or_else(|| ClientError::Transport {
                message: format!("event {event_id} not found"),
                status: Some(404),
            })
    }

    async fn create_event(&self, draft: &EventDraft) -> ClientResult<Event> {
        self.calls.lock().expect("lock").push("create".into());
        let id = {
            let mut next_id = self.next_id.lock().expect("lock");
            *next_id += 1;
            EventId(*next_id)
        };
        if self.failing.lock().expect("lock").contains("create") {
            // the bare event row survives, its children do not
            let bare = EventDraft {
                fields: draft.fields.clone(),
                kind: EventKind::UniqueActivity(None),
            };
            self.events.lock().expect("lock").push(self.materialize(id, &bare));
            return Err(ClientError::Aggregate {
                context: format!("event {id} was created but some of its activities were not"),
                failures: vec![OperationFailure {
                    operation: "create activity".into(),
                    message: "POST atividades failed with status 500".into(),
                }],
                saved_event: Some(id),
            });
        }
        let event = self.materialize(id, draft);
        self.events.lock().expect("lock").push(event.clone());
        Ok(event)
    }

    async fn update_event(&self, event_id: EventId, draft: &EventDraft) -> ClientResult<Event> {
        self.record(format!("update {event_id}"), "update")?;
        let event = self.materialize(event_id, draft);
        let mut events = self.events.lock().expect("lock");
        match events.iter_mut().find(|stored| stored.id == event_id) {
            Some(stored) => *stored = event.clone(),
            None => events.push(event.clone()),
        }
        Ok(event)
    }

    async fn delete_event(&self, event_id: EventId) -> ClientResult<DeleteOutcome> {
        self.record(format!("delete {event_id}"), "delete")?;
        self.events
            .lock()
            .expect("lock")
            .retain(|event| event.id != event_id);
        Ok(self.delete_outcome.lock().expect("lock").clone())
    }

    async fn load_lookups(&self) -> ClientResult<LookupData> {
        self.record("lookups".into(), "lookups")?;
        Ok(sample_lookups())
    }
}
