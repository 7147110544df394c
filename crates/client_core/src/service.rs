use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use shared::{
    domain::EventId,
    protocol::{Activity, Event, UniqueActivity},
};
use tracing::{error, info, warn};

use crate::{
    error::{ClientError, ClientResult, OperationFailure},
    lookup::{load_lookup_data, LookupData},
    reconciler::{reconcile, ChildRecord, ReconcileOutcome},
    stores::{ChildStore, EventStore, LookupStore},
    transport::RestClient,
    types::EventDraft,
};

/// What was left behind by a best-effort event delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub activities_deleted: usize,
    pub unique_activities_deleted: usize,
    pub child_failures: Vec<OperationFailure>,
}

impl DeleteOutcome {
    /// True when some child rows may still reference the deleted event.
    pub fn may_have_orphans(&self) -> bool {
        !self.child_failures.is_empty()
    }
}

/// Operations the presentation layer drives.
#[async_trait]
pub trait EventHandle: Send + Sync {
    async fn list_events(&self) -> ClientResult<Vec<Event>>;
    async fn get_event(&self, event_id: EventId) -> ClientResult<Event>;
    async fn create_event(&self, draft: &EventDraft) -> ClientResult<Event>;
    async fn update_event(&self, event_id: EventId, draft: &EventDraft) -> ClientResult<Event>;
    async fn delete_event(&self, event_id: EventId) -> ClientResult<DeleteOutcome>;
    async fn load_lookups(&self) -> ClientResult<LookupData>;
}

/// Keeps an event and its child collections in step across the REST calls
/// that persist them. Nothing here is transactional.
#[derive(Clone)]
pub struct EventService {
    events: Arc<dyn EventStore>,
    activities: Arc<dyn ChildStore<Activity>>,
    unique_activities: Arc<dyn ChildStore<UniqueActivity>>,
    lookups: Arc<dyn LookupStore>,
}

impl EventService {
    pub fn new(
        events: Arc<dyn EventStore>,
        activities: Arc<dyn ChildStore<Activity>>,
        unique_activities: Arc<dyn ChildStore<UniqueActivity>>,
        lookups: Arc<dyn LookupStore>,
    ) -> Self {
        Self {
            events,
            activities,
            unique_activities,
            lookups,
        }
    }

    pub fn over_rest(client: RestClient) -> Self {
        let client = Arc::new(client);
        Self::new(
            Arc::clone(&client) as Arc<dyn EventStore>,
            Arc::clone(&client) as Arc<dyn ChildStore<Activity>>,
            Arc::clone(&client) as Arc<dyn ChildStore<UniqueActivity>>,
            client,
        )
    }

    pub async fn list(&self) -> ClientResult<Vec<Event>> {
        self.events.list().await
    }

    pub async fn get(&self, event_id: EventId) -> ClientResult<Event> {
        self.events.get(event_id).await
    }

    pub async fn lookups(&self) -> ClientResult<LookupData> {
        load_lookup_data(self.lookups.as_ref()).await
    }

    /// Persists the bare event first, then creates every child against an
    /// empty existing set. The returned event is assembled from the
    /// creation responses.
    pub async fn create(&self, draft: &EventDraft) -> ClientResult<Event> {
        validate_draft(draft)?;

        let mut event = self.events.create(&draft.fields).await?;
        info!(event_id = %event.id, mode = ?draft.kind.mode(), "event created");

        let (activities, unique_activities) = futures::join!(
            reconcile(
                Arc::clone(&self.activities),
                event.id,
                draft.kind.activities(),
                &[],
            ),
            reconcile(
                Arc::clone(&self.unique_activities),
                event.id,
                draft.kind.unique_activities(),
                &[],
            ),
        );
        let (activities, unique_activities) = merge_reconciled(
            event.id,
            format!("event {} was created but some of its activities were not", event.id),
            activities,
            unique_activities,
        )?;

        event.activities = activities.into_records();
        event.unique_activities = unique_activities.into_records();
        Ok(event)
    }

    /// Overwrites the bare fields, then reconciles both child collections
    /// against what the store currently holds and re-reads the event.
    pub async fn update(&self, event_id: EventId, draft: &EventDraft) -> ClientResult<Event> {
        validate_draft(draft)?;

        self.events.update(event_id, &draft.fields).await?;

        let (existing_activities, existing_unique) = futures::join!(
            self.activities.list_for_event(event_id),
            self.unique_activities.list_for_event(event_id),
        );
        let (existing_activities, existing_unique) =
            match (existing_activities, existing_unique) {
                (Ok(activities), Ok(unique)) => (activities, unique),
                (activities, unique) => {
                    let mut failures = Vec::new();
                    if let Err(err) = &activities {
                        failures.push(OperationFailure::new("list activities", err));
                    }
                    if let Err(err) = &unique {
                        failures.push(OperationFailure::new("list unique activities", err));
                    }
                    error!(%event_id, ?failures, "could not load existing child records");
                    return Err(ClientError::Aggregate {
                        context: format!(
                            "event {event_id} was saved but its activities could not be loaded"
                        ),
                        failures,
                        saved_event: Some(event_id),
                    });
                }
            };

        let (activities, unique_activities) = futures::join!(
            reconcile(
                Arc::clone(&self.activities),
                event_id,
                draft.kind.activities(),
                &existing_activities,
            ),
            reconcile(
                Arc::clone(&self.unique_activities),
                event_id,
                draft.kind.unique_activities(),
                &existing_unique,
            ),
        );
        merge_reconciled(
            event_id,
            format!("event {event_id} was saved but some of its activities were not"),
            activities,
            unique_activities,
        )?;

        self.events.get(event_id).await
    }

    /// Deletes every activity, then every unique activity, then the event.
    /// Child failures are logged and counted but never stop the sequence.
    pub async fn delete(&self, event_id: EventId) -> ClientResult<DeleteOutcome> {
        let mut outcome = DeleteOutcome::default();

        let (deleted, failures) = delete_children(self.activities.as_ref(), event_id).await;
        outcome.activities_deleted = deleted;
        outcome.child_failures.extend(failures);

        let (deleted, failures) =
            delete_children(self.unique_activities.as_ref(), event_id).await;
        outcome.unique_activities_deleted = deleted;
        outcome.child_failures.extend(failures);

        self.events.delete(event_id).await?;
        info!(
            %event_id,
            activities = outcome.activities_deleted,
            unique_activities = outcome.unique_activities_deleted,
            child_failures = outcome.child_failures.len(),
            "event deleted"
        );
        Ok(outcome)
    }
}

#[async_trait]
impl EventHandle for EventService {
    async fn list_events(&self) -> ClientResult<Vec<Event>> {
        self.list().await
    }

    async fn get_event(&self, event_id: EventId) -> ClientResult<Event> {
        self.get(event_id).await
    }

    async fn create_event(&self, draft: &EventDraft) -> ClientResult<Event> {
        self.create(draft).await
    }

    async fn update_event(&self, event_id: EventId, draft: &EventDraft) -> ClientResult<Event> {
        self.update(event_id, draft).await
    }

    async fn delete_event(&self, event_id: EventId) -> ClientResult<DeleteOutcome> {
        self.delete(event_id).await
    }

    async fn load_lookups(&self) -> ClientResult<LookupData> {
        self.lookups().await
    }
}

pub fn validate_draft(draft: &EventDraft) -> ClientResult<()> {
    if draft.fields.title.trim().is_empty() {
        return Err(ClientError::Validation("event title is required".into()));
    }
    Ok(())
}

async fn delete_children<R: ChildRecord>(
    store: &dyn ChildStore<R>,
    event_id: EventId,
) -> (usize, Vec<OperationFailure>) {
    let children = match store.list_for_event(event_id).await {
        Ok(children) => children,
        Err(err) => {
            warn!(%event_id, kind = R::LABEL, error = %err, "could not list child records for delete");
            return (0, vec![OperationFailure::new(format!("list {}", R::LABEL), &err)]);
        }
    };

    let deletes = children
        .iter()
        .filter_map(|child| child.id())
        .map(|id| async move { (id, store.delete(id).await) });

    let mut deleted = 0;
    let mut failures = Vec::new();
    for (id, result) in join_all(deletes).await {
        match result {
            Ok(()) => deleted += 1,
            Err(err) => {
                warn!(%event_id, kind = R::LABEL, %id, error = %err, "child delete failed");
                failures.push(OperationFailure::new(format!("delete {} {id}", R::LABEL), &err));
            }
        }
    }
    (deleted, failures)
}

fn merge_reconciled<A: ChildRecord, B: ChildRecord>(
    event_id: EventId,
    context: String,
    first: ClientResult<ReconcileOutcome<A>>,
    second: ClientResult<ReconcileOutcome<B>>,
) -> ClientResult<(ReconcileOutcome<A>, ReconcileOutcome<B>)> {
    match (first, second) {
        (Ok(first), Ok(second)) => Ok((first, second)),
        (first, second) => {
            let failures = [first.err(), second.err()]
                .into_iter()
                .flatten()
                .flat_map(|err| match err {
                    ClientError::Aggregate { failures, .. } => failures,
                    other => vec![OperationFailure::new("save child records", &other)],
                })
                .collect();
            Err(ClientError::Aggregate {
                context,
                failures,
                saved_event: Some(event_id),
            })
        }
    }
}

#[cfg(test)]
#[path = "tests/service_tests.rs"]
mod tests;
