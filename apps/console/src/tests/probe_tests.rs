use async_trait::async_trait;
use client_core::ClientError;
use shared::{
    domain::EventId,
    protocol::{
        ActivityType, Event, EventFields, Institution, ResponsibleParty, TargetAudience, Theme,
    },
};

use super::*;
use crate::test_support::{sample_lookups, stored_event};

struct HalfBrokenApi;

#[async_trait]
impl EventStore for HalfBrokenApi {
    async fn list(&self) -> ClientResult<Vec<Event>> {
        Ok(vec![stored_event(1, "A"), stored_event(2, "B")])
    }

    async fn get(&self, _event_id: EventId) -> ClientResult<Event> {
        unreachable!("probes only list")
    }

    async fn create(&self, _fields: &EventFields) -> ClientResult<Event> {
        unreachable!("probes only list")
    }

    async fn update(&self, _event_id: EventId, _fields: &EventFields) -> ClientResult<Event> {
        unreachable!("probes only list")
    }

    async fn delete(&self, _event_id: EventId) -> ClientResult<()> {
        unreachable!("probes only list")
    }
}

#[async_trait]
impl LookupStore for HalfBrokenApi {
    async fn themes(&self) -> ClientResult<Vec<Theme>> {
        Ok(sample_lookups().themes)
    }

    async fn activity_types(&self) -> ClientResult<Vec<ActivityType>> {
        Err(ClientError::Transport {
            message: "GET tipos failed with status 500".into(),
            status: Some(500),
        })
    }

    async fn institutions(&self) -> ClientResult<Vec<Institution>> {
        Ok(Vec::new())
    }

    async fn target_audiences(&self) -> ClientResult<Vec<TargetAudience>> {
        Ok(sample_lookups().target_audiences)
    }

    async fn responsible_parties(&self) -> ClientResult<Vec<ResponsibleParty>> {
        Ok(sample_lookups().responsible_parties)
    }
}

#[tokio::test]
async fn reports_counts_and_failures_per_endpoint() {
    let api = HalfBrokenApi;
    let probes = run_probes(&api, &api).await;

    assert_eq!(probes.len(), 6);
    assert_eq!(probes[0].endpoint, "eventos");
    assert_eq!(probes[0].result, Ok(2));
    assert_eq!(probes[1].result, Ok(2));
    assert_eq!(
        probes[2].result,
        Err("GET tipos failed with status 500".to_string())
    );
    assert_eq!(probes[3].result, Ok(0));
    assert!(!all_ok(&probes));

    let text = render_probes("http://localhost:3000/api/", &probes);
    assert!(text.contains("ok    eventos"));
    assert!(text.contains("falha tipos"));
}
