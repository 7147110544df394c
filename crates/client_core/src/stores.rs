use async_trait::async_trait;
use shared::{
    domain::EventId,
    protocol::{
        ActivityType, Event, EventFields, Institution, ResponsibleParty, TargetAudience, Theme,
    },
};

use crate::{error::ClientResult, reconciler::ChildRecord, transport::RestClient};

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn list(&self) -> ClientResult<Vec<Event>>;
    async fn get(&self, event_id: EventId) -> ClientResult<Event>;
    /// Persists the bare fields only; the response carries no children.
    async fn create(&self, fields: &EventFields) -> ClientResult<Event>;
    async fn update(&self, event_id: EventId, fields: &EventFields) -> ClientResult<Event>;
    async fn delete(&self, event_id: EventId) -> ClientResult<()>;
}

/// Event-scoped store for one child collection.
#[async_trait]
pub trait ChildStore<R: ChildRecord>: Send + Sync {
    async fn list_for_event(&self, event_id: EventId) -> ClientResult<Vec<R>>;
    async fn create(&self, event_id: EventId, payload: &R::Payload) -> ClientResult<R>;
    async fn update(&self, id: R::Id, payload: &R::Payload) -> ClientResult<R>;
    async fn delete(&self, id: R::Id) -> ClientResult<()>;
}

#[async_trait]
pub trait LookupStore: Send + Sync {
    async fn themes(&self) -> ClientResult<Vec<Theme>>;
    async fn activity_types(&self) -> ClientResult<Vec<ActivityType>>;
    async fn institutions(&self) -> ClientResult<Vec<Institution>>;
    async fn target_audiences(&self) -> ClientResult<Vec<TargetAudience>>;
    async fn responsible_parties(&self) -> ClientResult<Vec<ResponsibleParty>>;
}

#[async_trait]
impl EventStore for RestClient {
    async fn list(&self) -> ClientResult<Vec<Event>> {
        self.get_json("eventos").await
    }

    async fn get(&self, event_id: EventId) -> ClientResult<Event> {
        self.get_json(&format!("eventos/{event_id}")).await
    }

    async fn create(&self, fields: &EventFields) -> ClientResult<Event> {
        self.post_json("eventos", fields).await
    }

    async fn update(&self, event_id: EventId, fields: &EventFields) -> ClientResult<Event> {
        self.put_json(&format!("eventos/{event_id}"), fields).await
    }

    async fn delete(&self, event_id: EventId) -> ClientResult<()> {
        RestClient::delete(self, &format!("eventos/{event_id}")).await
    }
}

#[async_trait]
impl<R: ChildRecord> ChildStore<R> for RestClient {
    async fn list_for_event(&self, event_id: EventId) -> ClientResult<Vec<R>> {
        self.get_json(&format!("eventos/{event_id}/{}", R::COLLECTION))
            .await
    }

    async fn create(&self, event_id: EventId, payload: &R::Payload) -> ClientResult<R> {
        self.post_json(&format!("eventos/{event_id}/{}", R::COLLECTION), payload)
            .await
    }

    async fn update(&self, id: R::Id, payload: &R::Payload) -> ClientResult<R> {
        self.put_json(&format!("{}/{id}", R::COLLECTION), payload)
            .await
    }

    async fn delete(&self, id: R::Id) -> ClientResult<()> {
        RestClient::delete(self, &format!("{}/{id}", R::COLLECTION)).await
    }
}

#[async_trait]
impl LookupStore for RestClient {
    async fn themes(&self) -> ClientResult<Vec<Theme>> {
        self.get_json("temas").await
    }

    async fn activity_types(&self) -> ClientResult<Vec<ActivityType>> {
        self.get_json("tipos").await
    }

    async fn institutions(&self) -> ClientResult<Vec<Institution>> {
        self.get_json("instituicoes").await
    }

    async fn target_audiences(&self) -> ClientResult<Vec<TargetAudience>> {
        self.get_json("publicos-alvo").await
    }

    async fn responsible_parties(&self) -> ClientResult<Vec<ResponsibleParty>> {
        self.get_json("responsaveis").await
    }
}
