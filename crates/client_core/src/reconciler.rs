use std::{collections::HashSet, fmt, hash::Hash, sync::Arc};

use futures::future::{join_all, BoxFuture, FutureExt};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{ActivityId, EventId, UniqueActivityId},
    protocol::{Activity, ActivityPayload, UniqueActivity, UniqueActivityPayload},
};
use tracing::info;

use crate::{
    error::{ClientError, ClientResult, OperationFailure},
    stores::ChildStore,
};

/// A child collection of an event that can be diffed by identifier.
pub trait ChildRecord: Clone + fmt::Debug + Send + Sync + DeserializeOwned + 'static {
    type Id: Copy + Eq + Hash + fmt::Display + fmt::Debug + Send + Sync + 'static;
    /// Bare-foreign-key body sent on create and update.
    type Payload: Serialize + Send + Sync + 'static;

    /// Path segment of the REST collection, e.g. `atividades`.
    const COLLECTION: &'static str;
    const LABEL: &'static str;

    fn id(&self) -> Option<Self::Id>;
    fn to_payload(&self) -> Self::Payload;
}

impl ChildRecord for Activity {
    type Id = ActivityId;
    type Payload = ActivityPayload;

    const COLLECTION: &'static str = "atividades";
    const LABEL: &'static str = "activity";

    fn id(&self) -> Option<ActivityId> {
        self.id
    }

    fn to_payload(&self) -> ActivityPayload {
        ActivityPayload::from(self)
    }
}

impl ChildRecord for UniqueActivity {
    type Id = UniqueActivityId;
    type Payload = UniqueActivityPayload;

    const COLLECTION: &'static str = "atividades-unicas";
    const LABEL: &'static str = "unique activity";

    fn id(&self) -> Option<UniqueActivityId> {
        self.id
    }

    fn to_payload(&self) -> UniqueActivityPayload {
        UniqueActivityPayload::from(self)
    }
}

/// The three disjoint operation sets computed from `desired` vs `existing`.
#[derive(Debug)]
pub struct ReconcilePlan<'a, R: ChildRecord> {
    pub to_create: Vec<&'a R>,
    pub to_update: Vec<(R::Id, &'a R)>,
    pub to_delete: Vec<R::Id>,
}

impl<R: ChildRecord> ReconcilePlan<'_, R> {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }

    pub fn operation_count(&self) -> usize {
        self.to_create.len() + self.to_update.len() + self.to_delete.len()
    }
}

/// Matches purely by identifier. A desired record whose id is missing from
/// `existing` is created anew; identical content still yields an update.
pub fn plan<'a, R: ChildRecord>(desired: &'a [R], existing: &[R]) -> ReconcilePlan<'a, R> {
    let existing_ids: HashSet<R::Id> = existing
        .iter()
        .filter_map(|record| record.id())
        .collect();

    let mut to_create = Vec::new();
    let mut to_update = Vec::new();
    let mut kept = HashSet::new();
    for record in desired {
        match record.id() {
            Some(id) if existing_ids.contains(&id) => {
                kept.insert(id);
                to_update.push((id, record));
            }
            _ => to_create.push(record),
        }
    }

    let mut seen = HashSet::new();
    let to_delete = existing
        .iter()
        .filter_map(|record| record.id())
        .filter(|id| !kept.contains(id) && seen.insert(*id))
        .collect();

    ReconcilePlan {
        to_create,
        to_update,
        to_delete,
    }
}

/// Records produced by a successful reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome<R: ChildRecord> {
    pub created: Vec<R>,
    pub updated: Vec<R>,
    pub deleted: Vec<R::Id>,
}

impl<R: ChildRecord> Default for ReconcileOutcome<R> {
    fn default() -> Self {
        Self {
            created: Vec::new(),
            updated: Vec::new(),
            deleted: Vec::new(),
        }
    }
}

impl<R: ChildRecord> ReconcileOutcome<R> {
    /// Records that remain attached to the event, in creation then update order.
    pub fn into_records(self) -> Vec<R> {
        let mut records = self.created;
        records.extend(self.updated);
        records
    }
}

enum Applied<R: ChildRecord> {
    Created(R),
    Updated(R),
    Deleted(R::Id),
}

/// Issues every planned create, update and delete concurrently and waits for
/// all of them. Any failure turns the whole pass into one
/// [`ClientError::Aggregate`]; operations that succeeded stay applied.
pub async fn reconcile<R: ChildRecord>(
    store: Arc<dyn ChildStore<R>>,
    event_id: EventId,
    desired: &[R],
    existing: &[R],
) -> ClientResult<ReconcileOutcome<R>> {
    let plan = plan(desired, existing);
    info!(
        %event_id,
        kind = R::LABEL,
        create = plan.to_create.len(),
        update = plan.to_update.len(),
        delete = plan.to_delete.len(),
        "reconciling child records"
    );
    if plan.is_empty() {
        return Ok(ReconcileOutcome::default());
    }

    let mut operations: Vec<BoxFuture<'static, (String, ClientResult<Applied<R>>)>> =
        Vec::with_capacity(plan.operation_count());

    for record in plan.to_create {
        let store = Arc::clone(&store);
        let payload = record.to_payload();
        operations.push(
            async move {
                let result = store.create(event_id, &payload).await.map(Applied::Created);
                (format!("create {}", R::LABEL), result)
            }
            .boxed(),
        );
    }
    for (id, record) in plan.to_update {
        let store = Arc::clone(&store);
        let payload = record.to_payload();
        operations.push(
            async move {
                let result = store.update(id, &payload).await.map(Applied::Updated);
                (format!("update {} {id}", R::LABEL), result)
            }
            .boxed(),
        );
    }
    for id in plan.to_delete {
        let store = Arc::clone(&store);
        operations.push(
            async move {
                let result = store.delete(id).await.map(|()| Applied::Deleted(id));
                (format!("delete {} {id}", R::LABEL), result)
            }
            .boxed(),
        );
    }

    let mut outcome = ReconcileOutcome::default();
    let mut failures = Vec::new();
    for (operation, result) in join_all(operations).await {
        match result {
            Ok(Applied::Created(record)) => outcome.created.push(record),
            Ok(Applied::Updated(record)) => outcome.updated.push(record),
            Ok(Applied::Deleted(id)) => outcome.deleted.push(id),
            Err(err) => failures.push(OperationFailure::new(operation, &err)),
        }
    }

    if failures.is_empty() {
        Ok(outcome)
    } else {
        Err(ClientError::Aggregate {
            context: format!("saving {} records for event {event_id}", R::LABEL),
            failures,
            saved_event: None,
        })
    }
}

#[cfg(test)]
#[path = "tests/reconciler_tests.rs"]
mod tests;
