//! Client side of the events API: REST stores, the child-record reconciler
//! and the service that keeps an event and its activities consistent.

pub mod error;
pub mod lookup;
pub mod reconciler;
pub mod service;
pub mod stores;
pub mod transport;
pub mod types;

pub use error::{ClientError, ClientResult, OperationFailure};
pub use lookup::{load_lookup_data, LookupData};
pub use reconciler::{plan, reconcile, ChildRecord, ReconcileOutcome, ReconcilePlan};
pub use service::{DeleteOutcome, EventHandle, EventService};
pub use stores::{ChildStore, EventStore, LookupStore};
pub use transport::{RestClient, DEFAULT_API_URL};
pub use types::{EventDraft, EventKind};

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod transport_tests;
