//! Queue provider seam.
//!
//! The datasource only ever needs four calls from the provider. They live
//! behind [`QueueClient`] so the adapter can be driven by a mock in tests and
//! by [`SqsQueue`] in production.

pub mod sqs;

use async_trait::async_trait;

use crate::errors::DatasourceError;

pub use sqs::SqsQueue;

/// A single delivery as returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub body: String,
    pub message_id: String,
    pub receipt_handle: String,
}

/// Result of a delete call the provider actually answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The provider refused the delete; `body` is its raw error response.
    Rejected { body: String },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueueClient: Send + Sync {
    async fn send_message(&self, queue_url: &str, body: &str) -> Result<(), DatasourceError>;

    /// Receive up to `max_messages` deliveries; `None` leaves the cap to the provider.
    async fn receive_messages(
        &self,
        queue_url: &str,
        max_messages: Option<u32>,
    ) -> Result<Vec<QueueMessage>, DatasourceError>;

    async fn delete_message(
        &self,
        queue_url: &str,
        receipt_handle: &str,
    ) -> Result<DeleteOutcome, DatasourceError>;

    /// Approximate number of messages available for delivery.
    async fn queue_depth(&self, queue_url: &str) -> Result<u64, DatasourceError>;
}
