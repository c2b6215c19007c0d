//! Table-shaped view of a message queue.
//!
//! [`QueueTableAdapter`] answers the ORM's datasource calls with queue
//! operations:
//!
//! | ORM call    | Queue operation            |
//! |-------------|----------------------------|
//! | `create`    | send one message           |
//! | `update`    | send one message (same as `create`) |
//! | `read`      | receive messages, or measure depth |
//! | `delete`    | delete one delivery by receipt handle |
//!
//! Every call makes at most one provider request. Nothing is cached or retried.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::core::config::{ColumnFormat, SourceConfig};
use crate::core::models::{
    AliasedRow, Conditions, Model, PseudoRow, Query, ReadResult, Record, Schema,
};
use crate::errors::DatasourceError;
use crate::queue::{DeleteOutcome, QueueClient, SqsQueue};

pub const DESCRIPTION: &str = "Amazon Simple Queue Service (SQS)";

/// The contract an ORM datasource exposes to its models.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn description(&self) -> &str;

    /// Names of the tables this source can enumerate, if any.
    fn list_sources(&self) -> Option<Vec<String>>;

    fn describe<'a>(&self, model: &'a Model) -> &'a Schema;

    /// Decide how `func` (e.g. `count`) is answered; the result is handed to [`DataSource::read`].
    fn calculate(&self, model: &Model, func: &str, params: &BTreeMap<String, Value>) -> Query;

    async fn create(&self, model: &Model, record: &Record) -> Result<bool, DatasourceError>;

    async fn update(
        &self,
        model: &Model,
        record: &Record,
        conditions: &Conditions,
    ) -> Result<bool, DatasourceError>;

    async fn read(&self, model: &Model, query: Query) -> Result<ReadResult, DatasourceError>;

    async fn delete(&self, model: &Model, conditions: &Conditions) -> Result<bool, DatasourceError>;
}

pub struct QueueTableAdapter<Q: QueueClient = SqsQueue> {
    config: SourceConfig,
    columns: BTreeMap<String, ColumnFormat>,
    queue: Q,
}

impl QueueTableAdapter<SqsQueue> {
    /// Build an adapter with its own SQS client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the client cannot be built.
    pub async fn new(config: SourceConfig) -> Result<Self, DatasourceError> {
        let queue = SqsQueue::connect(&config).await?;
        Ok(Self::with_client(config, queue))
    }
}

impl<Q: QueueClient> QueueTableAdapter<Q> {
    pub fn with_client(config: SourceConfig, queue: Q) -> Self {
        let columns = config.columns();
        Self {
            config,
            columns,
            queue,
        }
    }

    pub fn queue_url(&self) -> &str {
        self.config.queue_url()
    }

    pub fn columns(&self) -> &BTreeMap<String, ColumnFormat> {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnFormat> {
        self.columns.get(name)
    }

    async fn send(&self, record: &Record) -> Result<bool, DatasourceError> {
        // Unreachable while record values are all `serde_json::Value`.
        let payload = match record.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Refusing to send unserializable record: {}", e);
                return Ok(false);
            }
        };

        self.queue.send_message(self.queue_url(), &payload).await?;
        debug!(fields = record.len(), "sent message");
        Ok(true)
    }

    fn delete_token(model: &Model, conditions: &Conditions) -> Option<String> {
        conditions
            .value_for(&model.alias, "receipt_handle")
            .or_else(|| conditions.value_for(&model.alias, "id"))
    }
}

#[async_trait]
impl<Q: QueueClient> DataSource for QueueTableAdapter<Q> {
    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn list_sources(&self) -> Option<Vec<String>> {
        None
    }

    fn describe<'a>(&self, model: &'a Model) -> &'a Schema {
        &model.schema
    }

    fn calculate(&self, _model: &Model, _func: &str, _params: &BTreeMap<String, Value>) -> Query {
        Query::MeasureDepth
    }

    async fn create(&self, model: &Model, record: &Record) -> Result<bool, DatasourceError> {
        debug!(model = %model.alias, "create");
        self.send(record).await
    }

    /// Sends another message. Queued messages cannot be changed in place,
    /// so `conditions` has no effect on what is sent.
    async fn update(
        &self,
        model: &Model,
        record: &Record,
        _conditions: &Conditions,
    ) -> Result<bool, DatasourceError> {
        debug!(model = %model.alias, "update");
        self.send(record).await
    }

    async fn read(&self, model: &Model, query: Query) -> Result<ReadResult, DatasourceError> {
        match query {
            Query::MeasureDepth => {
                let depth = self.queue.queue_depth(self.queue_url()).await?;
                debug!(model = %model.alias, depth, "measured queue depth");
                Ok(ReadResult::Count(depth))
            }
            Query::FetchMessages { limit } => {
                let messages = self.queue.receive_messages(self.queue_url(), limit).await?;
                debug!(model = %model.alias, count = messages.len(), "read messages");

                let rows = messages
                    .into_iter()
                    .map(|m| AliasedRow {
                        alias: model.alias.clone(),
                        row: PseudoRow {
                            body: m.body,
                            message_id: m.message_id,
                            receipt_handle: m.receipt_handle,
                        },
                    })
                    .collect();
                Ok(ReadResult::Rows(rows))
            }
        }
    }

    async fn delete(
        &self,
        model: &Model,
        conditions: &Conditions,
    ) -> Result<bool, DatasourceError> {
        // A bare `id` is passed through as if it were a receipt handle.
        let Some(token) = Self::delete_token(model, conditions) else {
            debug!(model = %model.alias, "delete without receipt_handle or id");
            return Ok(false);
        };

        match self.queue.delete_message(self.queue_url(), &token).await? {
            DeleteOutcome::Deleted => {
                info!(model = %model.alias, "deleted message");
                Ok(true)
            }
            DeleteOutcome::Rejected { body } => {
                error!(target: "sqs", model = %model.alias, "SQS rejected delete: {}", body);
                Ok(false)
            }
        }
    }
}
