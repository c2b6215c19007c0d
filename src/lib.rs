//! sqs-datasource - Lets an ORM use an Amazon SQS queue as if it were a table.
//!
//! Creating a record sends a message, reading receives messages (or reports
//! queue depth for counts), and deleting a record deletes a delivery by its
//! receipt handle.
//!
//! # Architecture
//!
//! The crate uses:
//! - `aws-sdk-sqs` for the four queue calls (send, receive, delete, depth)
//! - a `QueueClient` trait so the adapter can run against a mock provider
//! - `tracing` for structured logging
//! - Tokio for the async runtime the SDK needs
//!
//! # Example
//!
//! ```no_run
//! use sqs_datasource::{DataSource, Model, QueueTableAdapter, Record, Schema, SourceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     sqs_datasource::setup_logging();
//!
//!     let config = SourceConfig::new(
//!         "us-east-1",
//!         "https://sqs.us-east-1.amazonaws.com/123456789012/jobs",
//!     );
//!     let adapter = QueueTableAdapter::new(config).await?;
//!     let model = Model::new("Job", Schema::message());
//!
//!     adapter
//!         .create(&model, &Record::new().with("task", "resize"))
//!         .await?;
//!
//!     let depth = adapter.read(&model, adapter.calculate(&model, "count", &Default::default())).await?;
//!     println!("{}", depth.to_json());
//!
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod datasource;
pub mod errors;
pub mod queue;

pub use crate::core::config::{ColumnFormat, SourceConfig};
pub use crate::core::models::{
    AliasedRow, Conditions, Fields, FieldSpec, Model, PseudoRow, Query, QueryOptions, ReadResult,
    Record, Schema,
};
pub use datasource::{DataSource, QueueTableAdapter};
pub use errors::DatasourceError;
pub use queue::{DeleteOutcome, QueueClient, QueueMessage, SqsQueue};

/// Configure structured logging with JSON format.
///
/// Installs a tracing-subscriber JSON formatter (with targets) suitable for
/// `CloudWatch` Logs. Call it once at process start; later calls are ignored.
///
/// # Example
///
/// ```
/// sqs_datasource::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}
