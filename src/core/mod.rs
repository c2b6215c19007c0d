//! Configuration and the table-shaped types passed between the ORM and the queue.

pub mod config;
pub mod models;
