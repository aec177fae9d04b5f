pub mod config;
pub mod database;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod marketplace;
#[cfg(feature = "kafka")]
pub mod message_broker;
pub mod notification;
pub mod query;
pub mod scheduler;
pub mod store;
