//! MongoDB connection management for the products service
//!
//! # Features
//!
//! - `config` - load [`mongodb::MongoConfig`] through `core_config::FromEnv`
//!
//! # Example
//!
//! ```ignore
//! use database::mongodb::{MongoConfig, connect_from_config_with_retry};
//!
//! let config = MongoConfig::with_database("mongodb://localhost:27017", "shop");
//! let client = connect_from_config_with_retry(&config, None).await?;
//! let db = client.database(config.database());
//! ```

pub mod common;
pub mod mongodb;

pub use common::{RetryConfig, retry, retry_with_backoff};
