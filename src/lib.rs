//! # pql-stream
//!
//! Async streaming client for PQL servers that lets you iterate query results
//! of any size without holding the whole response in memory.
//!
//! ## Why?
//!
//! A PQL server answers a query with one JSON array. Decoding that array in
//! one go means buffering the full body:
//!
//! ```ignore
//! // This buffers every record before returning!
//! let results: Vec<Value> = serde_json::from_slice(&body)?;
//! ```
//!
//! `pql-stream` parses the array incrementally and hands out each element as
//! soon as it is complete:
//!
//! ```ignore
//! let mut stream = client.query("people{}").await?;
//! while let Some(record) = stream.next().await {
//!     process(record?);
//! }
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use pql_stream::{Client, Settings};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Settings::new("localhost:8080", "test_1")
//!         .with_coerce_dates(true)
//!         .build()?;
//!     let client = Client::from_config(config);
//!
//!     let mut stream = client.query("people { name ~ 'foo' and age > 30 }").await?;
//!
//!     while let Some(record) = stream.next().await {
//!         let record = record?;
//!         println!(
//!             "{} born {:?}",
//!             record.get("name").and_then(|v| v.as_str()).unwrap_or_default(),
//!             record.get("birthday").and_then(|v| v.as_time())
//!         );
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Memory efficient**: only the element being parsed is buffered
//! - **Async native**: built on tokio and futures; dropping a stream closes
//!   its connection
//! - **Date coercion**: optionally turns ISO-8601 strings into timestamps
//! - **Error handling**: all errors are returned as Results, no panics
//! - **Pluggable transport**: any [`Transport`] can stand in for reqwest

pub mod client;
pub mod coerce;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod parser;
pub mod transport;
pub mod types;
pub mod value;

// Re-export main types at crate root
pub use client::{Client, RecordStream};
pub use config::{ClientConfig, Settings};
pub use endpoint::Endpoint;
pub use error::{Error, Result};
pub use transport::{BodyStream, RawResponse, ReqwestTransport, Transport};
pub use types::{QueryPlan, ServiceSchema};
pub use value::{Timestamp, Value};

// Re-export parser and coercion for advanced use cases
pub use coerce::coerce;
pub use parser::JsonArrayParser;
