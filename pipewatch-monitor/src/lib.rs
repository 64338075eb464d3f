//! Pipewatch Monitor
//!
//! Live monitoring of pipeline runs: the run list store, the per-run live
//! channel and the collaborator seams both depend on.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use pipewatch_client::PipelineClient;
//! use pipewatch_monitor::{ChannelEvent, RunListStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = Arc::new(PipelineClient::new("http://localhost:8000"));
//! let mut store = RunListStore::new(client.clone(), client);
//!
//! store.refresh().await?;
//! let run_id = store.resolve_prefix("3f2a")?;
//! store.select(&run_id).await?;
//!
//! while let Some(event) = store.next_event().await {
//!     if let ChannelEvent::Update(view) = event {
//!         println!("{} steps", view.steps.len());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod error;
mod http;
pub mod source;
pub mod store;

#[cfg(test)]
mod fakes;

pub use channel::{ChannelEvent, ChannelState, LiveJobChannel};
pub use error::{MonitorError, Result};
pub use source::{JobStream, RunSource, StreamFault, StreamSource};
pub use store::{RunListStore, Selection};
