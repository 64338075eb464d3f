//! Core domain types
//!
//! Records as the backend reports them, and the per-step state derived from them.

pub mod job;
pub mod run;
pub mod step;
