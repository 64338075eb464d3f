//! Data Transfer Objects
//!
//! Wire shapes exchanged with the backend that are not domain entities
//! themselves, such as push stream messages.

pub mod stream;
