//! Data models for the share gateway.
//!
//! Records tracked in the in-memory registry, uploaded payloads, and the JSON
//! bodies returned to clients.

pub mod file_record;
pub mod link;
pub mod upload;
