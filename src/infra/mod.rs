//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod fixtures;
pub mod http_json;
pub mod remote;
pub mod storage;
pub mod telemetry;
