//! Application services layer.

pub mod aggregation;
pub mod auth;
pub mod clock;
pub mod error;
pub mod interactions;
pub mod local;
pub mod repos;
