//! GridLab Core: domain models, error types and the store interfaces
//! shared by every other crate.

pub mod error;
pub mod models;
pub mod repository;
