//! Domain models for GridLab.
//!
//! Scenarios own configurations, dashboards, files and results;
//! configurations own signals and dashboards own widgets. Infrastructure
//! components live outside that tree and are referenced by configurations.

pub mod component;
pub mod configuration;
pub mod dashboard;
pub mod file;
pub mod resource;
pub mod result;
pub mod scenario;
pub mod signal;
pub mod user;
pub mod widget;
