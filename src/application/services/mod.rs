//! Application services - Business logic orchestration

pub mod admin_service;

pub use admin_service::{AdminCommand, AdminService};
