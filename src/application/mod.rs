//! Application layer - Use cases and business logic
//! 
//! This layer contains:
//! - Services: Admin commands against the plugin manager
//! - Errors: Domain-specific errors
//! - Messaging: Event handler bookkeeping

pub mod errors;
pub mod services;
pub mod messaging;
