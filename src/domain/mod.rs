//! Domain layer - Core abstractions shared by the host and its plugins
//! 
//! This layer contains:
//! - Entities: Event kinds and handler subscriptions
//! - Traits: Abstractions for the host (Bot) and event routing (EventBinder)

pub mod entities;
pub mod traits;
