//! Domain traits - Abstractions for infrastructure implementations

pub mod bot;
pub mod events;

pub use bot::{Bot, BotInfo};
pub use events::EventBinder;
