//! Message handling - Binding plugin handlers to incoming events

pub mod events;

pub use events::EventRegistry;
