pub mod event;

pub use event::{EventKind, Subscription};
