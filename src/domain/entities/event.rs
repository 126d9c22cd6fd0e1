/// Kind of incoming message a plugin handler can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Text,
    At,
    Voice,
    Image,
    Video,
    File,
    Quote,
    Pat,
    Emoji,
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Text => "text",
            EventKind::At => "at",
            EventKind::Voice => "voice",
            EventKind::Image => "image",
            EventKind::Video => "video",
            EventKind::File => "file",
            EventKind::Quote => "quote",
            EventKind::Pat => "pat",
            EventKind::Emoji => "emoji",
        }
    }
}

/// A handler declared by a plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub kind: EventKind,
    pub handler: String,
    /// Higher runs first
    pub priority: u8,
}

impl Subscription {
    pub const DEFAULT_PRIORITY: u8 = 50;

    pub fn new(kind: EventKind, handler: impl Into<String>) -> Self {
        Self {
            kind,
            handler: handler.into(),
            priority: Self::DEFAULT_PRIORITY,
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }
}
