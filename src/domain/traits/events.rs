use crate::plugins::Plugin;

/// Binds a plugin instance's declared handlers into message routing.
///
/// The manager calls `bind_instance` right after construction and
/// `unbind_instance` after the disable hook; it never looks at the handlers itself.
pub trait EventBinder: Send + Sync {
    fn bind_instance(&self, plugin: &str, instance: &dyn Plugin);

    fn unbind_instance(&self, plugin: &str, instance: &dyn Plugin);
}
