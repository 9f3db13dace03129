use crate::{ChangeEvent, FieldPath, FormValues};

/// The host container that owns form values and per-field errors.
///
/// Engine components never mutate caller state behind its back: they read
/// through this trait and hand back [`ChangeEvent`]s to [`apply`](Self::apply).
pub trait FormStore {
    /// Current value tree.
    fn values(&self) -> &FormValues;

    /// Mutable access for structural edits (dynamic-array add/remove).
    fn values_mut(&mut self) -> &mut FormValues;

    /// Current error message for a field, if any.
    fn error(&self, _name: &FieldPath) -> Option<&str> {
        None
    }

    /// Store a change. Implementations clear the field's previous error
    /// before storing the new value.
    fn apply(&mut self, event: ChangeEvent);
}

/// A bare value tree is the simplest store: it keeps no errors.
impl FormStore for FormValues {
    fn values(&self) -> &FormValues {
        self
    }

    fn values_mut(&mut self) -> &mut FormValues {
        self
    }

    fn apply(&mut self, event: ChangeEvent) {
        self.set(event.name, event.value);
    }
}

/// Receives user-facing warnings (e.g. a refused dynamic-array add).
///
/// Fire-and-forget: nothing is returned to the engine.
pub trait Notifier {
    fn warn(&self, message: &str);
}

/// Routes notifications to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn warn(&self, message: &str) {
        tracing::warn!(target: "formwork::notify", "{message}");
    }
}

impl<F: Fn(&str)> Notifier for F {
    fn warn(&self, message: &str) {
        self(message)
    }
}

/// Turns a server-relative file path into a URL that can be displayed.
pub trait UrlResolver {
    fn resolve(&self, path: &str) -> String;
}

/// Joins paths onto a base URL; absolute URLs pass through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseUrlResolver {
    base: String,
}

impl BaseUrlResolver {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

impl UrlResolver for BaseUrlResolver {
    fn resolve(&self, path: &str) -> String {
        if path.contains("://") || path.starts_with("data:") || self.base.is_empty() {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_resolver_joins() {
        let resolver = BaseUrlResolver::new("https://cdn.example.com/");
        assert_eq!(
            resolver.resolve("/uploads/a.png"),
            "https://cdn.example.com/uploads/a.png"
        );
        assert_eq!(
            resolver.resolve("https://other.org/b.png"),
            "https://other.org/b.png"
        );
        assert_eq!(BaseUrlResolver::default().resolve("/a.png"), "/a.png");
    }

    #[test]
    fn value_tree_store_applies_events() {
        let mut values = FormValues::new();
        values.apply(ChangeEvent::new("title", "Hi"));
        assert_eq!(values.string(&"title".into()), "Hi");
        assert!(FormStore::error(&values, &"title".into()).is_none());
    }

    #[test]
    fn closures_are_notifiers() {
        let seen = std::cell::RefCell::new(Vec::new());
        let notifier = |m: &str| seen.borrow_mut().push(m.to_string());
        notifier.warn("hello");
        assert_eq!(seen.into_inner(), vec!["hello".to_string()]);
    }
}
