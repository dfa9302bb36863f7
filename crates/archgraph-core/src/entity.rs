use crate::{Component, Container, ElementKind, System};
use std::fmt::Debug;

/// Minimal capability every hierarchy level exposes to the graph.
///
/// Graph nodes hold an `Arc<dyn ArchEntity>` back to the element they were
/// built from, so callers never need to downcast to read identity.
pub trait ArchEntity: Debug + Send + Sync {
    /// Normalized short ID of the element (not qualified).
    fn entity_id(&self) -> &str;
    fn entity_name(&self) -> &str;
    fn kind(&self) -> ElementKind;
    fn description(&self) -> Option<&str> {
        None
    }
}

impl ArchEntity for System {
    fn entity_id(&self) -> &str {
        &self.id
    }

    fn entity_name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ElementKind {
        ElementKind::System
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl ArchEntity for Container {
    fn entity_id(&self) -> &str {
        &self.id
    }

    fn entity_name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Container
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl ArchEntity for Component {
    fn entity_id(&self) -> &str {
        &self.id
    }

    fn entity_name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Component
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}
