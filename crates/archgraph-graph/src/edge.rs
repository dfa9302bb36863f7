use archgraph_core::{EdgeKind, QualifiedId, RelationOrigin};
use serde::{Deserialize, Serialize};

/// A directed relationship between two nodes.
///
/// Identity is `(source, target, kind)`; description and origin are payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: QualifiedId,
    pub target: QualifiedId,
    pub kind: EdgeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub origin: RelationOrigin,
}

impl GraphEdge {
    pub fn new(source: QualifiedId, target: QualifiedId, kind: EdgeKind) -> Self {
        Self {
            source,
            target,
            kind,
            description: None,
            origin: RelationOrigin::Structural,
        }
    }

    pub fn with_description<S: Into<String>>(mut self, description: Option<S>) -> Self {
        self.description = description.map(Into::into).filter(|d: &String| !d.is_empty());
        self
    }

    pub fn with_origin(mut self, origin: RelationOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn same_relation(&self, target: &QualifiedId, kind: EdgeKind) -> bool {
        self.target == *target && self.kind == kind
    }

    pub fn is_dependency(&self) -> bool {
        self.kind == EdgeKind::DependsOn
    }
}
