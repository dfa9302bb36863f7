use archgraph_core::{ArchEntity, ElementKind, QualifiedId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One architecture element in the graph.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub id: QualifiedId,
    pub kind: ElementKind,
    pub name: String,
    pub parent: Option<QualifiedId>,
    /// The hierarchy element this node was built from.
    pub entity: Arc<dyn ArchEntity>,
}

impl GraphNode {
    pub fn new(id: QualifiedId, entity: Arc<dyn ArchEntity>) -> Self {
        Self {
            kind: entity.kind(),
            name: entity.entity_name().to_string(),
            parent: id.parent(),
            id,
            entity,
        }
    }

    pub fn short_id(&self) -> &str {
        self.id.short_id()
    }

    pub fn is_component(&self) -> bool {
        self.kind == ElementKind::Component
    }

    pub fn summary(&self) -> NodeSummary {
        NodeSummary {
            id: self.id.clone(),
            kind: self.kind,
            name: self.name.clone(),
            parent: self.parent.clone(),
            description: self.entity.description().map(str::to_string),
        }
    }
}

/// Serializable view of a node for external responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub id: QualifiedId,
    pub kind: ElementKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<QualifiedId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use archgraph_core::Component;

    #[test]
    fn summary_serializes_entity_description() {
        let id = QualifiedId::component("shop", "api", "orders");
        let node = GraphNode::new(
            id.clone(),
            Arc::new(Component::new("Orders").with_description("takes orders")),
        );
        assert_eq!(node.parent, Some(QualifiedId::container("shop", "api")));
        assert!(node.is_component());

        let json = serde_json::to_value(node.summary()).unwrap();
        assert_eq!(json["id"], "shop/api/orders");
        assert_eq!(json["kind"], "component");
        assert_eq!(json["description"], "takes orders");
    }
}
