//! Architecture graph: model, construction from a hierarchy, and dependency analysis.

pub mod analyzer;
pub mod builder;
pub mod edge;
pub mod graph;
pub mod node;

pub use analyzer::{analyze_dependencies, DependencyAnalyzer, DependencyReport};
pub use builder::{
    build_graph, BuildReport, BuiltGraph, DiagramFailure, GraphBuilder, SkipReason,
    SkippedRelationship,
};
pub use edge::GraphEdge;
pub use graph::{ArchGraph, GraphViolation};
pub use node::{GraphNode, NodeSummary};
