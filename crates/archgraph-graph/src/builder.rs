//! Builds an [`ArchGraph`] from an [`ArchitectureModel`].
//!
//! Construction runs in two passes. The first inserts every system, container
//! and component so that the second pass, which resolves relationship
//! targets, can see the whole model: a component may depend on a component
//! declared later or in another system.
//!
//! Bad relationship data never aborts a build. Unresolvable, ambiguous and
//! self-referencing targets are skipped and reported in [`BuildReport`]; only
//! a duplicate qualified ID is fatal.

use crate::{ArchGraph, GraphNode};
use archgraph_core::{
    diagram_relationships, ArchitectureModel, ArchGraphError, ArrowDiagramParser, BuilderConfig,
    Component, ComponentRef, Container, DescriptionPrecedence, DiagramParser, EdgeKind,
    ElementKind, QualifiedId, RelationOrigin, Result, System,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why a declared relationship did not become an edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    Ambiguous { candidates: Vec<String> },
    NotFound,
    SelfReference,
    NotAComponent { resolved: QualifiedId },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Ambiguous { candidates } => {
                write!(f, "ambiguous target, candidates: {}", candidates.join(", "))
            }
            SkipReason::NotFound => write!(f, "target not found"),
            SkipReason::SelfReference => write!(f, "component references itself"),
            SkipReason::NotAComponent { resolved } => {
                write!(f, "target {} is not a component", resolved)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRelationship {
    pub component: QualifiedId,
    /// The reference as written in the model or diagram.
    pub target: String,
    pub origin: RelationOrigin,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagramFailure {
    pub component: QualifiedId,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub skipped: Vec<SkippedRelationship>,
    pub diagram_failures: Vec<DiagramFailure>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.diagram_failures.is_empty()
    }
}

/// A freshly built graph and what was left out of it.
#[derive(Debug, Clone)]
pub struct BuiltGraph {
    pub graph: ArchGraph,
    pub report: BuildReport,
}

impl BuiltGraph {
    pub fn into_graph(self) -> ArchGraph {
        self.graph
    }
}

/// Descriptions declared for one resolved target.
#[derive(Debug, Default)]
struct Declared {
    structural: Option<String>,
    diagram: Option<String>,
}

impl Declared {
    fn origin(&self) -> RelationOrigin {
        match (&self.structural, &self.diagram) {
            (Some(_), None) => RelationOrigin::Structural,
            (None, Some(_)) => RelationOrigin::Diagram,
            _ => RelationOrigin::Both,
        }
    }

    fn description(&self, precedence: DescriptionPrecedence) -> Option<&str> {
        let structural = self.structural.as_deref().filter(|d| !d.trim().is_empty());
        let diagram = self.diagram.as_deref().filter(|d| !d.trim().is_empty());
        match precedence {
            DescriptionPrecedence::Structural => structural.or(diagram),
            DescriptionPrecedence::Diagram => diagram.or(structural),
        }
    }
}

#[derive(Clone)]
pub struct GraphBuilder {
    parser: Arc<dyn DiagramParser>,
    precedence: DescriptionPrecedence,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self {
            parser: Arc::new(ArrowDiagramParser::new()),
            precedence: DescriptionPrecedence::default(),
        }
    }
}

impl fmt::Debug for GraphBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphBuilder")
            .field("precedence", &self.precedence)
            .finish_non_exhaustive()
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &BuilderConfig) -> Self {
        Self::default().with_precedence(config.precedence)
    }

    pub fn with_parser<P: DiagramParser + 'static>(mut self, parser: P) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    pub fn with_precedence(mut self, precedence: DescriptionPrecedence) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn build(&self, model: &ArchitectureModel) -> Result<BuiltGraph> {
        let mut graph = ArchGraph::new();
        let mut report = BuildReport::default();

        self.insert_hierarchy(&mut graph, model)?;
        for entry in model.components() {
            self.link_component(&mut graph, &entry, &mut report)?;
        }

        info!(
            model = %model.name,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            skipped = report.skipped.len(),
            diagram_failures = report.diagram_failures.len(),
            "built architecture graph"
        );
        Ok(BuiltGraph { graph, report })
    }

    fn insert_hierarchy(&self, graph: &mut ArchGraph, model: &ArchitectureModel) -> Result<()> {
        for system in &model.systems {
            let system_id = QualifiedId::system(&system.short_id());
            graph.insert_node(GraphNode::new(
                system_id.clone(),
                Arc::new(System {
                    containers: Vec::new(),
                    id: system.short_id(),
                    name: system.name.clone(),
                    description: system.description.clone(),
                }),
            ))?;

            for container in &system.containers {
                let container_id = system_id.child(&container.short_id());
                graph.insert_node(GraphNode::new(
                    container_id.clone(),
                    Arc::new(Container {
                        components: Vec::new(),
                        id: container.short_id(),
                        name: container.name.clone(),
                        description: container.description.clone(),
                        technology: container.technology.clone(),
                    }),
                ))?;

                for component in &container.components {
                    let component_id = container_id.child(&component.short_id());
                    let entity: Component = Component {
                        id: component.short_id(),
                        ..component.clone()
                    };
                    graph.insert_node(GraphNode::new(component_id.clone(), Arc::new(entity)))?;
                    debug!(component = %component_id, "inserted component");
                }
            }
        }
        Ok(())
    }

    fn link_component(
        &self,
        graph: &mut ArchGraph,
        entry: &ComponentRef<'_>,
        report: &mut BuildReport,
    ) -> Result<()> {
        let source = entry.qualified_id();
        let mut declared: BTreeMap<QualifiedId, Declared> = BTreeMap::new();

        for (target, description) in &entry.component.relationships {
            if let Some(resolved) =
                Self::resolve_target(graph, &source, target, RelationOrigin::Structural, report)
            {
                declared
                    .entry(resolved)
                    .or_default()
                    .structural
                    .get_or_insert_with(|| description.clone());
            }
        }

        match diagram_relationships(self.parser.as_ref(), entry) {
            None => {}
            Some(Ok(relations)) => {
                for (target, label) in relations {
                    if let Some(resolved) =
                        Self::resolve_target(graph, &source, &target, RelationOrigin::Diagram, report)
                    {
                        declared
                            .entry(resolved)
                            .or_default()
                            .diagram
                            .get_or_insert(label);
                    }
                }
            }
            Some(Err(err)) => {
                warn!(component = %source, error = %err, "diagram source failed to parse, using structural relationships only");
                report.diagram_failures.push(DiagramFailure {
                    component: source.clone(),
                    message: err.to_string(),
                });
            }
        }

        for (target, decl) in &declared {
            graph.insert_edge_with_origin(
                &source,
                target,
                EdgeKind::DependsOn,
                decl.description(self.precedence),
                decl.origin(),
            )?;
        }
        debug!(component = %source, edges = declared.len(), "linked component");
        Ok(())
    }

    fn resolve_target(
        graph: &ArchGraph,
        source: &QualifiedId,
        target: &str,
        origin: RelationOrigin,
        report: &mut BuildReport,
    ) -> Option<QualifiedId> {
        let reason = match graph.resolve_reference(target, Some(ElementKind::Component)) {
            Ok(resolved) if resolved == *source => SkipReason::SelfReference,
            Ok(resolved) => return Some(resolved),
            Err(ArchGraphError::AmbiguousShortId { candidates, .. }) => {
                SkipReason::Ambiguous { candidates }
            }
            Err(_) => match graph.resolve_reference(target, None) {
                Ok(resolved) => SkipReason::NotAComponent { resolved },
                Err(_) => SkipReason::NotFound,
            },
        };

        warn!(component = %source, reference = target, %origin, %reason, "skipping relationship");
        report.skipped.push(SkippedRelationship {
            component: source.clone(),
            target: target.to_string(),
            origin,
            reason,
        });
        None
    }
}

/// Build a graph with the default parser and precedence, discarding the report.
pub fn build_graph(model: &ArchitectureModel) -> Result<ArchGraph> {
    GraphBuilder::default().build(model).map(BuiltGraph::into_graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use archgraph_core::DiagramRelation;

    fn model() -> ArchitectureModel {
        ArchitectureModel::new("shop")
            .with_system(
                System::new("Backend").with_container(
                    Container::new("API")
                        .with_component(
                            Component::new("Orders")
                                .with_description("takes orders")
                                .with_relationship("payments", "charges card")
                                .with_relationship("auth", "checks session"),
                        )
                        .with_component(Component::new("Payments"))
                        .with_component(Component::new("Auth")),
                ),
            )
            .with_system(
                System::new("Admin")
                    .with_container(Container::new("UI").with_component(Component::new("Auth"))),
            )
    }

    #[test]
    fn inserts_the_whole_hierarchy() {
        let built = GraphBuilder::new().build(&model()).unwrap();
        let g = &built.graph;
        assert_eq!(g.node_count(), 2 + 2 + 4);
        assert_eq!(g.count_of_kind(ElementKind::System), 2);
        assert_eq!(g.count_of_kind(ElementKind::Container), 2);
        assert_eq!(g.count_of_kind(ElementKind::Component), 4);
        assert_eq!(g.get_parent("backend/api/orders").unwrap().id.as_str(), "backend/api");
        assert_eq!(
            g.get_node("backend/api/orders").unwrap().entity.description(),
            Some("takes orders")
        );
    }

    #[test]
    fn ambiguous_targets_are_skipped_not_fatal() {
        let built = GraphBuilder::new().build(&model()).unwrap();
        assert_eq!(built.graph.edge_count(), 1);
        assert_eq!(built.report.skipped.len(), 1);
        let skip = &built.report.skipped[0];
        assert_eq!(skip.target, "auth");
        assert!(matches!(skip.reason, SkipReason::Ambiguous { ref candidates } if candidates.len() == 2));
    }

    #[test]
    fn qualifying_the_target_resolves_ambiguity() {
        let mut m = model();
        let orders = &mut m.systems[0].containers[0].components[0];
        orders.relationships.remove("auth");
        orders
            .relationships
            .insert("api/auth".to_string(), "checks session".to_string());

        let built = GraphBuilder::new().build(&m).unwrap();
        assert!(built.report.is_clean());
        let deps: Vec<&str> = built
            .graph
            .get_dependencies("backend/api/orders")
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(deps, vec!["backend/api/auth", "backend/api/payments"]);
    }

    #[test]
    fn self_and_non_component_targets_are_skipped() {
        let m = ArchitectureModel::new("m").with_system(
            System::new("s").with_container(
                Container::new("c").with_component(
                    Component::new("a")
                        .with_relationship("a", "loops")
                        .with_relationship("s/c", "the container")
                        .with_relationship("ghost", "gone"),
                ),
            ),
        );
        let built = GraphBuilder::new().build(&m).unwrap();
        assert_eq!(built.graph.edge_count(), 0);
        let reasons: Vec<&SkipReason> = built.report.skipped.iter().map(|s| &s.reason).collect();
        assert!(reasons.contains(&&SkipReason::SelfReference));
        assert!(reasons.contains(&&SkipReason::NotFound));
        assert!(reasons
            .iter()
            .any(|r| matches!(r, SkipReason::NotAComponent { resolved } if resolved.as_str() == "s/c")));
    }

    #[test]
    fn duplicate_ids_abort_the_build() {
        let m = ArchitectureModel::new("m").with_system(
            System::new("s").with_container(
                Container::new("c")
                    .with_component(Component::new("Auth Service"))
                    .with_component(Component::new("auth-service")),
            ),
        );
        let err = GraphBuilder::new().build(&m).unwrap_err();
        assert!(matches!(err, ArchGraphError::DuplicateIdentifier(ref id) if id == "s/c/auth-service"));
    }

    fn merged_model() -> ArchitectureModel {
        ArchitectureModel::new("m").with_system(
            System::new("s").with_container(
                Container::new("c")
                    .with_component(
                        Component::new("a")
                            .with_relationship("b", "structural text")
                            .with_diagram("a -> b: diagram text\na -> d: only in diagram"),
                    )
                    .with_component(Component::new("b"))
                    .with_component(Component::new("d")),
            ),
        )
    }

    #[test]
    fn merges_diagram_relationships_with_structural_precedence() {
        let built = GraphBuilder::new().build(&merged_model()).unwrap();
        let g = &built.graph;
        assert_eq!(g.edge_count(), 2);

        let edges = g.outgoing_edges("s/c/a");
        let to_b = edges.iter().find(|e| e.target.as_str() == "s/c/b").unwrap();
        assert_eq!(to_b.origin, RelationOrigin::Both);
        assert_eq!(to_b.description.as_deref(), Some("structural text"));

        let to_d = edges.iter().find(|e| e.target.as_str() == "s/c/d").unwrap();
        assert_eq!(to_d.origin, RelationOrigin::Diagram);
        assert_eq!(to_d.description.as_deref(), Some("only in diagram"));
    }

    #[test]
    fn diagram_precedence_takes_diagram_descriptions() {
        let built = GraphBuilder::new()
            .with_precedence(DescriptionPrecedence::Diagram)
            .build(&merged_model())
            .unwrap();
        let edges = built.graph.outgoing_edges("s/c/a");
        let to_b = edges.iter().find(|e| e.target.as_str() == "s/c/b").unwrap();
        assert_eq!(to_b.description.as_deref(), Some("diagram text"));
    }

    #[test]
    fn diagram_parse_failure_keeps_structural_edges() {
        let mut m = merged_model();
        m.systems[0].containers[0].components[0].diagram = Some("a -> {".to_string());
        let built = GraphBuilder::new().build(&m).unwrap();
        assert_eq!(built.graph.edge_count(), 1);
        assert_eq!(built.report.diagram_failures.len(), 1);
        assert_eq!(built.report.diagram_failures[0].component.as_str(), "s/c/a");
    }

    #[test]
    fn diagram_parse_failure_leaves_other_components_intact() {
        let mut m = merged_model();
        let components = &mut m.systems[0].containers[0].components;
        components[0].diagram = Some("a -> {".to_string());
        components[1].diagram = Some("b -> d: uses".to_string());

        let built = GraphBuilder::new().build(&m).unwrap();
        let g = &built.graph;
        assert_eq!(g.node_count(), 5);
        assert_eq!(g.edge_count(), 2);

        let edges = g.outgoing_edges("s/c/b");
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target.as_str(), "s/c/d");
        assert_eq!(edges[0].origin, RelationOrigin::Diagram);
        assert_eq!(edges[0].description.as_deref(), Some("uses"));

        assert_eq!(built.report.diagram_failures.len(), 1);
        assert_eq!(built.report.diagram_failures[0].component.as_str(), "s/c/a");
        assert!(g.validate().is_empty());
    }

    #[derive(Debug)]
    struct FixedParser;

    impl DiagramParser for FixedParser {
        fn parse(&self, _source: &str) -> Result<Vec<DiagramRelation>> {
            Ok(vec![DiagramRelation {
                source: "a".to_string(),
                target: "d".to_string(),
                label: Some("injected".to_string()),
                line: 1,
            }])
        }
    }

    #[test]
    fn parser_is_injectable() {
        let built = GraphBuilder::new()
            .with_parser(FixedParser)
            .build(&merged_model())
            .unwrap();
        let edges = built.graph.outgoing_edges("s/c/a");
        let to_d = edges.iter().find(|e| e.target.as_str() == "s/c/d").unwrap();
        assert_eq!(to_d.description.as_deref(), Some("injected"));
        assert!(edges.iter().all(|e| e.description.as_deref() != Some("diagram text")));
    }

    #[test]
    fn build_graph_uses_defaults() {
        let g = build_graph(&merged_model()).unwrap();
        assert_eq!(g.edge_count(), 2);
        assert!(g.validate().is_empty());
    }
}
