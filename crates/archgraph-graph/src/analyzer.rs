//! Coupling and centrality analysis over component dependencies.

use crate::ArchGraph;
use archgraph_core::{AnalysisConfig, ElementKind, QualifiedId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyReport {
    pub system_count: usize,
    pub container_count: usize,
    pub component_count: usize,
    pub total_nodes: usize,
    pub total_edges: usize,
    /// Components with no incoming and no outgoing dependencies.
    pub isolated: Vec<QualifiedId>,
    /// Components whose out-degree exceeds the coupling threshold.
    pub highly_coupled: BTreeMap<QualifiedId, usize>,
    /// Components whose in-degree exceeds the centrality threshold.
    pub central: BTreeMap<QualifiedId, usize>,
    pub coupling_threshold: usize,
    pub centrality_threshold: usize,
}

impl DependencyReport {
    pub fn has_findings(&self) -> bool {
        !self.isolated.is_empty() || !self.highly_coupled.is_empty() || !self.central.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DependencyAnalyzer {
    config: AnalysisConfig,
}

impl DependencyAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// One pass over component nodes; systems and containers are only counted.
    pub fn analyze(&self, graph: &ArchGraph) -> DependencyReport {
        let mut report = DependencyReport {
            system_count: 0,
            container_count: 0,
            component_count: 0,
            total_nodes: graph.node_count(),
            total_edges: graph.edge_count(),
            isolated: Vec::new(),
            highly_coupled: BTreeMap::new(),
            central: BTreeMap::new(),
            coupling_threshold: self.config.coupling_threshold,
            centrality_threshold: self.config.centrality_threshold,
        };

        for node in graph.nodes() {
            match node.kind {
                ElementKind::System => report.system_count += 1,
                ElementKind::Container => report.container_count += 1,
                ElementKind::Component => {
                    report.component_count += 1;
                    let out_degree = graph.dependency_count(node.id.as_str());
                    let in_degree = graph.dependent_count(node.id.as_str());

                    if out_degree == 0 && in_degree == 0 {
                        report.isolated.push(node.id.clone());
                    }
                    if out_degree > self.config.coupling_threshold {
                        report.highly_coupled.insert(node.id.clone(), out_degree);
                    }
                    if in_degree > self.config.centrality_threshold {
                        report.central.insert(node.id.clone(), in_degree);
                    }
                }
            }
        }
        report.isolated.sort();

        info!(
            components = report.component_count,
            isolated = report.isolated.len(),
            highly_coupled = report.highly_coupled.len(),
            central = report.central.len(),
            "dependency analysis complete"
        );
        report
    }

    pub fn find_isolated(&self, graph: &ArchGraph) -> Vec<QualifiedId> {
        let mut ids: Vec<QualifiedId> = graph
            .nodes_of_kind(ElementKind::Component)
            .filter(|n| {
                graph.dependency_count(n.id.as_str()) == 0
                    && graph.dependent_count(n.id.as_str()) == 0
            })
            .map(|n| n.id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn find_highly_coupled(&self, graph: &ArchGraph) -> BTreeMap<QualifiedId, usize> {
        graph
            .nodes_of_kind(ElementKind::Component)
            .map(|n| (n.id.clone(), graph.dependency_count(n.id.as_str())))
            .filter(|(_, degree)| *degree > self.config.coupling_threshold)
            .collect()
    }

    pub fn find_central(&self, graph: &ArchGraph) -> BTreeMap<QualifiedId, usize> {
        graph
            .nodes_of_kind(ElementKind::Component)
            .map(|n| (n.id.clone(), graph.dependent_count(n.id.as_str())))
            .filter(|(_, degree)| *degree > self.config.centrality_threshold)
            .collect()
    }
}

/// Analyze with the default thresholds.
pub fn analyze_dependencies(graph: &ArchGraph) -> DependencyReport {
    DependencyAnalyzer::default().analyze(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_graph;
    use archgraph_core::{ArchitectureModel, Component, Container, System};

    /// hub depends on six leaves; six callers depend on sink; loner has nothing.
    fn model() -> ArchitectureModel {
        let mut hub = Component::new("hub");
        let mut container = Container::new("c");
        for i in 0..6 {
            hub = hub.with_relationship(format!("leaf-{i}"), "uses");
            container = container.with_component(Component::new(format!("leaf-{i}")));
        }
        for i in 0..6 {
            container = container.with_component(
                Component::new(format!("caller-{i}")).with_relationship("sink", "calls"),
            );
        }
        container = container
            .with_component(hub)
            .with_component(Component::new("sink"))
            .with_component(Component::new("loner"));
        ArchitectureModel::new("m").with_system(System::new("s").with_container(container))
    }

    #[test]
    fn report_counts_and_classifies() {
        let graph = build_graph(&model()).unwrap();
        let report = analyze_dependencies(&graph);

        assert_eq!(report.system_count, 1);
        assert_eq!(report.container_count, 1);
        assert_eq!(report.component_count, 15);
        assert_eq!(report.total_nodes, 17);
        assert_eq!(report.total_edges, 12);
        assert_eq!(report.isolated, vec![QualifiedId::component("s", "c", "loner")]);
        assert_eq!(report.highly_coupled.get("s/c/hub"), Some(&6));
        assert_eq!(report.highly_coupled.len(), 1);
        assert_eq!(report.central.get("s/c/sink"), Some(&6));
        assert_eq!(report.central.len(), 1);
        assert!(report.has_findings());
    }

    #[test]
    fn thresholds_are_strict() {
        let graph = build_graph(&model()).unwrap();
        let analyzer = DependencyAnalyzer::new(AnalysisConfig {
            coupling_threshold: 6,
            centrality_threshold: 6,
        });
        assert!(analyzer.find_highly_coupled(&graph).is_empty());
        assert!(analyzer.find_central(&graph).is_empty());

        let analyzer = DependencyAnalyzer::new(AnalysisConfig {
            coupling_threshold: 5,
            centrality_threshold: 5,
        });
        assert_eq!(analyzer.find_highly_coupled(&graph).len(), 1);
        assert_eq!(analyzer.find_central(&graph).len(), 1);
    }

    #[test]
    fn isolation_ignores_non_components() {
        let graph = build_graph(&model()).unwrap();
        let isolated = DependencyAnalyzer::default().find_isolated(&graph);
        assert_eq!(isolated.len(), 1);
        assert!(isolated.iter().all(|id| id.depth() == 3));
    }

    #[test]
    fn empty_graph_reports_nothing() {
        let report = analyze_dependencies(&ArchGraph::new());
        assert_eq!(report.total_nodes, 0);
        assert!(!report.has_findings());
        assert_eq!(report.coupling_threshold, 5);
    }
}
