//! Per-component comparison of structural declarations against diagram sources.
//!
//! The detector works on the model directly, never on a built graph: it
//! compares what each source says, before anything is merged.

use crate::{DriftIssue, DriftKind, DriftReport};
use archgraph_core::{
    diagram_relationships, normalize_reference, ArchitectureModel, ArrowDiagramParser,
    ComponentIndex, ComponentRef, DiagramParser, QualifiedId,
};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of checking one component.
struct ComponentCheck {
    issues: Vec<DriftIssue>,
    diagram_failed: Option<QualifiedId>,
}

#[derive(Clone)]
pub struct DriftDetector {
    parser: Arc<dyn DiagramParser>,
}

impl Default for DriftDetector {
    fn default() -> Self {
        Self {
            parser: Arc::new(ArrowDiagramParser::new()),
        }
    }
}

impl fmt::Debug for DriftDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriftDetector").finish_non_exhaustive()
    }
}

impl DriftDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parser<P: DiagramParser + 'static>(mut self, parser: P) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    /// Check every component. Components are checked in parallel; issues come
    /// back in model order regardless of scheduling.
    pub fn detect(&self, model: &ArchitectureModel) -> DriftReport {
        let index = model.component_index();
        let entries: Vec<ComponentRef<'_>> = model.components().collect();

        let checks: Vec<ComponentCheck> = entries
            .par_iter()
            .map(|entry| self.check_component(entry, &index))
            .collect();

        let mut issues = Vec::new();
        let mut diagram_failures = Vec::new();
        for check in checks {
            issues.extend(check.issues);
            diagram_failures.extend(check.diagram_failed);
        }

        let report = DriftReport::from_issues(issues, entries.len(), diagram_failures);
        info!(
            components = report.components_checked,
            errors = report.errors().count(),
            warnings = report.warnings().count(),
            diagram_failures = report.diagram_failures.len(),
            "drift detection complete"
        );
        report
    }

    fn check_component(&self, entry: &ComponentRef<'_>, index: &ComponentIndex) -> ComponentCheck {
        let component = entry.qualified_id();
        let mut issues = Vec::new();

        // canonical target key -> (reference as written, description)
        let mut structural: BTreeMap<String, (&str, &str)> = BTreeMap::new();
        for (target, description) in &entry.component.relationships {
            if !index.contains(target) {
                issues.push(DriftIssue::new(
                    &component,
                    DriftKind::OrphanedRelationship,
                    target,
                    format!("declared dependency on `{}`, which no longer exists in the model", target),
                ));
            }
            structural
                .entry(canonical_target(index, target))
                .or_insert((target.as_str(), description.as_str()));
        }

        let diagram = match diagram_relationships(self.parser.as_ref(), entry) {
            None => BTreeMap::new(),
            Some(Ok(relations)) => relations,
            Some(Err(err)) => {
                warn!(component = %component, error = %err, "diagram source failed to parse, skipping diagram comparison");
                return ComponentCheck {
                    issues,
                    diagram_failed: Some(component),
                };
            }
        };

        for (target, label) in &diagram {
            match structural.get(&canonical_target(index, target)) {
                Some((_, declared)) => {
                    let expected = declared.trim();
                    let actual = label.trim();
                    if !expected.is_empty() && !actual.is_empty() && expected != actual {
                        issues.push(
                            DriftIssue::new(
                                &component,
                                DriftKind::DescriptionMismatch,
                                target,
                                format!("description of the relationship to `{}` differs between sources", target),
                            )
                            .with_texts(expected, actual),
                        );
                    }
                }
                None if !index.contains(target) => {
                    let message = match index.enclosing_element(target) {
                        Some(element) => format!(
                            "diagram references `{}`, which resolves to {} and is not a component",
                            target, element
                        ),
                        None => format!("diagram references `{}`, which does not exist in the model", target),
                    };
                    issues.push(DriftIssue::new(
                        &component,
                        DriftKind::MissingComponent,
                        target,
                        message,
                    ));
                }
                None => {}
            }
        }

        debug!(component = %component, issues = issues.len(), "checked component");
        ComponentCheck {
            issues,
            diagram_failed: None,
        }
    }
}

/// Key under which both sources' references to the same component meet.
fn canonical_target(index: &ComponentIndex, reference: &str) -> String {
    index
        .resolve(reference)
        .map(QualifiedId::into_string)
        .unwrap_or_else(|_| normalize_reference(reference))
}

/// Run drift detection with the default diagram parser.
pub fn detect_drift(model: &ArchitectureModel) -> DriftReport {
    DriftDetector::default().detect(model)
}
