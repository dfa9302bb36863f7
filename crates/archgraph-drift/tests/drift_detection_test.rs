use archgraph_core::{
    ArchitectureModel, Component, Container, DiagramParser, DiagramRelation, DriftConfig, Result,
    System,
};
use archgraph_drift::{detect_drift, DriftDetector, DriftKind, Severity};

fn create_test_model() -> ArchitectureModel {
    ArchitectureModel::new("platform")
        .with_system(
            System::new("Backend").with_container(
                Container::new("API")
                    .with_component(
                        Component::new("Auth")
                            .with_relationship("user-store", "reads users")
                            .with_diagram("auth -> user-store: reads users"),
                    )
                    .with_component(
                        Component::new("Billing")
                            .with_relationship("ledger", "posts entries")
                            .with_relationship("old-service", "legacy sync")
                            .with_diagram(
                                "billing -> ledger: writes entries\nbilling -> fraud-check: screens",
                            ),
                    )
                    .with_component(Component::new("User Store"))
                    .with_component(Component::new("Ledger")),
            ),
        )
        .with_system(
            System::new("Admin").with_container(
                Container::new("UI").with_component(
                    Component::new("Auth")
                        .with_relationship("api/auth", "delegates")
                        .with_diagram("auth -> backend.api.auth: delegates"),
                ),
            ),
        )
}

#[test]
fn test_report_covers_every_component() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let report = detect_drift(&create_test_model());
    assert_eq!(report.components_checked, 5);
    assert!(report.diagram_failures.is_empty());
}

#[test]
fn test_issues_are_classified() {
    let report = detect_drift(&create_test_model());
    let kinds: Vec<(&str, DriftKind)> = report
        .issues
        .iter()
        .map(|i| (i.target.as_str(), i.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("old-service", DriftKind::OrphanedRelationship),
            ("fraud-check", DriftKind::MissingComponent),
            ("ledger", DriftKind::DescriptionMismatch),
        ]
    );
    assert!(report.issues_for("backend/api/auth").next().is_none());
    assert!(report.issues_for("admin/ui/auth").next().is_none());
    assert_eq!(report.errors().count(), 2);
    assert_eq!(report.warnings().count(), 1);
    assert!(report.has_errors && report.has_warnings);
}

#[test]
fn test_strict_mode_from_config() {
    let mut model = create_test_model();
    let billing = &mut model.systems[0].containers[0].components[1];
    billing.relationships.remove("old-service");
    billing.diagram = Some("billing -> ledger: writes entries".to_string());

    let report = detect_drift(&model);
    assert!(!report.has_errors);
    assert!(!report.is_failure(DriftConfig::default().strict));
    assert!(report.is_failure(DriftConfig { strict: true }.strict));
}

#[test]
fn test_output_order_is_deterministic() {
    let model = create_test_model();
    let first = detect_drift(&model);
    for _ in 0..10 {
        assert_eq!(detect_drift(&model), first);
    }
}

struct EmptyParser;

impl DiagramParser for EmptyParser {
    fn parse(&self, _source: &str) -> Result<Vec<DiagramRelation>> {
        Ok(Vec::new())
    }
}

#[test]
fn test_custom_parser_sees_no_diagram_relationships() {
    let report = DriftDetector::new()
        .with_parser(EmptyParser)
        .detect(&create_test_model());
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].severity, Severity::Error);
    assert_eq!(report.issues[0].kind, DriftKind::OrphanedRelationship);
}

#[test]
fn test_report_serializes() {
    let report = detect_drift(&create_test_model());
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["has_errors"], true);
    assert_eq!(json["issues"][0]["kind"], "orphaned-relationship");
    assert_eq!(json["issues"][2]["expected"], "posts entries");
    assert_eq!(json["issues"][2]["actual"], "writes entries");
}
