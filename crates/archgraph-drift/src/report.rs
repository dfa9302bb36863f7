use archgraph_core::QualifiedId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warning => write!(f, "WARNING"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DriftKind {
    /// Diagram points at a target that is neither declared nor in the model.
    MissingComponent,
    /// Structural declaration points at a component that no longer exists.
    OrphanedRelationship,
    /// Both sources declare the relationship with different text.
    DescriptionMismatch,
}

impl DriftKind {
    pub fn severity(self) -> Severity {
        match self {
            DriftKind::MissingComponent | DriftKind::OrphanedRelationship => Severity::Error,
            DriftKind::DescriptionMismatch => Severity::Warning,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DriftKind::MissingComponent => "missing-component",
            DriftKind::OrphanedRelationship => "orphaned-relationship",
            DriftKind::DescriptionMismatch => "description-mismatch",
        }
    }
}

impl fmt::Display for DriftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftIssue {
    pub component: QualifiedId,
    pub kind: DriftKind,
    pub severity: Severity,
    /// Relationship target as written in the source that raised the issue.
    pub target: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl DriftIssue {
    pub(crate) fn new(component: &QualifiedId, kind: DriftKind, target: &str, message: String) -> Self {
        Self {
            component: component.clone(),
            kind,
            severity: kind.severity(),
            target: target.to_string(),
            message,
            expected: None,
            actual: None,
        }
    }

    pub(crate) fn with_texts(mut self, expected: &str, actual: &str) -> Self {
        self.expected = Some(expected.to_string());
        self.actual = Some(actual.to_string());
        self
    }
}

impl fmt::Display for DriftIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {}: {}", self.severity, self.component, self.kind, self.message)?;
        if let (Some(expected), Some(actual)) = (&self.expected, &self.actual) {
            write!(f, " (expected {:?}, actual {:?})", expected, actual)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftReport {
    pub issues: Vec<DriftIssue>,
    pub components_checked: usize,
    /// Components whose diagram source failed to parse and was not compared.
    pub diagram_failures: Vec<QualifiedId>,
    pub has_errors: bool,
    pub has_warnings: bool,
}

impl DriftReport {
    pub(crate) fn from_issues(
        issues: Vec<DriftIssue>,
        components_checked: usize,
        diagram_failures: Vec<QualifiedId>,
    ) -> Self {
        let has_errors = issues.iter().any(|i| i.severity == Severity::Error);
        let has_warnings = issues.iter().any(|i| i.severity == Severity::Warning);
        Self {
            issues,
            components_checked,
            diagram_failures,
            has_errors,
            has_warnings,
        }
    }

    /// Whether a caller should treat this report as failed; `strict` promotes warnings.
    pub fn is_failure(&self, strict: bool) -> bool {
        self.has_errors || (strict && self.has_warnings)
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &DriftIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DriftIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    pub fn issues_for<'a>(&'a self, component: &'a str) -> impl Iterator<Item = &'a DriftIssue> + 'a {
        self.issues
            .iter()
            .filter(move |i| i.component.as_str() == component)
    }
}
