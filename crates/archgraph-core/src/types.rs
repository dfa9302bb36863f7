use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Nesting level of an architecture element, coarsest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    System,
    Container,
    Component,
}

impl ElementKind {
    /// Number of path segments in a qualified ID of this kind.
    pub fn depth(self) -> usize {
        match self {
            ElementKind::System => 1,
            ElementKind::Container => 2,
            ElementKind::Component => 3,
        }
    }

    pub fn from_depth(depth: usize) -> Option<Self> {
        match depth {
            1 => Some(ElementKind::System),
            2 => Some(ElementKind::Container),
            3 => Some(ElementKind::Component),
            _ => None,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ElementKind::System => "system",
            ElementKind::Container => "container",
            ElementKind::Component => "component",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ElementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "system" => Ok(ElementKind::System),
            "container" => Ok(ElementKind::Container),
            "component" => Ok(ElementKind::Component),
            other => Err(format!("unknown element kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    DependsOn,
    Contains,
}

impl Default for EdgeKind {
    fn default() -> Self {
        EdgeKind::DependsOn
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EdgeKind::DependsOn => "depends_on",
            EdgeKind::Contains => "contains",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for EdgeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "depends_on" | "dependency" | "uses" => Ok(EdgeKind::DependsOn),
            "contains" | "child" => Ok(EdgeKind::Contains),
            other => Err(format!("unknown edge kind: {}", other)),
        }
    }
}

/// Which description source declared a merged relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RelationOrigin {
    Structural,
    Diagram,
    Both,
}

impl fmt::Display for RelationOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelationOrigin::Structural => "structural",
            RelationOrigin::Diagram => "diagram",
            RelationOrigin::Both => "both",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_kind_roundtrips_through_display() {
        for kind in [
            ElementKind::System,
            ElementKind::Container,
            ElementKind::Component,
        ] {
            assert_eq!(kind.to_string().parse::<ElementKind>().unwrap(), kind);
            assert_eq!(ElementKind::from_depth(kind.depth()), Some(kind));
        }
        assert!("module".parse::<ElementKind>().is_err());
    }

    #[test]
    fn edge_kind_accepts_aliases() {
        assert_eq!("depends-on".parse::<EdgeKind>().unwrap(), EdgeKind::DependsOn);
        assert_eq!("Uses".parse::<EdgeKind>().unwrap(), EdgeKind::DependsOn);
        assert_eq!("contains".parse::<EdgeKind>().unwrap(), EdgeKind::Contains);
        assert_eq!(EdgeKind::default(), EdgeKind::DependsOn);
    }
}
