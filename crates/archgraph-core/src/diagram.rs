//! Diagram-source parsing.
//!
//! Diagrams are declarative text where connections are written with arrows:
//!
//! ```text
//! # comment
//! auth -> user-store: reads users
//! gateway <- auth: "issues tokens"
//! cache <-> auth
//! backend.api { auth -> billing; }
//! ```
//!
//! Only connections matter to the engine. Shape declarations, styles and
//! nested blocks are accepted and ignored. A parse either succeeds for the
//! whole text or fails; there is no partial result.

use crate::id::{normalize_id, normalize_reference, SEPARATOR};
use crate::model::ComponentRef;
use crate::{ArchGraphError, QualifiedId, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One directed connection found in a diagram source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramRelation {
    pub source: String,
    pub target: String,
    pub label: Option<String>,
    /// 1-based line the connection was declared on.
    pub line: usize,
}

impl DiagramRelation {
    /// Whether the connection originates at the given component.
    pub fn originates_at(&self, id: &QualifiedId, name: &str) -> bool {
        let source = normalize_reference(&self.source);
        if source.is_empty() {
            return false;
        }
        source == id.as_str() || id.ends_with_path(&source) || source == normalize_id(name)
    }
}

pub trait DiagramParser: Send + Sync {
    fn parse(&self, source: &str) -> Result<Vec<DiagramRelation>>;
}

/// Parser for arrow-style connection syntax (`a -> b: label`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrowDiagramParser;

impl ArrowDiagramParser {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arrow {
    Forward,
    Backward,
    Both,
}

impl DiagramParser for ArrowDiagramParser {
    fn parse(&self, source: &str) -> Result<Vec<DiagramRelation>> {
        let mut relations = Vec::new();
        let mut depth = 0usize;
        let mut last_open = 0usize;

        for (idx, line) in source.lines().enumerate() {
            let line_no = idx + 1;
            let before = depth;
            let statements = split_statements(line, line_no, &mut depth)?;
            if depth > before {
                last_open = line_no;
            }
            for statement in statements {
                parse_statement(statement, line_no, &mut relations)?;
            }
        }

        if depth > 0 {
            return Err(ArchGraphError::DiagramParse {
                line: last_open,
                message: format!("{} unclosed '{{' block(s)", depth),
            });
        }
        Ok(relations)
    }
}

/// Split a line into statements at `{`, `}` and `;`, dropping `#` comments.
fn split_statements<'a>(line: &'a str, line_no: usize, depth: &mut usize) -> Result<Vec<&'a str>> {
    let bytes = line.as_bytes();
    let mut statements = Vec::new();
    let mut in_quote = false;
    let mut start = 0;
    let mut end = bytes.len();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_quote {
            match b {
                b'\\' => i += 1,
                b'"' => in_quote = false,
                _ => {}
            }
            i += 1;
            continue;
        }
        match b {
            b'"' => in_quote = true,
            b'#' => {
                end = i;
                break;
            }
            b'{' | b'}' | b';' => {
                statements.push(&line[start..i]);
                start = i + 1;
                if b == b'{' {
                    *depth += 1;
                } else if b == b'}' {
                    if *depth == 0 {
                        return Err(ArchGraphError::DiagramParse {
                            line: line_no,
                            message: "unexpected '}'".to_string(),
                        });
                    }
                    *depth -= 1;
                }
            }
            _ => {}
        }
        i += 1;
    }

    if in_quote {
        return Err(ArchGraphError::DiagramParse {
            line: line_no,
            message: "unterminated string".to_string(),
        });
    }
    if start < end {
        statements.push(&line[start..end]);
    }
    Ok(statements
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .collect())
}

fn parse_statement(statement: &str, line_no: usize, out: &mut Vec<DiagramRelation>) -> Result<()> {
    let bytes = statement.as_bytes();
    let mut arrows: Vec<(usize, usize, Arrow)> = Vec::new();
    let mut label_at = None;
    let mut in_quote = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_quote {
            match b {
                b'\\' => i += 1,
                b'"' => in_quote = false,
                _ => {}
            }
            i += 1;
            continue;
        }
        let rest = &bytes[i..];
        if b == b'"' {
            in_quote = true;
        } else if rest.starts_with(b"<->") {
            arrows.push((i, 3, Arrow::Both));
            i += 3;
            continue;
        } else if rest.starts_with(b"->") {
            arrows.push((i, 2, Arrow::Forward));
            i += 2;
            continue;
        } else if rest.starts_with(b"<-") {
            arrows.push((i, 2, Arrow::Backward));
            i += 2;
            continue;
        } else if b == b':' {
            if arrows.is_empty() {
                // `name: Label` shape declaration
                return Ok(());
            }
            label_at = Some(i);
            break;
        }
        i += 1;
    }

    if arrows.is_empty() {
        return Ok(());
    }

    let body_end = label_at.unwrap_or(bytes.len());
    let mut endpoints = Vec::with_capacity(arrows.len() + 1);
    let mut cursor = 0;
    for &(pos, len, _) in &arrows {
        endpoints.push(&statement[cursor..pos]);
        cursor = pos + len;
    }
    endpoints.push(&statement[cursor..body_end]);

    let endpoints: Vec<String> = endpoints
        .into_iter()
        .map(endpoint_reference)
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| ArchGraphError::DiagramParse {
            line: line_no,
            message: format!("connection is missing an endpoint: '{}'", statement.trim()),
        })?;

    let label = label_at
        .map(|pos| unquote(statement[pos + 1..].trim()))
        .filter(|l| !l.is_empty());

    for (idx, &(_, _, arrow)) in arrows.iter().enumerate() {
        let left = &endpoints[idx];
        let right = &endpoints[idx + 1];
        let mut push = |source: &String, target: &String| {
            out.push(DiagramRelation {
                source: source.clone(),
                target: target.clone(),
                label: label.clone(),
                line: line_no,
            })
        };
        match arrow {
            Arrow::Forward => push(left, right),
            Arrow::Backward => push(right, left),
            Arrow::Both => {
                push(left, right);
                push(right, left);
            }
        }
    }
    Ok(())
}

/// Turn a raw endpoint into a reference. Unquoted dotted paths become slash paths.
fn endpoint_reference(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('"') {
        let inner = unquote(trimmed);
        return (!inner.trim().is_empty()).then_some(inner);
    }
    Some(trimmed.replace('.', &SEPARATOR.to_string()))
}

fn unquote(raw: &str) -> String {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        raw[1..raw.len() - 1].replace("\\\"", "\"")
    } else {
        raw.to_string()
    }
}

/// Keep only the connections whose source denotes the given component.
pub fn relations_for(
    relations: Vec<DiagramRelation>,
    entry: &ComponentRef<'_>,
) -> Vec<DiagramRelation> {
    let id = entry.qualified_id();
    relations
        .into_iter()
        .filter(|r| r.originates_at(&id, &entry.component.name))
        .collect()
}

/// Relationships a component's diagram declares, shaped like its structural map.
///
/// Returns `None` when the component has no diagram source. Connections that
/// originate elsewhere are ignored; when a target repeats, the first label wins.
pub fn diagram_relationships(
    parser: &dyn DiagramParser,
    entry: &ComponentRef<'_>,
) -> Option<Result<BTreeMap<String, String>>> {
    let source = entry.component.diagram.as_deref()?;
    Some(parser.parse(source).map(|relations| {
        let mut map = BTreeMap::new();
        for relation in relations_for(relations, entry) {
            map.entry(relation.target)
                .or_insert_with(|| relation.label.unwrap_or_default());
        }
        map
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ArchitectureModel, Component, Container, System};

    fn parse(src: &str) -> Result<Vec<DiagramRelation>> {
        ArrowDiagramParser::new().parse(src)
    }

    #[test]
    fn parses_simple_arrows_with_labels() {
        let rels = parse("auth -> user-store: reads users\nauth -> cache").unwrap();
        assert_eq!(rels.len(), 2);
        assert_eq!(rels[0].source, "auth");
        assert_eq!(rels[0].target, "user-store");
        assert_eq!(rels[0].label.as_deref(), Some("reads users"));
        assert_eq!(rels[0].line, 1);
        assert_eq!(rels[1].label, None);
    }

    #[test]
    fn handles_reverse_bidirectional_and_chains() {
        let rels = parse("gateway <- auth: \"issues tokens\"\na <-> b\nx -> y -> z").unwrap();
        let pairs: Vec<(&str, &str)> = rels
            .iter()
            .map(|r| (r.source.as_str(), r.target.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("auth", "gateway"), ("a", "b"), ("b", "a"), ("x", "y"), ("y", "z")]
        );
        assert_eq!(rels[0].label.as_deref(), Some("issues tokens"));
    }

    #[test]
    fn ignores_comments_shapes_and_blocks() {
        let src = r#"
# the auth component
auth: Auth Service {
  shape: hexagon
}
backend.api { auth -> billing; }
"quoted name" -> auth # trailing comment
"#;
        let rels = parse(src).unwrap();
        assert_eq!(rels.len(), 2);
        assert_eq!(rels[0].source, "auth");
        assert_eq!(rels[0].target, "billing");
        assert_eq!(rels[1].source, "quoted name");
    }

    #[test]
    fn dotted_paths_become_qualified_references() {
        let rels = parse("auth -> backend.api.billing").unwrap();
        assert_eq!(rels[0].target, "backend/api/billing");
    }

    #[test]
    fn malformed_sources_fail() {
        assert!(matches!(
            parse("auth -> : broken"),
            Err(ArchGraphError::DiagramParse { line: 1, .. })
        ));
        assert!(matches!(
            parse("ok -> fine\nauth -> \"unterminated"),
            Err(ArchGraphError::DiagramParse { line: 2, .. })
        ));
        assert!(parse("block {\n a -> b\n").is_err());
        assert!(parse("}\n").is_err());
    }

    #[test]
    fn selects_relationships_originating_at_component() {
        let model = ArchitectureModel::new("m").with_system(
            System::new("backend").with_container(
                Container::new("api").with_component(
                    Component::new("Auth").with_diagram(
                        "auth -> billing: charges\nbilling -> ledger\napi.auth -> billing: dup\nAuth -> cache",
                    ),
                ),
            ),
        );
        let entry = model.components().next().unwrap();
        let map = diagram_relationships(&ArrowDiagramParser, &entry)
            .unwrap()
            .unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("billing").map(String::as_str), Some("charges"));
        assert_eq!(map.get("cache").map(String::as_str), Some(""));
    }
}
