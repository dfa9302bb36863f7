//! Hierarchical architecture model: systems contain containers contain components.
//!
//! These are the values the engine consumes. How they are stored on disk is
//! the caller's business; everything here is plain serde data.

use crate::id::{normalize_id, normalize_reference, QualifiedId, SEPARATOR};
use crate::{ArchGraphError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchitectureModel {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub systems: Vec<System>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct System {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub containers: Vec<Container>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technology: Option<String>,
    #[serde(default)]
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technology: Option<String>,
    /// Structural declarations: target reference (short or qualified) to description.
    #[serde(default)]
    pub relationships: BTreeMap<String, String>,
    /// Diagram-source text associated with this component, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagram: Option<String>,
}

fn short_id_of(id: &str, name: &str) -> String {
    if id.trim().is_empty() {
        normalize_id(name)
    } else {
        normalize_id(id)
    }
}

impl System {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: normalize_id(&name),
            name,
            description: None,
            containers: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_container(mut self, container: Container) -> Self {
        self.containers.push(container);
        self
    }

    pub fn short_id(&self) -> String {
        short_id_of(&self.id, &self.name)
    }
}

impl Container {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: normalize_id(&name),
            name,
            description: None,
            technology: None,
            components: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_technology(mut self, technology: impl Into<String>) -> Self {
        self.technology = Some(technology.into());
        self
    }

    pub fn with_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    pub fn short_id(&self) -> String {
        short_id_of(&self.id, &self.name)
    }
}

impl Component {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: normalize_id(&name),
            name,
            description: None,
            technology: None,
            relationships: BTreeMap::new(),
            diagram: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_technology(mut self, technology: impl Into<String>) -> Self {
        self.technology = Some(technology.into());
        self
    }

    pub fn with_relationship(
        mut self,
        target: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.relationships.insert(target.into(), description.into());
        self
    }

    pub fn with_diagram(mut self, source: impl Into<String>) -> Self {
        self.diagram = Some(source.into());
        self
    }

    pub fn short_id(&self) -> String {
        short_id_of(&self.id, &self.name)
    }
}

/// A component together with its position in the hierarchy.
#[derive(Debug, Clone, Copy)]
pub struct ComponentRef<'a> {
    pub system: &'a System,
    pub container: &'a Container,
    pub component: &'a Component,
}

impl ComponentRef<'_> {
    pub fn qualified_id(&self) -> QualifiedId {
        QualifiedId::component(
            &self.system.short_id(),
            &self.container.short_id(),
            &self.component.short_id(),
        )
    }
}

impl ArchitectureModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: System) -> Self {
        self.systems.push(system);
        self
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let mut model: ArchitectureModel = serde_json::from_str(raw)?;
        model.normalize_ids();
        Ok(model)
    }

    /// Fill empty IDs from display names and normalize explicit ones.
    pub fn normalize_ids(&mut self) {
        for system in &mut self.systems {
            system.id = system.short_id();
            for container in &mut system.containers {
                container.id = container.short_id();
                for component in &mut container.components {
                    component.id = component.short_id();
                }
            }
        }
    }

    /// Every component in hierarchy order.
    pub fn components(&self) -> impl Iterator<Item = ComponentRef<'_>> {
        self.systems.iter().flat_map(|system| {
            system.containers.iter().flat_map(move |container| {
                container.components.iter().map(move |component| ComponentRef {
                    system,
                    container,
                    component,
                })
            })
        })
    }

    pub fn component_count(&self) -> usize {
        self.systems
            .iter()
            .flat_map(|s| s.containers.iter())
            .map(|c| c.components.len())
            .sum()
    }

    pub fn component_index(&self) -> ComponentIndex {
        ComponentIndex::from_model(self)
    }
}

/// Read-only lookup of every component's qualified and short ID.
///
/// Answers "does this reference exist anywhere in the model" without
/// building a graph.
#[derive(Debug, Clone, Default)]
pub struct ComponentIndex {
    qualified: BTreeSet<QualifiedId>,
    by_short: HashMap<String, Vec<QualifiedId>>,
    /// Systems and containers.
    enclosing: BTreeSet<QualifiedId>,
}

impl ComponentIndex {
    pub fn from_model(model: &ArchitectureModel) -> Self {
        let mut index = Self::default();
        for system in &model.systems {
            let system_id = QualifiedId::system(&system.short_id());
            for container in &system.containers {
                index.enclosing.insert(system_id.child(&container.short_id()));
            }
            index.enclosing.insert(system_id);
        }
        for entry in model.components() {
            let id = entry.qualified_id();
            index
                .by_short
                .entry(id.short_id().to_string())
                .or_default()
                .push(id.clone());
            index.qualified.insert(id);
        }
        index
    }

    pub fn len(&self) -> usize {
        self.qualified.len()
    }

    pub fn is_empty(&self) -> bool {
        self.qualified.is_empty()
    }

    /// All components a reference could denote, in ID order.
    pub fn candidates(&self, reference: &str) -> Vec<&QualifiedId> {
        let normalized = normalize_reference(reference);
        if normalized.is_empty() {
            return Vec::new();
        }
        if let Some(id) = self.qualified.get(normalized.as_str()) {
            return vec![id];
        }
        let short = normalized.rsplit(SEPARATOR).next().unwrap_or(normalized.as_str());
        let mut found: Vec<&QualifiedId> = self
            .by_short
            .get(short)
            .map(|bucket| {
                bucket
                    .iter()
                    .filter(|id| id.ends_with_path(&normalized))
                    .collect()
            })
            .unwrap_or_default();
        found.sort();
        found
    }

    pub fn contains(&self, reference: &str) -> bool {
        !self.candidates(reference).is_empty()
    }

    /// The system or container a reference names, when it names exactly one
    /// and no component.
    pub fn enclosing_element(&self, reference: &str) -> Option<&QualifiedId> {
        if self.contains(reference) {
            return None;
        }
        let normalized = normalize_reference(reference);
        if let Some(id) = self.enclosing.get(normalized.as_str()) {
            return Some(id);
        }
        let mut matches = self
            .enclosing
            .iter()
            .filter(|id| id.ends_with_path(&normalized));
        match (matches.next(), matches.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }

    /// Resolve a reference to exactly one component.
    pub fn resolve(&self, reference: &str) -> Result<QualifiedId> {
        let candidates = self.candidates(reference);
        match candidates.as_slice() {
            [] => Err(ArchGraphError::ShortIdNotFound(reference.to_string())),
            [only] => Ok((*only).clone()),
            many => Err(ArchGraphError::AmbiguousShortId {
                short_id: reference.to_string(),
                candidates: many.iter().map(|id| id.to_string()).collect(),
            }),
        }
    }
}
