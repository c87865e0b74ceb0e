//! Read-only mapping from symbolic targets to screen coordinates.

use crate::types::{ActionDescriptor, Command, SymbolicTarget, TargetEntry};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("Target id must be positive")]
    InvalidId,
    #[error("Duplicate target id: {0}")]
    DuplicateId(u32),
    #[error("Duplicate target label: {0}")]
    DuplicateLabel(String),
    #[error("Target {0} has an empty label")]
    EmptyLabel(u32),
    #[error("Target {0} has negative coordinates")]
    NegativeCoordinate(u32),
}

#[derive(Debug, Clone)]
pub struct TargetRegistry {
    entries: Vec<TargetEntry>,
    by_id: HashMap<u32, usize>,
}

impl TargetRegistry {
    /// Build a registry, keeping `entries` in the given order. Label lookups
    /// break ties by this order.
    pub fn new(entries: Vec<TargetEntry>) -> Result<Self, RegistryError> {
        let mut by_id = HashMap::with_capacity(entries.len());
        let mut labels = HashSet::with_capacity(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            if entry.id == 0 {
                return Err(RegistryError::InvalidId);
            }
            if entry.label.is_empty() {
                return Err(RegistryError::EmptyLabel(entry.id));
            }
            if entry.x < 0 || entry.y < 0 {
                return Err(RegistryError::NegativeCoordinate(entry.id));
            }
            if by_id.insert(entry.id, index).is_some() {
                return Err(RegistryError::DuplicateId(entry.id));
            }
            if !labels.insert(entry.label.as_str()) {
                return Err(RegistryError::DuplicateLabel(entry.label.clone()));
            }
        }

        Ok(Self { entries, by_id })
    }

    /// The three-slot grid the mobile client renders by default.
    pub fn default_grid() -> Self {
        Self::new(default_grid_entries()).expect("default grid entries are valid")
    }

    pub fn lookup_by_id(&self, id: u32) -> Option<&TargetEntry> {
        self.by_id.get(&id).map(|&index| &self.entries[index])
    }

    /// First entry, in registry order, whose label occurs in `fragment`.
    pub fn lookup_by_label(&self, fragment: &str) -> Option<&TargetEntry> {
        self.entries
            .iter()
            .find(|entry| fragment.contains(entry.label.as_str()))
    }

    pub fn lookup(&self, target: &SymbolicTarget) -> Option<&TargetEntry> {
        match target {
            SymbolicTarget::Id(id) => self.lookup_by_id(*id),
            SymbolicTarget::Label(label) => self.entries.iter().find(|e| &e.label == label),
            SymbolicTarget::Element(_) => None,
        }
    }

    /// Turn a symbolic target into an executable action. Element targets
    /// are resolved against the command's own UI elements.
    pub fn resolve(&self, target: &SymbolicTarget, command: &Command) -> Option<ActionDescriptor> {
        match target {
            SymbolicTarget::Element(index) => command.ui_elements().get(*index).map(|element| {
                let (x, y) = element.bounds.center();
                ActionDescriptor::Tap { x, y }
            }),
            _ => self
                .lookup(target)
                .map(|entry| ActionDescriptor::Tap { x: entry.x, y: entry.y }),
        }
    }

    pub fn entries(&self) -> &[TargetEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn default_grid_entries() -> Vec<TargetEntry> {
    vec![
        TargetEntry {
            id: 1,
            label: "구글".to_string(),
            x: 100,
            y: 400,
            url: Some("https://www.google.com".to_string()),
        },
        TargetEntry {
            id: 2,
            label: "페이스북".to_string(),
            x: 180,
            y: 400,
            url: Some("https://www.facebook.com".to_string()),
        },
        TargetEntry {
            id: 3,
            label: "네이버".to_string(),
            x: 260,
            y: 400,
            url: Some("https://www.naver.com".to_string()),
        },
    ]
}
