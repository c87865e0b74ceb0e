use crate::error::EngineError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    pub fn is_valid(&self) -> bool {
        self.left < self.right && self.top < self.bottom
    }

    /// Midpoint of the box. Computed in `i64` so extreme bounds cannot
    /// overflow; the result always lies between the edges.
    pub fn center(&self) -> (i32, i32) {
        (midpoint(self.left, self.right), midpoint(self.top, self.bottom))
    }
}

fn midpoint(low: i32, high: i32) -> i32 {
    ((low as i64 + high as i64) / 2) as i32
}

/// A UI element visible on the device screen, as reported by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDescriptor {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub bounds: Bounds,
}

/// An inbound command. Only constructible through the validating builders,
/// so every `Command` the resolver sees has non-empty text, decodable
/// screen context and well-formed element bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    raw_text: String,
    #[serde(skip_serializing)]
    screen_context: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ui_elements: Vec<ElementDescriptor>,
}

impl Command {
    pub fn new(raw_text: impl Into<String>) -> Result<Self, EngineError> {
        let raw_text = raw_text.into();
        if raw_text.trim().is_empty() {
            return Err(EngineError::InvalidInput(
                "command text must not be empty".to_string(),
            ));
        }

        Ok(Self {
            raw_text,
            screen_context: None,
            ui_elements: Vec::new(),
        })
    }

    /// Attach a base64 screen capture. A `data:...;base64,` prefix is stripped.
    pub fn with_screen_context(mut self, image: impl Into<String>) -> Result<Self, EngineError> {
        let image = image.into();
        let payload = match image.split_once(";base64,") {
            Some((prefix, data)) if prefix.starts_with("data:") => data.to_string(),
            _ => image,
        };

        if payload.trim().is_empty() {
            return Ok(self);
        }
        BASE64
            .decode(payload.as_bytes())
            .map_err(|e| EngineError::InvalidInput(format!("screen context is not base64: {}", e)))?;

        self.screen_context = Some(payload);
        Ok(self)
    }

    pub fn with_ui_elements(
        mut self,
        elements: Vec<ElementDescriptor>,
    ) -> Result<Self, EngineError> {
        if let Some(bad) = elements.iter().find(|e| !e.bounds.is_valid()) {
            return Err(EngineError::InvalidInput(format!(
                "element '{}' has invalid bounds",
                bad.text
            )));
        }
        self.ui_elements = elements;
        Ok(self)
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn screen_context(&self) -> Option<&str> {
        self.screen_context.as_deref()
    }

    pub fn ui_elements(&self) -> &[ElementDescriptor] {
        &self.ui_elements
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetEntry {
    pub id: u32,
    pub label: String,
    pub x: i32,
    pub y: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A target named by a strategy, before coordinate resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SymbolicTarget {
    Id(u32),
    Label(String),
    /// Index into the command's UI elements.
    Element(usize),
}

impl fmt::Display for SymbolicTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolicTarget::Id(id) => write!(f, "#{}", id),
            SymbolicTarget::Label(label) => write!(f, "'{}'", label),
            SymbolicTarget::Element(index) => write!(f, "element[{}]", index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionDescriptor {
    Tap { x: i32, y: i32 },
    LaunchApp { name: String },
    RunTask { name: String },
    None,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationRecord {
    pub command: Command,
    pub resolved_action: ActionDescriptor,
    pub timestamp: DateTime<Utc>,
}

impl ConversationRecord {
    pub fn new(command: Command, resolved_action: ActionDescriptor) -> Self {
        Self {
            command,
            resolved_action,
            timestamp: Utc::now(),
        }
    }
}
