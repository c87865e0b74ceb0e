//! Deterministic command matching: ordinal tokens first, then registry
//! labels, then on-screen element text. No external calls.

use crate::registry::TargetRegistry;
use crate::types::{Command, ElementDescriptor, SymbolicTarget};
use regex::Regex;
use std::ops::RangeInclusive;
use std::sync::Arc;

pub const DEFAULT_ORDINAL_SUFFIX: &str = "번";
pub const DEFAULT_ORDINAL_MIN: u32 = 1;
pub const DEFAULT_ORDINAL_MAX: u32 = 24;

/// Extraction rule for ordinal tokens such as `3번`: a number directly
/// followed by the counting suffix, accepted only inside a fixed range.
///
/// The same rule parses both raw commands and provider replies.
#[derive(Debug, Clone)]
pub struct OrdinalRule {
    pattern: Regex,
    suffix: String,
    range: RangeInclusive<u32>,
}

impl OrdinalRule {
    pub fn new(suffix: &str, min: u32, max: u32) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!("([0-9]+){}", regex::escape(suffix)))?;
        Ok(Self {
            pattern,
            suffix: suffix.to_string(),
            range: min..=max,
        })
    }

    /// First ordinal token in `text` whose value lies inside the range.
    pub fn extract(&self, text: &str) -> Option<u32> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
            .find(|n| self.range.contains(n))
    }

    pub fn format(&self, n: u32) -> String {
        format!("{}{}", n, self.suffix)
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn range(&self) -> &RangeInclusive<u32> {
        &self.range
    }
}

impl Default for OrdinalRule {
    fn default() -> Self {
        Self::new(DEFAULT_ORDINAL_SUFFIX, DEFAULT_ORDINAL_MIN, DEFAULT_ORDINAL_MAX)
            .expect("default ordinal pattern compiles")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched(SymbolicTarget),
    Unmatched,
}

pub struct DeterministicMatcher {
    registry: Arc<TargetRegistry>,
    ordinal: OrdinalRule,
}

impl DeterministicMatcher {
    pub fn new(registry: Arc<TargetRegistry>, ordinal: OrdinalRule) -> Self {
        Self { registry, ordinal }
    }

    /// Match against the registry only. A registered ordinal always beats a
    /// label; among labels the first in registry order wins.
    pub fn match_text(&self, raw_text: &str) -> MatchOutcome {
        if let Some(id) = self.ordinal.extract(raw_text) {
            if self.registry.lookup_by_id(id).is_some() {
                return MatchOutcome::Matched(SymbolicTarget::Id(id));
            }
            tracing::debug!("Ordinal {} is not a registered target", id);
        }

        match self.registry.lookup_by_label(raw_text) {
            Some(entry) => MatchOutcome::Matched(SymbolicTarget::Label(entry.label.clone())),
            None => MatchOutcome::Unmatched,
        }
    }

    /// Registry match, then the command's own UI elements.
    pub fn match_command(&self, command: &Command) -> MatchOutcome {
        match self.match_text(command.raw_text()) {
            MatchOutcome::Unmatched => find_element(command.raw_text(), command.ui_elements())
                .map(|index| MatchOutcome::Matched(SymbolicTarget::Element(index)))
                .unwrap_or(MatchOutcome::Unmatched),
            matched => matched,
        }
    }

    pub fn ordinal(&self) -> &OrdinalRule {
        &self.ordinal
    }
}

/// Index of the first element whose non-empty text occurs in `text`.
pub fn find_element(text: &str, elements: &[ElementDescriptor]) -> Option<usize> {
    elements.iter().position(|element| {
        let label = element.text.trim();
        !label.is_empty() && text.contains(label)
    })
}
