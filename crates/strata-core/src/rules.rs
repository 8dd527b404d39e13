//! Rule settings and per-layer rule tables
//!
//! Rule identifiers are opaque strings; options payloads are opaque JSON
//! values. The core configures rules, it never interprets them.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StrataError;
use crate::result::Result;

/// Severity levels for a configured rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Disable the rule
    Off,
    /// Report without failing the run
    Warn,
    /// Report and fail the run
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Off => write!(f, "off"),
            Severity::Warn => write!(f, "warn"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// One rule's configured severity plus an optional options payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSetting {
    /// Severity for diagnostics produced by the rule
    pub severity: Severity,
    /// Rule-specific options, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<serde_json::Value>,
}

impl RuleSetting {
    /// Setting with a bare severity and no options
    pub fn severity(severity: Severity) -> Self {
        Self {
            severity,
            options: None,
        }
    }

    /// Setting with severity and an options payload
    pub fn with_options(severity: Severity, options: serde_json::Value) -> Self {
        Self {
            severity,
            options: Some(options),
        }
    }
}

/// One layer's contribution: rule identifier to configured setting
///
/// The inner map is private so a table can only be built through
/// [`RuleTable::from_entries`] or [`RuleTable::insert`], both of which
/// reject a duplicate rule identifier within the same table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTable {
    settings: HashMap<String, RuleSetting>,
}

impl RuleTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(rule id, setting)` entries
    ///
    /// Fails with [`StrataError::DuplicateRuleKey`] if the same rule
    /// identifier appears twice. `position` is the declaring layer's
    /// position, used only for error reporting.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (String, RuleSetting)>,
        position: usize,
    ) -> Result<Self> {
        let mut table = Self::new();
        for (rule_id, setting) in entries {
            table.insert_at(rule_id, setting, position)?;
        }
        Ok(table)
    }

    /// Insert a setting, rejecting a rule identifier already present
    pub fn insert(&mut self, rule_id: impl Into<String>, setting: RuleSetting) -> Result<()> {
        self.insert_at(rule_id.into(), setting, 0)
    }

    fn insert_at(&mut self, rule_id: String, setting: RuleSetting, position: usize) -> Result<()> {
        if self.settings.contains_key(&rule_id) {
            return Err(StrataError::DuplicateRuleKey { rule_id, position });
        }
        self.settings.insert(rule_id, setting);
        Ok(())
    }

    /// Look up the setting for a rule identifier
    pub fn get(&self, rule_id: &str) -> Option<&RuleSetting> {
        self.settings.get(rule_id)
    }

    /// Number of configured rules
    pub fn len(&self) -> usize {
        self.settings.len()
    }

    /// Whether the table configures no rules
    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    /// Iterate over `(rule id, setting)` pairs (iteration order is not
    /// semantic)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleSetting)> {
        self.settings.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Write every setting from `other` into `self`, overwriting existing
    /// identifiers (later layer wins)
    pub(crate) fn apply(&mut self, other: &RuleTable) {
        for (rule_id, setting) in &other.settings {
            self.settings.insert(rule_id.clone(), setting.clone());
        }
    }
}
