//! Rule presets for common configurations.

use std::fmt;
use std::str::FromStr;

use guidelint_core::{Rule, RuleLoadError, Severity};

/// Preset configurations for guidelint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Preset {
    /// The full rule table at its default severities.
    #[default]
    Recommended,
    /// Every SHOULD rule escalated to MUST.
    Strict,
    /// MUST rules only, for gradual adoption.
    Minimal,
}

impl Preset {
    /// All presets.
    pub const ALL: [Self; 3] = [Self::Recommended, Self::Strict, Self::Minimal];

    /// Parses a preset name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`RuleLoadError::UnknownPreset`] for any other name.
    pub fn parse(name: &str) -> Result<Self, RuleLoadError> {
        match name.to_ascii_lowercase().as_str() {
            "recommended" => Ok(Self::Recommended),
            "strict" => Ok(Self::Strict),
            "minimal" => Ok(Self::Minimal),
            _ => Err(RuleLoadError::UnknownPreset {
                name: name.to_string(),
            }),
        }
    }

    /// Returns the preset's name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Recommended => "recommended",
            Self::Strict => "strict",
            Self::Minimal => "minimal",
        }
    }

    /// Whether the preset keeps a rule at its default severity.
    #[must_use]
    pub fn includes(self, rule: &Rule) -> bool {
        match self {
            Self::Recommended | Self::Strict => true,
            Self::Minimal => rule.severity == Severity::Must,
        }
    }

    /// Applies the preset to a rule's default severity.
    #[must_use]
    pub fn adjust(self, severity: Severity) -> Severity {
        match (self, severity) {
            (Self::Strict, Severity::Should) => Severity::Must,
            (_, severity) => severity,
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = RuleLoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
