//! Rule presets for common configurations.

use crate::{
    CollectionNextLink, EnumInsteadOfBoolean, OperationIdNounVerb, ProviderNamespacePascalCase,
    PutRequestResponseSchema, ResourceCollectionGetMissing, TrackedResourceDeleteOperation,
    TrackedResourcePatchOperation,
};
use armlint_core::RuleBox;
use std::fmt;
use std::str::FromStr;

/// Preset configurations for armlint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    /// Rules for ARM (management plane) specifications.
    #[default]
    Arm,
    /// Rules that also make sense for data-plane specifications.
    Dataplane,
    /// Every built-in rule.
    All,
}

impl Preset {
    /// Returns the rules for this preset.
    #[must_use]
    pub fn rules(self) -> Vec<RuleBox> {
        match self {
            Self::Arm => arm_rules(),
            Self::Dataplane => dataplane_rules(),
            Self::All => all_rules(),
        }
    }

    /// Preset name as used in configuration files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Arm => "arm",
            Self::Dataplane => "dataplane",
            Self::All => "all",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a preset name that is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown preset '{0}' (expected arm, dataplane or all)")]
pub struct UnknownPreset(pub String);

impl FromStr for Preset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "arm" | "recommended" => Ok(Self::Arm),
            "dataplane" | "data-plane" => Ok(Self::Dataplane),
            "all" => Ok(Self::All),
            _ => Err(UnknownPreset(s.to_string())),
        }
    }
}

/// Returns the ARM set of rules.
///
/// Includes every built-in rule with its default settings.
#[must_use]
pub fn arm_rules() -> Vec<RuleBox> {
    all_rules()
}

/// Returns the data-plane set of rules.
///
/// Includes:
/// - `operation-id-noun-verb` (R1001) - Requires `Noun_Verb` operation ids
/// - `enum-instead-of-boolean` (R2001) - Suggests enums over booleans
#[must_use]
pub fn dataplane_rules() -> Vec<RuleBox> {
    vec![
        Box::new(OperationIdNounVerb::new()),
        Box::new(EnumInsteadOfBoolean::new()),
    ]
}

/// Returns all available rules, ordered by code.
#[must_use]
pub fn all_rules() -> Vec<RuleBox> {
    vec![
        Box::new(OperationIdNounVerb::new()),
        Box::new(EnumInsteadOfBoolean::new()),
        Box::new(ProviderNamespacePascalCase::new()),
        Box::new(PutRequestResponseSchema::new()),
        Box::new(TrackedResourceDeleteOperation::new()),
        Box::new(TrackedResourcePatchOperation::new()),
        Box::new(ResourceCollectionGetMissing::new()),
        Box::new(CollectionNextLink::new()),
    ]
}
