use serde::Serialize;

use super::enums::ParameterKey;

/// Clinically normal bounds for a lab parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalRange {
    pub min: f64,
    /// For higher-is-better markers this is a display ceiling only.
    pub max: f64,
}

impl NormalRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Static description of one tracked lab marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDefinition {
    pub key: ParameterKey,
    pub label: &'static str,
    pub unit: &'static str,
    pub description: &'static str,
    pub normal_range: NormalRange,
    pub higher_is_better: bool,
    pub color: &'static str,
}
