//! Static reference table of tracked lab parameters.

use std::str::FromStr;

use crate::models::{NormalRange, ParameterDefinition, ParameterKey};

#[allow(clippy::too_many_arguments)]
const fn def(
    key: ParameterKey,
    label: &'static str,
    unit: &'static str,
    description: &'static str,
    min: f64,
    max: f64,
    higher_is_better: bool,
    color: &'static str,
) -> ParameterDefinition {
    ParameterDefinition {
        key,
        label,
        unit,
        description,
        normal_range: NormalRange::new(min, max),
        higher_is_better,
        color,
    }
}

// Row order must follow `ParameterKey::ALL`; `lookup` indexes by position.
static PARAMETERS: [ParameterDefinition; 15] = [
    def(ParameterKey::Hba1c, "HbA1c", "%", "Glycated Hemoglobin", 4.0, 5.7, false, "#f97316"),
    def(ParameterKey::Glucose, "Fasting Glucose", "mg/dL", "Blood Sugar", 70.0, 100.0, false, "#eab308"),
    def(ParameterKey::Triglycerides, "Triglycerides", "mg/dL", "Blood Fats", 0.0, 150.0, false, "#ec4899"),
    def(ParameterKey::Hdl, "HDL Cholesterol", "mg/dL", "Good Cholesterol", 40.0, 200.0, true, "#22c55e"),
    def(ParameterKey::Ldl, "LDL Cholesterol", "mg/dL", "Bad Cholesterol", 0.0, 100.0, false, "#ef4444"),
    def(ParameterKey::TotalCholesterol, "Total Cholesterol", "mg/dL", "Total Cholesterol", 0.0, 200.0, false, "#a855f7"),
    def(ParameterKey::Hemoglobin, "Hemoglobin", "g/dL", "Oxygen Carrier", 12.0, 17.5, true, "#06b6d4"),
    def(ParameterKey::Creatinine, "Creatinine", "mg/dL", "Kidney Function", 0.6, 1.2, false, "#f59e0b"),
    def(ParameterKey::Tsh, "TSH", "mIU/L", "Thyroid Function", 0.4, 4.0, false, "#8b5cf6"),
    def(ParameterKey::VitaminD, "Vitamin D", "ng/mL", "Sunshine Vitamin", 30.0, 100.0, true, "#fbbf24"),
    def(ParameterKey::Wbc, "WBC", "K/μL", "White Blood Cells", 4.5, 11.0, false, "#38bdf8"),
    def(ParameterKey::Platelets, "Platelets", "K/μL", "Clotting Cells", 150.0, 400.0, false, "#fb923c"),
    def(ParameterKey::UricAcid, "Uric Acid", "mg/dL", "Gout Marker", 2.4, 6.0, false, "#e879f9"),
    def(ParameterKey::Alt, "ALT", "U/L", "Liver Enzyme", 7.0, 40.0, false, "#4ade80"),
    def(ParameterKey::Ast, "AST", "U/L", "Liver Enzyme", 10.0, 40.0, false, "#34d399"),
];

/// Definition for a key. Total over the closed key set.
pub fn lookup(key: ParameterKey) -> &'static ParameterDefinition {
    &PARAMETERS[key as usize]
}

/// Every definition, in display order.
pub fn all() -> &'static [ParameterDefinition] {
    &PARAMETERS
}

/// Resolve a string key at a trust boundary. Unknown keys yield `None`.
pub fn parse_key(raw: &str) -> Option<ParameterKey> {
    ParameterKey::from_str(raw).ok()
}
