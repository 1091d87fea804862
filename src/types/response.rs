//! Outbound API payloads.

use serde::{Deserialize, Serialize};

/// Textual attrition label returned to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttritionLabel {
    #[serde(rename = "OUI")]
    Oui,
    #[serde(rename = "NON")]
    Non,
}

impl AttritionLabel {
    /// Map the classifier's binary label onto the textual pair.
    pub fn from_positive(label: u8) -> Self {
        if label == 1 {
            AttritionLabel::Oui
        } else {
            AttritionLabel::Non
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttritionLabel::Oui => "OUI",
            AttritionLabel::Non => "NON",
        }
    }
}

/// Response returned by both prediction endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub employee_id: Option<i64>,
    /// `OUI` when the model predicts the employee will leave.
    pub pred_quitte_entreprise: AttritionLabel,
}

/// View over the latest stored prediction log row for one employee.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionLogView {
    pub employee_id: i64,
    pub payload: serde_json::Value,
    pub pred_quitte_entreprise: Option<String>,
}
