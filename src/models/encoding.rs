//! Feature encoding manifest shipped alongside the ONNX artifact.
//!
//! The training pipeline exports, next to the model, a JSON description of
//! how each feature column maps onto the model's numeric input tensor. The
//! engine applies it verbatim so serving and training stay aligned.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::feature_extractor::{FeatureValue, FeatureVector};
use crate::models::engine::ModelError;

/// How one model input column is derived from the feature mapping.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FeatureKind {
    /// Numeric passthrough; null encodes to NaN.
    Numeric,
    /// One-hot over the known categories; null or an unknown category
    /// encodes to all zeros.
    Categorical { categories: Vec<String> },
    /// Index into the ordered categories; null encodes to NaN, an unknown
    /// value to -1.
    Ordinal { categories: Vec<String> },
}

/// One encoded feature column.
#[derive(Debug, Clone, Deserialize)]
pub struct EncodedFeature {
    pub name: String,
    #[serde(flatten)]
    pub kind: FeatureKind,
}

/// Ordered layout of the model input tensor.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureEncoding {
    pub features: Vec<EncodedFeature>,
}

impl FeatureEncoding {
    /// Parse the manifest from its JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| ModelError::Encoding(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| ModelError::Encoding(format!("{}: {e}", path.display())))
    }

    /// Width of the encoded input tensor.
    pub fn input_width(&self) -> usize {
        self.features
            .iter()
            .map(|f| match &f.kind {
                FeatureKind::Numeric | FeatureKind::Ordinal { .. } => 1,
                FeatureKind::Categorical { categories } => categories.len(),
            })
            .sum()
    }

    /// Encode one feature mapping into the model's flat input row.
    pub fn encode(&self, features: &FeatureVector) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.input_width());
        for feature in &self.features {
            let value = features.get(&feature.name).unwrap_or(&FeatureValue::Null);
            match &feature.kind {
                FeatureKind::Numeric => out.push(match value {
                    FeatureValue::Number(v) => *v as f32,
                    _ => f32::NAN,
                }),
                FeatureKind::Categorical { categories } => {
                    for category in categories {
                        let hit = matches!(value, FeatureValue::Text(v) if v == category);
                        out.push(if hit { 1.0 } else { 0.0 });
                    }
                }
                FeatureKind::Ordinal { categories } => out.push(match value {
                    FeatureValue::Text(v) => categories
                        .iter()
                        .position(|c| c == v)
                        .map(|i| i as f32)
                        .unwrap_or(-1.0),
                    FeatureValue::Number(v) => *v as f32,
                    FeatureValue::Null => f32::NAN,
                }),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::record::PredictRequest;
    use serde_json::json;

    fn encoding() -> FeatureEncoding {
        serde_json::from_value(json!({
            "features": [
                {"name": "age", "kind": "numeric"},
                {"name": "genre", "kind": "categorical", "categories": ["FEMME", "HOMME"]},
                {"name": "frequence_deplacement", "kind": "ordinal",
                 "categories": ["AUCUN", "OCCASIONNEL", "FREQUENT"]}
            ]
        }))
        .unwrap()
    }

    fn features(body: serde_json::Value) -> crate::feature_extractor::FeatureVector {
        let record = serde_json::from_value::<PredictRequest>(body)
            .unwrap()
            .validate()
            .unwrap();
        crate::feature_extractor::normalize(&record)
    }

    #[test]
    fn test_input_width() {
        assert_eq!(encoding().input_width(), 4);
    }

    #[test]
    fn test_encode_known_values() {
        let row = encoding().encode(&features(json!({
            "id_employee": 1,
            "age": 30.0,
            "genre": "homme",
            "frequence_deplacement": "frequent"
        })));
        assert_eq!(row, vec![30.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_encode_null_and_unknown() {
        let row = encoding().encode(&features(json!({
            "id_employee": 1,
            "genre": "autre",
            "frequence_deplacement": "inconnu"
        })));
        assert!(row[0].is_nan()); // age absent
        assert_eq!(&row[1..3], &[0.0, 0.0]); // unknown category drops out
        assert_eq!(row[3], -1.0); // unknown ordinal
    }
}
