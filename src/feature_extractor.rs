//! Feature normalization for attrition model inference.
//!
//! This module builds the fixed, ordered feature mapping the classifier
//! consumes, from either a validated client record or a stored features row.
//! The transform matches the preprocessing used during model training.

use serde_json::{Map, Value};

use crate::store::employees::EmployeeFeatures;
use crate::store::jsonable::json_number;
use crate::types::record::{normalize_text, yes_no_canonical, CanonicalRecord};

/// Feature names in the exact order expected by the classifier.
pub const EXPECTED_COLS: [&str; 26] = [
    "frequence_deplacement",
    "genre",
    "statut_marital",
    "departement",
    "poste",
    "heure_supplementaires",
    "domaine_etude",
    "age",
    "nombre_experiences_precedentes",
    "annees_dans_le_poste_actuel",
    "satisfaction_employee_environnement",
    "note_evaluation_precedente",
    "niveau_hierarchique_poste",
    "satisfaction_employee_nature_travail",
    "satisfaction_employee_equipe",
    "satisfaction_employee_equilibre_pro_perso",
    "note_evaluation_actuelle",
    "augementation_salaire_precedente",
    "nombre_participation_pee",
    "nb_formations_suivies",
    "distance_domicile_travail",
    "niveau_education",
    "annees_depuis_la_derniere_promotion",
    "annes_sous_responsable_actuel",
    "anciennete_log",
    "annee_experience_totale_log",
];

/// One feature value: text for nominal/ordinal columns, numeric otherwise.
/// Absent values are carried explicitly, never omitted.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Null,
    Number(f64),
    Text(String),
}

impl FeatureValue {
    fn number(value: Option<f64>) -> Self {
        match value {
            Some(v) => FeatureValue::Number(v),
            None => FeatureValue::Null,
        }
    }

    fn text(value: Option<&str>) -> Self {
        match value {
            Some(v) => FeatureValue::Text(v.to_string()),
            None => FeatureValue::Null,
        }
    }
}

/// The ordered feature mapping consumed by the classifier.
///
/// Values align index-for-index with [`EXPECTED_COLS`]; the set of keys is
/// always the same 26 names.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<FeatureValue>,
}

impl FeatureVector {
    /// Value for a feature name, if the name is one of [`EXPECTED_COLS`].
    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        let idx = EXPECTED_COLS.iter().position(|c| *c == name)?;
        self.values.get(idx)
    }

    /// Values in [`EXPECTED_COLS`] order.
    pub fn values(&self) -> &[FeatureValue] {
        &self.values
    }

    /// Number of features produced.
    pub fn feature_count(&self) -> usize {
        self.values.len()
    }

    /// JSON object keyed by [`EXPECTED_COLS`], with explicit nulls.
    pub fn to_json(&self) -> Value {
        let mut map = Map::with_capacity(EXPECTED_COLS.len());
        for (name, value) in EXPECTED_COLS.iter().zip(&self.values) {
            let json = match value {
                FeatureValue::Null => Value::Null,
                FeatureValue::Number(v) => json_number(*v),
                FeatureValue::Text(v) => Value::String(v.clone()),
            };
            map.insert((*name).to_string(), json);
        }
        Value::Object(map)
    }
}

/// Natural log of a source value, defined only when strictly positive.
fn log_feature(source: Option<f64>) -> FeatureValue {
    match source {
        Some(v) if v > 0.0 => FeatureValue::Number(v.ln()),
        _ => FeatureValue::Null,
    }
}

/// Build the model input from a validated client record.
///
/// Derives `anciennete_log` and `annee_experience_totale_log` from the two
/// tenure sources and projects onto [`EXPECTED_COLS`]; the raw sources
/// themselves are dropped from the model input. Deterministic: identical
/// input always yields identical output.
pub fn normalize(record: &CanonicalRecord) -> FeatureVector {
    let values = vec![
        FeatureValue::text(record.frequence_deplacement.as_deref()),
        FeatureValue::text(record.genre.as_deref()),
        FeatureValue::text(record.statut_marital.as_deref()),
        FeatureValue::text(record.departement.as_deref()),
        FeatureValue::text(record.poste.as_deref()),
        FeatureValue::text(record.heure_supplementaires.as_deref()),
        FeatureValue::text(record.domaine_etude.as_deref()),
        FeatureValue::number(record.age),
        FeatureValue::number(record.nombre_experiences_precedentes),
        FeatureValue::number(record.annees_dans_le_poste_actuel),
        FeatureValue::number(record.satisfaction_employee_environnement),
        FeatureValue::number(record.note_evaluation_precedente),
        FeatureValue::number(record.niveau_hierarchique_poste),
        FeatureValue::number(record.satisfaction_employee_nature_travail),
        FeatureValue::number(record.satisfaction_employee_equipe),
        FeatureValue::number(record.satisfaction_employee_equilibre_pro_perso),
        FeatureValue::number(record.note_evaluation_actuelle),
        FeatureValue::number(record.augementation_salaire_precedente),
        FeatureValue::number(record.nombre_participation_pee),
        FeatureValue::number(record.nb_formations_suivies),
        FeatureValue::number(record.distance_domicile_travail),
        FeatureValue::number(record.niveau_education),
        FeatureValue::number(record.annees_depuis_la_derniere_promotion),
        FeatureValue::number(record.annes_sous_responsable_actuel),
        log_feature(record.annees_dans_l_entreprise),
        log_feature(record.annee_experience_totale),
    ];
    FeatureVector { values }
}

/// Normalize a stored text column the way client input is normalized.
fn stored_text(value: &Option<String>) -> FeatureValue {
    FeatureValue::text(normalize_text(value.clone()).as_deref())
}

/// Normalize a stored overtime flag. Recognized synonyms map onto OUI/NON;
/// other stored values pass through unchanged (the mart owns its contents).
fn stored_yes_no(value: &Option<String>) -> FeatureValue {
    match normalize_text(value.clone()) {
        None => FeatureValue::Null,
        Some(s) => match yes_no_canonical(&s) {
            Some(canonical) => FeatureValue::Text(canonical.to_string()),
            None => FeatureValue::Text(s),
        },
    }
}

/// Build the model input from a stored features row.
///
/// The same upper-casing, trimming and yes/no rules apply as for client
/// input; the log features are read from the mart row where the loading
/// pipeline precomputed them.
pub fn from_stored(row: &EmployeeFeatures) -> FeatureVector {
    let values = vec![
        stored_text(&row.frequence_deplacement),
        stored_text(&row.genre),
        stored_text(&row.statut_marital),
        stored_text(&row.departement),
        stored_text(&row.poste),
        stored_yes_no(&row.heure_supplementaires),
        stored_text(&row.domaine_etude),
        FeatureValue::number(row.age),
        FeatureValue::number(row.nombre_experiences_precedentes),
        FeatureValue::number(row.annees_dans_le_poste_actuel),
        FeatureValue::number(row.satisfaction_employee_environnement),
        FeatureValue::number(row.note_evaluation_precedente),
        FeatureValue::number(row.niveau_hierarchique_poste),
        FeatureValue::number(row.satisfaction_employee_nature_travail),
        FeatureValue::number(row.satisfaction_employee_equipe),
        FeatureValue::number(row.satisfaction_employee_equilibre_pro_perso),
        FeatureValue::number(row.note_evaluation_actuelle),
        FeatureValue::number(row.augementation_salaire_precedente),
        FeatureValue::number(row.nombre_participation_pee),
        FeatureValue::number(row.nb_formations_suivies),
        FeatureValue::number(row.distance_domicile_travail),
        FeatureValue::number(row.niveau_education),
        FeatureValue::number(row.annees_depuis_la_derniere_promotion),
        FeatureValue::number(row.annes_sous_responsable_actuel),
        FeatureValue::number(row.anciennete_log),
        FeatureValue::number(row.annee_experience_totale_log),
    ];
    FeatureVector { values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::record::PredictRequest;
    use serde_json::json;

    fn record(body: serde_json::Value) -> CanonicalRecord {
        serde_json::from_value::<PredictRequest>(body)
            .unwrap()
            .validate()
            .unwrap()
    }

    #[test]
    fn test_fixed_key_set() {
        let features = normalize(&record(json!({"id_employee": 1})));
        assert_eq!(features.feature_count(), EXPECTED_COLS.len());

        let json = features.to_json();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 26);
        for name in EXPECTED_COLS {
            assert!(obj.contains_key(name), "missing key {name}");
        }
        // derivation sources are dropped from the model input
        assert!(!obj.contains_key("annees_dans_l_entreprise"));
        assert!(!obj.contains_key("annee_experience_totale"));
    }

    #[test]
    fn test_log_derivation() {
        let features = normalize(&record(
            json!({"id_employee": 1, "annees_dans_l_entreprise": 5.0}),
        ));
        match features.get("anciennete_log").unwrap() {
            FeatureValue::Number(v) => assert!((v - 1.6094).abs() < 1e-4),
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn test_log_derivation_null_cases() {
        for body in [
            json!({"id_employee": 1}),
            json!({"id_employee": 1, "annees_dans_l_entreprise": 0.0}),
        ] {
            let features = normalize(&record(body));
            assert_eq!(features.get("anciennete_log"), Some(&FeatureValue::Null));
            assert_eq!(
                features.get("annee_experience_totale_log"),
                Some(&FeatureValue::Null)
            );
        }
    }

    #[test]
    fn test_determinism() {
        let body = json!({"id_employee": 1, "age": 42.0, "genre": "homme", "annee_experience_totale": 12.0});
        let a = normalize(&record(body.clone()));
        let b = normalize(&record(body));
        assert_eq!(a, b);
    }

    #[test]
    fn test_from_stored_applies_text_rules() {
        let mut row = EmployeeFeatures::empty(9);
        row.genre = Some(" femme ".to_string());
        row.heure_supplementaires = Some("yes".to_string());
        row.poste = Some("   ".to_string());
        row.age = Some(31.0);
        row.anciennete_log = Some(1.5);

        let features = from_stored(&row);
        assert_eq!(
            features.get("genre"),
            Some(&FeatureValue::Text("FEMME".to_string()))
        );
        assert_eq!(
            features.get("heure_supplementaires"),
            Some(&FeatureValue::Text("OUI".to_string()))
        );
        assert_eq!(features.get("poste"), Some(&FeatureValue::Null));
        assert_eq!(features.get("age"), Some(&FeatureValue::Number(31.0)));
        assert_eq!(
            features.get("anciennete_log"),
            Some(&FeatureValue::Number(1.5))
        );
    }

    #[test]
    fn test_from_stored_keeps_unrecognized_overtime() {
        let mut row = EmployeeFeatures::empty(9);
        row.heure_supplementaires = Some("parfois".to_string());
        let features = from_stored(&row);
        assert_eq!(
            features.get("heure_supplementaires"),
            Some(&FeatureValue::Text("PARFOIS".to_string()))
        );
    }
}
