//! Inbound prediction request schema and its validated canonical form.

use serde::Deserialize;
use thiserror::Error;

/// Validation failure on a prediction request, surfaced with field-level
/// detail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("id_employee doit être un entier positif")]
    NonPositiveId,
    #[error("{field} ne peut pas être négatif")]
    Negative { field: &'static str },
    #[error("heure_supplementaires doit être OUI ou NON")]
    InvalidYesNo,
    #[error("augementation_salaire_precedente doit être un nombre ou un pourcentage")]
    InvalidPercentage,
}

/// Percentage-like input: a bare number, or a string such as `"5%"` or
/// `" 2,5 % "` (comma accepted as decimal separator).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PctInput {
    Number(f64),
    Text(String),
}

/// Raw prediction request as posted by the client.
///
/// The schema is closed: unknown fields are rejected so a typo in the JSON
/// surfaces as a validation error instead of a silently dropped feature.
/// `id_employee` must be a JSON integer; floats and numeric strings are
/// rejected at deserialization.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PredictRequest {
    /// Employee identifier (strict integer).
    pub id_employee: i64,

    // Numeric features
    pub age: Option<f64>,
    pub nombre_experiences_precedentes: Option<f64>,
    pub annees_dans_le_poste_actuel: Option<f64>,
    pub satisfaction_employee_environnement: Option<f64>,
    pub note_evaluation_precedente: Option<f64>,
    pub niveau_hierarchique_poste: Option<f64>,
    pub satisfaction_employee_nature_travail: Option<f64>,
    pub satisfaction_employee_equipe: Option<f64>,
    pub satisfaction_employee_equilibre_pro_perso: Option<f64>,
    pub note_evaluation_actuelle: Option<f64>,
    pub augementation_salaire_precedente: Option<PctInput>,
    pub nombre_participation_pee: Option<f64>,
    pub nb_formations_suivies: Option<f64>,
    pub distance_domicile_travail: Option<f64>,
    pub niveau_education: Option<f64>,
    pub annees_depuis_la_derniere_promotion: Option<f64>,
    pub annes_sous_responsable_actuel: Option<f64>,

    // Sources for the derived log features; never part of the model input.
    pub annees_dans_l_entreprise: Option<f64>,
    pub annee_experience_totale: Option<f64>,

    // Nominal free-text features
    pub genre: Option<String>,
    pub statut_marital: Option<String>,
    pub departement: Option<String>,
    pub poste: Option<String>,
    pub heure_supplementaires: Option<String>,
    pub domaine_etude: Option<String>,

    // Ordinal feature
    pub frequence_deplacement: Option<String>,
}

/// Validated, normalized representation of one employee's input features.
///
/// Text is trimmed and upper-cased, blanks are collapsed to `None`, the
/// overtime flag is canonicalized to `OUI`/`NON`, and every numeric value is
/// known to be non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    pub id_employee: i64,

    pub age: Option<f64>,
    pub nombre_experiences_precedentes: Option<f64>,
    pub annees_dans_le_poste_actuel: Option<f64>,
    pub satisfaction_employee_environnement: Option<f64>,
    pub note_evaluation_precedente: Option<f64>,
    pub niveau_hierarchique_poste: Option<f64>,
    pub satisfaction_employee_nature_travail: Option<f64>,
    pub satisfaction_employee_equipe: Option<f64>,
    pub satisfaction_employee_equilibre_pro_perso: Option<f64>,
    pub note_evaluation_actuelle: Option<f64>,
    pub augementation_salaire_precedente: Option<f64>,
    pub nombre_participation_pee: Option<f64>,
    pub nb_formations_suivies: Option<f64>,
    pub distance_domicile_travail: Option<f64>,
    pub niveau_education: Option<f64>,
    pub annees_depuis_la_derniere_promotion: Option<f64>,
    pub annes_sous_responsable_actuel: Option<f64>,

    pub annees_dans_l_entreprise: Option<f64>,
    pub annee_experience_totale: Option<f64>,

    pub genre: Option<String>,
    pub statut_marital: Option<String>,
    pub departement: Option<String>,
    pub poste: Option<String>,
    pub heure_supplementaires: Option<String>,
    pub domaine_etude: Option<String>,

    pub frequence_deplacement: Option<String>,
}

impl PredictRequest {
    /// Validate and normalize into a canonical record.
    pub fn validate(self) -> Result<CanonicalRecord, ValidationError> {
        if self.id_employee < 1 {
            return Err(ValidationError::NonPositiveId);
        }

        let augementation_salaire_precedente = match self.augementation_salaire_precedente {
            None => None,
            Some(PctInput::Number(n)) => Some(n),
            Some(PctInput::Text(s)) => parse_percentage(&s)?,
        };

        let record = CanonicalRecord {
            id_employee: self.id_employee,
            age: self.age,
            nombre_experiences_precedentes: self.nombre_experiences_precedentes,
            annees_dans_le_poste_actuel: self.annees_dans_le_poste_actuel,
            satisfaction_employee_environnement: self.satisfaction_employee_environnement,
            note_evaluation_precedente: self.note_evaluation_precedente,
            niveau_hierarchique_poste: self.niveau_hierarchique_poste,
            satisfaction_employee_nature_travail: self.satisfaction_employee_nature_travail,
            satisfaction_employee_equipe: self.satisfaction_employee_equipe,
            satisfaction_employee_equilibre_pro_perso: self.satisfaction_employee_equilibre_pro_perso,
            note_evaluation_actuelle: self.note_evaluation_actuelle,
            augementation_salaire_precedente,
            nombre_participation_pee: self.nombre_participation_pee,
            nb_formations_suivies: self.nb_formations_suivies,
            distance_domicile_travail: self.distance_domicile_travail,
            niveau_education: self.niveau_education,
            annees_depuis_la_derniere_promotion: self.annees_depuis_la_derniere_promotion,
            annes_sous_responsable_actuel: self.annes_sous_responsable_actuel,
            annees_dans_l_entreprise: self.annees_dans_l_entreprise,
            annee_experience_totale: self.annee_experience_totale,
            genre: normalize_text(self.genre),
            statut_marital: normalize_text(self.statut_marital),
            departement: normalize_text(self.departement),
            poste: normalize_text(self.poste),
            heure_supplementaires: normalize_yes_no(self.heure_supplementaires)?,
            domaine_etude: normalize_text(self.domaine_etude),
            frequence_deplacement: normalize_text(self.frequence_deplacement),
        };

        record.check_non_negative()?;
        Ok(record)
    }
}

impl CanonicalRecord {
    /// All numeric fields, including the two derivation sources, paired with
    /// their names for error reporting.
    pub(crate) fn numeric_fields(&self) -> [(&'static str, Option<f64>); 19] {
        [
            ("age", self.age),
            (
                "nombre_experiences_precedentes",
                self.nombre_experiences_precedentes,
            ),
            (
                "annees_dans_le_poste_actuel",
                self.annees_dans_le_poste_actuel,
            ),
            (
                "satisfaction_employee_environnement",
                self.satisfaction_employee_environnement,
            ),
            ("note_evaluation_precedente", self.note_evaluation_precedente),
            ("niveau_hierarchique_poste", self.niveau_hierarchique_poste),
            (
                "satisfaction_employee_nature_travail",
                self.satisfaction_employee_nature_travail,
            ),
            ("satisfaction_employee_equipe", self.satisfaction_employee_equipe),
            (
                "satisfaction_employee_equilibre_pro_perso",
                self.satisfaction_employee_equilibre_pro_perso,
            ),
            ("note_evaluation_actuelle", self.note_evaluation_actuelle),
            (
                "augementation_salaire_precedente",
                self.augementation_salaire_precedente,
            ),
            ("nombre_participation_pee", self.nombre_participation_pee),
            ("nb_formations_suivies", self.nb_formations_suivies),
            ("distance_domicile_travail", self.distance_domicile_travail),
            ("niveau_education", self.niveau_education),
            (
                "annees_depuis_la_derniere_promotion",
                self.annees_depuis_la_derniere_promotion,
            ),
            (
                "annes_sous_responsable_actuel",
                self.annes_sous_responsable_actuel,
            ),
            ("annees_dans_l_entreprise", self.annees_dans_l_entreprise),
            ("annee_experience_totale", self.annee_experience_totale),
        ]
    }

    fn check_non_negative(&self) -> Result<(), ValidationError> {
        for (field, value) in self.numeric_fields() {
            if let Some(v) = value {
                if v < 0.0 {
                    return Err(ValidationError::Negative { field });
                }
            }
        }
        Ok(())
    }
}

/// Trim and upper-case a free-text value; a blank result collapses to `None`.
pub(crate) fn normalize_text(value: Option<String>) -> Option<String> {
    let s = value?.trim().to_uppercase();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Canonical OUI/NON for a recognized yes/no synonym (already upper-cased).
pub(crate) fn yes_no_canonical(value: &str) -> Option<&'static str> {
    match value {
        "OUI" | "YES" | "Y" | "1" | "TRUE" => Some("OUI"),
        "NON" | "NO" | "N" | "0" | "FALSE" => Some("NON"),
        _ => None,
    }
}

/// Strict yes/no normalization for client input: blank collapses to `None`,
/// an unrecognized value is a validation error.
pub(crate) fn normalize_yes_no(
    value: Option<String>,
) -> Result<Option<String>, ValidationError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let s = raw.trim().to_uppercase();
    if s.is_empty() {
        return Ok(None);
    }
    match yes_no_canonical(&s) {
        Some(canonical) => Ok(Some(canonical.to_string())),
        None => Err(ValidationError::InvalidYesNo),
    }
}

fn parse_percentage(raw: &str) -> Result<Option<f64>, ValidationError> {
    let cleaned = raw.trim().replace('%', "").replace(',', ".");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Ok(None);
    }
    cleaned
        .parse::<f64>()
        .map(Some)
        .map_err(|_| ValidationError::InvalidPercentage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: serde_json::Value) -> serde_json::Result<PredictRequest> {
        serde_json::from_value(body)
    }

    #[test]
    fn test_unknown_field_forbidden() {
        let result = request(json!({"id_employee": 1, "unknown_feature": 123}));
        assert!(result.is_err());
    }

    #[test]
    fn test_id_employee_must_be_strict_integer() {
        assert!(request(json!({"id_employee": 1.5})).is_err());
        assert!(request(json!({"id_employee": "1"})).is_err());
        assert!(request(json!({})).is_err());
        assert!(request(json!({"id_employee": 1})).is_ok());
    }

    #[test]
    fn test_id_employee_must_be_positive() {
        let result = request(json!({"id_employee": 0})).unwrap().validate();
        assert_eq!(result.unwrap_err(), ValidationError::NonPositiveId);
    }

    #[test]
    fn test_heure_supplementaires_normalization() {
        let record = request(json!({"id_employee": 1, "heure_supplementaires": "yes"}))
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(record.heure_supplementaires.as_deref(), Some("OUI"));

        let record = request(json!({"id_employee": 1, "heure_supplementaires": "No"}))
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(record.heure_supplementaires.as_deref(), Some("NON"));
    }

    #[test]
    fn test_heure_supplementaires_rejects_unrecognized() {
        let result = request(json!({"id_employee": 1, "heure_supplementaires": "maybe"}))
            .unwrap()
            .validate();
        assert_eq!(result.unwrap_err(), ValidationError::InvalidYesNo);
    }

    #[test]
    fn test_heure_supplementaires_blank_is_null() {
        let record = request(json!({"id_employee": 1, "heure_supplementaires": "  "}))
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(record.heure_supplementaires, None);
    }

    #[test]
    fn test_categorical_uppercased_and_blank_to_none() {
        let record = request(json!({"id_employee": 1, "genre": "femme", "departement": " data "}))
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(record.genre.as_deref(), Some("FEMME"));
        assert_eq!(record.departement.as_deref(), Some("DATA"));

        let record = request(json!({"id_employee": 1, "genre": "   "}))
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(record.genre, None);
    }

    #[test]
    fn test_percentage_coercion() {
        let record = request(json!({"id_employee": 1, "augementation_salaire_precedente": "5%"}))
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(record.augementation_salaire_precedente, Some(5.0));

        let record =
            request(json!({"id_employee": 1, "augementation_salaire_precedente": " 2,5 % "}))
                .unwrap()
                .validate()
                .unwrap();
        assert_eq!(record.augementation_salaire_precedente, Some(2.5));

        let record = request(json!({"id_employee": 1, "augementation_salaire_precedente": 3.0}))
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(record.augementation_salaire_precedente, Some(3.0));

        let record = request(json!({"id_employee": 1, "augementation_salaire_precedente": ""}))
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(record.augementation_salaire_precedente, None);
    }

    #[test]
    fn test_percentage_rejects_garbage() {
        let result =
            request(json!({"id_employee": 1, "augementation_salaire_precedente": "beaucoup"}))
                .unwrap()
                .validate();
        assert_eq!(result.unwrap_err(), ValidationError::InvalidPercentage);
    }

    #[test]
    fn test_numeric_non_negative() {
        for field in [
            "age",
            "nombre_experiences_precedentes",
            "annees_dans_le_poste_actuel",
            "satisfaction_employee_environnement",
            "annees_dans_l_entreprise",
        ] {
            let result = request(json!({"id_employee": 1, field: -1.0}))
                .unwrap()
                .validate();
            match result {
                Err(ValidationError::Negative { field: named }) => assert_eq!(named, field),
                other => panic!("expected Negative error for {field}, got {other:?}"),
            }
        }

        let record = request(json!({"id_employee": 1, "age": 30.0}))
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(record.age, Some(30.0));
    }
}
