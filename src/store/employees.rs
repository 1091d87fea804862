//! Read-only access to the employee features mart.
//!
//! The table is populated by an external loading pipeline; this service
//! only ever reads it.

use rusqlite::{params, OptionalExtension, Row};

use crate::store::{Database, StoreError};

/// One stored employee features row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeFeatures {
    pub id_employee: i64,
    pub a_quitte_l_entreprise: Option<String>,
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
    pub anciennete_log: Option<f64>,
    pub annee_experience_totale_log: Option<f64>,
    pub genre: Option<String>,
    pub statut_marital: Option<String>,
    pub departement: Option<String>,
    pub poste: Option<String>,
    pub heure_supplementaires: Option<String>,
    pub domaine_etude: Option<String>,
    pub frequence_deplacement: Option<String>,
}

const COLUMNS: &str = "id_employee, a_quitte_l_entreprise, age, \
    nombre_experiences_precedentes, annees_dans_le_poste_actuel, \
    satisfaction_employee_environnement, note_evaluation_precedente, \
    niveau_hierarchique_poste, satisfaction_employee_nature_travail, \
    satisfaction_employee_equipe, satisfaction_employee_equilibre_pro_perso, \
    note_evaluation_actuelle, augementation_salaire_precedente, \
    nombre_participation_pee, nb_formations_suivies, \
    distance_domicile_travail, niveau_education, \
    annees_depuis_la_derniere_promotion, annes_sous_responsable_actuel, \
    anciennete_log, annee_experience_totale_log, genre, statut_marital, \
    departement, poste, heure_supplementaires, domaine_etude, \
    frequence_deplacement";

fn from_row(row: &Row<'_>) -> rusqlite::Result<EmployeeFeatures> {
    Ok(EmployeeFeatures {
        id_employee: row.get(0)?,
        a_quitte_l_entreprise: row.get(1)?,
        age: row.get(2)?,
        nombre_experiences_precedentes: row.get(3)?,
        annees_dans_le_poste_actuel: row.get(4)?,
        satisfaction_employee_environnement: row.get(5)?,
        note_evaluation_precedente: row.get(6)?,
        niveau_hierarchique_poste: row.get(7)?,
        satisfaction_employee_nature_travail: row.get(8)?,
        satisfaction_employee_equipe: row.get(9)?,
        satisfaction_employee_equilibre_pro_perso: row.get(10)?,
        note_evaluation_actuelle: row.get(11)?,
        augementation_salaire_precedente: row.get(12)?,
        nombre_participation_pee: row.get(13)?,
        nb_formations_suivies: row.get(14)?,
        distance_domicile_travail: row.get(15)?,
        niveau_education: row.get(16)?,
        annees_depuis_la_derniere_promotion: row.get(17)?,
        annes_sous_responsable_actuel: row.get(18)?,
        anciennete_log: row.get(19)?,
        annee_experience_totale_log: row.get(20)?,
        genre: row.get(21)?,
        statut_marital: row.get(22)?,
        departement: row.get(23)?,
        poste: row.get(24)?,
        heure_supplementaires: row.get(25)?,
        domaine_etude: row.get(26)?,
        frequence_deplacement: row.get(27)?,
    })
}

impl Database {
    /// Fetch one employee's stored features, if a row exists.
    pub fn employee_features(
        &self,
        id_employee: i64,
    ) -> Result<Option<EmployeeFeatures>, StoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM employee_features WHERE id_employee = ?1"),
                params![id_employee],
                from_row,
            )
            .optional()?;
        Ok(row)
    }
}

impl EmployeeFeatures {
    /// Empty fixture row, used by tests.
    #[cfg(test)]
    pub(crate) fn empty(id_employee: i64) -> Self {
        Self {
            id_employee,
            ..Self::default()
        }
    }
}

#[cfg(test)]
pub(crate) fn insert_fixture(db: &Database, row: &EmployeeFeatures) {
    let conn = db.lock().unwrap();
    conn.execute(
        &format!(
            "INSERT INTO employee_features ({COLUMNS}) VALUES \
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, \
              ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28)"
        ),
        params![
            row.id_employee,
            row.a_quitte_l_entreprise,
            row.age,
            row.nombre_experiences_precedentes,
            row.annees_dans_le_poste_actuel,
            row.satisfaction_employee_environnement,
            row.note_evaluation_precedente,
            row.niveau_hierarchique_poste,
            row.satisfaction_employee_nature_travail,
            row.satisfaction_employee_equipe,
            row.satisfaction_employee_equilibre_pro_perso,
            row.note_evaluation_actuelle,
            row.augementation_salaire_precedente,
            row.nombre_participation_pee,
            row.nb_formations_suivies,
            row.distance_domicile_travail,
            row.niveau_education,
            row.annees_depuis_la_derniere_promotion,
            row.annes_sous_responsable_actuel,
            row.anciennete_log,
            row.annee_experience_totale_log,
            row.genre,
            row.statut_marital,
            row.departement,
            row.poste,
            row.heure_supplementaires,
            row.domaine_etude,
            row.frequence_deplacement,
        ],
    )
    .unwrap();
}
