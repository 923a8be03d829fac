//! Reference tables keyed by disease name.
//!
//! Each table is a typed, read-only sequence of rows. Lookups are exact
//! string matches on the disease column; no trimming or case folding is
//! applied to the key.

use serde::Deserialize;

use super::{DiseaseCatalog, PredictionResult, NO_DESCRIPTION};

/// Maximum number of precautions a row carries.
pub const MAX_PRECAUTIONS: usize = 4;

/// Row of `description.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DescriptionRow {
    #[serde(rename = "Disease")]
    pub disease: String,
    #[serde(rename = "Description")]
    pub description: String,
}

/// Row of `precautions_df.csv`. Empty cells deserialize to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PrecautionRow {
    #[serde(rename = "Disease")]
    pub disease: String,
    #[serde(rename = "Precaution_1")]
    pub precaution_1: Option<String>,
    #[serde(rename = "Precaution_2")]
    pub precaution_2: Option<String>,
    #[serde(rename = "Precaution_3")]
    pub precaution_3: Option<String>,
    #[serde(rename = "Precaution_4")]
    pub precaution_4: Option<String>,
}

impl PrecautionRow {
    /// Non-blank precautions, trimmed, in column order.
    #[must_use]
    pub fn precautions(&self) -> Vec<String> {
        [
            &self.precaution_1,
            &self.precaution_2,
            &self.precaution_3,
            &self.precaution_4,
        ]
        .into_iter()
        .filter_map(|p| clean_cell(p.as_deref()))
        .take(MAX_PRECAUTIONS)
        .collect()
    }
}

/// Row of `medications.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MedicationRow {
    #[serde(rename = "Disease")]
    pub disease: String,
    #[serde(rename = "Medication")]
    pub medication: String,
}

/// Row of `diets.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DietRow {
    #[serde(rename = "Disease")]
    pub disease: String,
    #[serde(rename = "Diet")]
    pub diet: String,
}

/// Row of `workout_df.csv` (this file uses lower-case headers).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkoutRow {
    pub disease: String,
    pub workout: String,
}

/// Row of `symtoms_df.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SymptomRow {
    #[serde(rename = "Disease")]
    pub disease: String,
    #[serde(rename = "Symptom_1")]
    pub symptom_1: Option<String>,
    #[serde(rename = "Symptom_2")]
    pub symptom_2: Option<String>,
    #[serde(rename = "Symptom_3")]
    pub symptom_3: Option<String>,
    #[serde(rename = "Symptom_4")]
    pub symptom_4: Option<String>,
}

impl SymptomRow {
    /// Non-blank symptoms, trimmed, in column order.
    #[must_use]
    pub fn symptoms(&self) -> Vec<String> {
        [&self.symptom_1, &self.symptom_2, &self.symptom_3, &self.symptom_4]
            .into_iter()
            .filter_map(|s| clean_cell(s.as_deref()))
            .collect()
    }
}

/// Something attributable to exactly one disease.
pub trait DiseaseRow {
    fn disease(&self) -> &str;
}

macro_rules! impl_disease_row {
    ($($ty:ty),* $(,)?) => {
        $(impl DiseaseRow for $ty {
            fn disease(&self) -> &str {
                &self.disease
            }
        })*
    };
}

impl_disease_row!(DescriptionRow, PrecautionRow, MedicationRow, DietRow, WorkoutRow, SymptomRow);

/// Strings pandas reads as NaN by default (`keep_default_na`).
const NA_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Blank cells and NA markers are not valid text.
fn clean_cell(cell: Option<&str>) -> Option<String> {
    let trimmed = cell?.trim();
    if trimmed.is_empty() || NA_MARKERS.contains(&trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// The kinds of reference table, used in logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Description,
    Precautions,
    Medications,
    Diets,
    Workout,
    Symptoms,
}

impl TableKind {
    pub const ALL: [TableKind; 6] = [
        Self::Description,
        Self::Precautions,
        Self::Medications,
        Self::Diets,
        Self::Workout,
        Self::Symptoms,
    ];

    /// File name inside the datasets directory.
    #[must_use]
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Description => "description.csv",
            Self::Precautions => "precautions_df.csv",
            Self::Medications => "medications.csv",
            Self::Diets => "diets.csv",
            Self::Workout => "workout_df.csv",
            Self::Symptoms => "symtoms_df.csv",
        }
    }

    /// Headers a file of this kind must carry.
    #[must_use]
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            Self::Description => &["Disease", "Description"],
            Self::Precautions => &[
                "Disease",
                "Precaution_1",
                "Precaution_2",
                "Precaution_3",
                "Precaution_4",
            ],
            Self::Medications => &["Disease", "Medication"],
            Self::Diets => &["Disease", "Diet"],
            Self::Workout => &["disease", "workout"],
            Self::Symptoms => &["Disease", "Symptom_1", "Symptom_2", "Symptom_3", "Symptom_4"],
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Description => "description",
            Self::Precautions => "precautions",
            Self::Medications => "medications",
            Self::Diets => "diets",
            Self::Workout => "workout",
            Self::Symptoms => "symptoms",
        };
        f.write_str(name)
    }
}

/// A disease name in a table that matches no catalog entry exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDisease {
    pub table: TableKind,
    pub name: String,
    /// Catalog entry differing only by case or whitespace, if any
    pub near_match: Option<String>,
}

impl std::fmt::Display for UnknownDisease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} table: {:?}", self.table, self.name)?;
        if let Some(near) = &self.near_match {
            write!(f, " (catalog has {near:?})")?;
        }
        Ok(())
    }
}

/// Result of checking tables against the disease catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageReport {
    /// Table rows naming diseases the catalog does not know; fatal at startup
    pub unknown: Vec<UnknownDisease>,
    /// Catalog diseases with no row in a non-empty table
    pub missing: Vec<(TableKind, String)>,
}

impl CoverageReport {
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.unknown.is_empty()
    }
}

/// All six reference tables.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    pub descriptions: Vec<DescriptionRow>,
    pub precautions: Vec<PrecautionRow>,
    pub medications: Vec<MedicationRow>,
    pub diets: Vec<DietRow>,
    pub workouts: Vec<WorkoutRow>,
    pub symptoms: Vec<SymptomRow>,
}

fn matching<'a, R: DiseaseRow>(rows: &'a [R], disease: &'a str) -> impl Iterator<Item = &'a R> {
    rows.iter().filter(move |r| r.disease() == disease)
}

fn distinct_diseases<R: DiseaseRow>(rows: &[R]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for row in rows {
        if !seen.contains(&row.disease()) {
            seen.push(row.disease());
        }
    }
    seen
}

impl ReferenceTables {
    /// Assemble the reference information for a disease.
    ///
    /// Never fails: a disease with no rows gets the placeholder description
    /// and empty lists.
    #[must_use]
    pub fn aggregate(&self, disease: &str) -> PredictionResult {
        let description = matching(&self.descriptions, disease)
            .next()
            .map(|r| r.description.clone())
            .unwrap_or_else(|| NO_DESCRIPTION.to_string());

        let precautions = matching(&self.precautions, disease)
            .next()
            .map(PrecautionRow::precautions)
            .unwrap_or_default();

        let medications = matching(&self.medications, disease)
            .map(|r| r.medication.clone())
            .collect();

        let diets = matching(&self.diets, disease).map(|r| r.diet.clone()).collect();

        let workouts = matching(&self.workouts, disease)
            .map(|r| r.workout.clone())
            .collect();

        PredictionResult {
            disease: disease.to_string(),
            description,
            precautions,
            medications,
            diets,
            workouts,
        }
    }

    /// Symptoms listed for a disease in the first matching symptoms row.
    #[must_use]
    pub fn typical_symptoms(&self, disease: &str) -> Vec<String> {
        matching(&self.symptoms, disease)
            .next()
            .map(SymptomRow::symptoms)
            .unwrap_or_default()
    }

    /// Number of rows in a table.
    #[must_use]
    pub fn row_count(&self, kind: TableKind) -> usize {
        match kind {
            TableKind::Description => self.descriptions.len(),
            TableKind::Precautions => self.precautions.len(),
            TableKind::Medications => self.medications.len(),
            TableKind::Diets => self.diets.len(),
            TableKind::Workout => self.workouts.len(),
            TableKind::Symptoms => self.symptoms.len(),
        }
    }

    fn diseases_in(&self, kind: TableKind) -> Vec<&str> {
        match kind {
            TableKind::Description => distinct_diseases(&self.descriptions),
            TableKind::Precautions => distinct_diseases(&self.precautions),
            TableKind::Medications => distinct_diseases(&self.medications),
            TableKind::Diets => distinct_diseases(&self.diets),
            TableKind::Workout => distinct_diseases(&self.workouts),
            TableKind::Symptoms => distinct_diseases(&self.symptoms),
        }
    }

    /// Compare every table's disease names with the catalog.
    ///
    /// Empty tables (for example a missing file) are skipped entirely.
    #[must_use]
    pub fn coverage(&self, catalog: &DiseaseCatalog) -> CoverageReport {
        let mut report = CoverageReport::default();

        for kind in TableKind::ALL {
            let present = self.diseases_in(kind);
            if present.is_empty() {
                continue;
            }

            for name in &present {
                if !catalog.contains_name(name) {
                    report.unknown.push(UnknownDisease {
                        table: kind,
                        name: (*name).to_string(),
                        near_match: catalog.near_match(name).map(str::to_string),
                    });
                }
            }

            for name in catalog.names() {
                if !present.contains(&name) {
                    report.missing.push((kind, name.to_string()));
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn precaution_row(cells: [&str; 4]) -> PrecautionRow {
        PrecautionRow {
            disease: "Acne".into(),
            precaution_1: Some(cells[0].into()),
            precaution_2: Some(cells[1].into()),
            precaution_3: Some(cells[2].into()),
            precaution_4: Some(cells[3].into()),
        }
    }

    #[test]
    fn test_na_markers_are_not_precautions() {
        let row = precaution_row(["wash", "None", "#N/A", "n/a"]);
        assert_eq!(row.precautions(), vec!["wash"]);

        for marker in NA_MARKERS {
            let row = precaution_row([*marker, "", " ", "rest"]);
            assert_eq!(row.precautions(), vec!["rest"], "{marker} kept");
        }

        // Only whole-cell markers count
        let row = precaution_row(["Nonessential travel", "NAP", "n/a ", "<NA>"]);
        assert_eq!(row.precautions(), vec!["Nonessential travel", "NAP"]);
    }

    fn tables() -> ReferenceTables {
        ReferenceTables {
            descriptions: vec![
                DescriptionRow {
                    disease: "Acne".into(),
                    description: "Skin condition.".into(),
                },
                DescriptionRow {
                    disease: "Acne".into(),
                    description: "Second row, never used.".into(),
                },
            ],
            precautions: vec![PrecautionRow {
                disease: "Acne".into(),
                precaution_1: Some(" bath twice ".into()),
                precaution_2: None,
                precaution_3: Some("nan".into()),
                precaution_4: Some("avoid fatty spicy food".into()),
            }],
            medications: vec![
                MedicationRow {
                    disease: "Acne".into(),
                    medication: "Topical retinoids".into(),
                },
                MedicationRow {
                    disease: "Allergy".into(),
                    medication: "Antihistamines".into(),
                },
                MedicationRow {
                    disease: "Acne".into(),
                    medication: "Antibiotics".into(),
                },
            ],
            diets: vec![DietRow {
                disease: "Acne".into(),
                diet: "Low-glycemic diet".into(),
            }],
            workouts: vec![],
            symptoms: vec![SymptomRow {
                disease: "Acne".into(),
                symptom_1: Some("skin_rash".into()),
                symptom_2: Some(" pus_filled_pimples".into()),
                symptom_3: Some("".into()),
                symptom_4: None,
            }],
        }
    }

    #[test]
    fn test_aggregate_uses_first_description() {
        let result = tables().aggregate("Acne");
        assert_eq!(result.description, "Skin condition.");
    }

    #[test]
    fn test_aggregate_cleans_precautions() {
        let result = tables().aggregate("Acne");
        assert_eq!(result.precautions, vec!["bath twice", "avoid fatty spicy food"]);
    }

    #[test]
    fn test_aggregate_keeps_table_order() {
        let result = tables().aggregate("Acne");
        assert_eq!(result.medications, vec!["Topical retinoids", "Antibiotics"]);
        assert_eq!(result.diets, vec!["Low-glycemic diet"]);
        assert!(result.workouts.is_empty());
    }

    #[test]
    fn test_aggregate_unknown_disease() {
        let result = tables().aggregate("NoSuchDisease");
        assert_eq!(result.description, NO_DESCRIPTION);
        assert!(result.precautions.is_empty());
        assert!(result.medications.is_empty());
        assert!(result.diets.is_empty());
        assert!(result.workouts.is_empty());
    }

    #[test]
    fn test_aggregate_key_is_exact() {
        let result = tables().aggregate("acne ");
        assert!(!result.has_reference_data());
    }

    #[test]
    fn test_typical_symptoms() {
        assert_eq!(
            tables().typical_symptoms("Acne"),
            vec!["skin_rash", "pus_filled_pimples"]
        );
        assert!(tables().typical_symptoms("Allergy").is_empty());
    }

    #[test]
    fn test_coverage_flags_unknown_and_missing() {
        let catalog = DiseaseCatalog::from_entries([(0, "Acne"), (1, "Allergy ")])
            .expect("Should build");
        let report = tables().coverage(&catalog);

        assert!(!report.is_consistent());
        assert_eq!(report.unknown.len(), 1);
        assert_eq!(report.unknown[0].table, TableKind::Medications);
        assert_eq!(report.unknown[0].near_match.as_deref(), Some("Allergy "));
        // Workout table is empty and therefore not checked.
        assert!(!report.missing.iter().any(|(k, _)| *k == TableKind::Workout));
        assert!(report
            .missing
            .contains(&(TableKind::Description, "Allergy ".to_string())));
    }
}
