//! CSV adapter: loads the reference tables from the datasets directory.
//!
//! Each file is read once at startup into typed rows. Expected layout:
//!
//! ```text
//! datasets/
//!   description.csv     Disease,Description
//!   precautions_df.csv  Disease,Precaution_1,...,Precaution_4
//!   medications.csv     Disease,Medication
//!   diets.csv           Disease,Diet
//!   workout_df.csv      disease,workout
//!   symtoms_df.csv      Disease,Symptom_1,...,Symptom_4
//! ```
//!
//! A missing file yields an empty table so that predictions keep working
//! with partial reference data. A file that exists but lacks a required
//! column, or has a row that cannot be parsed, is a hard error.

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::domain::{ReferenceTables, TableKind};

/// Errors while loading reference tables.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceDataError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{table} table is missing required column(s): {}", missing.join(", "))]
    MissingColumns {
        table: TableKind,
        missing: Vec<String>,
    },

    #[error("{table} table, row {row}: {message}")]
    Malformed {
        table: TableKind,
        row: usize,
        message: String,
    },
}

/// Parse one table from a reader.
///
/// Columns are matched by header name; extra columns are ignored.
///
/// # Errors
/// Returns `MissingColumns` if a required header is absent and `Malformed`
/// for rows that fail to deserialize.
pub fn parse_table<T, R>(reader: R, kind: TableKind) -> Result<Vec<T>, ReferenceDataError>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| ReferenceDataError::Malformed {
            table: kind,
            row: 0,
            message: e.to_string(),
        })?
        .clone();

    let missing: Vec<String> = kind
        .required_columns()
        .iter()
        .filter(|col| !headers.iter().any(|h| h.trim_start_matches('\u{feff}') == **col))
        .map(|col| (*col).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ReferenceDataError::MissingColumns {
            table: kind,
            missing,
        });
    }

    let mut rows = Vec::new();
    for (idx, result) in csv_reader.deserialize::<T>().enumerate() {
        let row = result.map_err(|e| ReferenceDataError::Malformed {
            table: kind,
            row: idx + 1,
            message: e.to_string(),
        })?;
        rows.push(row);
    }

    Ok(rows)
}

/// Load one table file, or an empty table if the file does not exist.
///
/// # Errors
/// Returns error if the file exists but cannot be read or parsed.
pub fn load_table<T: DeserializeOwned>(
    datasets_dir: &Path,
    kind: TableKind,
) -> Result<Vec<T>, ReferenceDataError> {
    let path = datasets_dir.join(kind.file_name());

    let file = match std::fs::File::open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(
                "Dataset file {:?} not found; {} table will be empty",
                path,
                kind
            );
            return Ok(Vec::new());
        }
        Err(source) => return Err(ReferenceDataError::Io { path, source }),
    };

    let rows = parse_table(std::io::BufReader::new(file), kind)?;
    tracing::info!("Loaded {} {} rows from {:?}", rows.len(), kind, path);
    Ok(rows)
}

/// Load all six reference tables from a directory.
///
/// # Errors
/// Returns the first load error; missing files are not errors.
pub fn load_reference_tables(datasets_dir: &Path) -> Result<ReferenceTables, ReferenceDataError> {
    Ok(ReferenceTables {
        descriptions: load_table(datasets_dir, TableKind::Description)?,
        precautions: load_table(datasets_dir, TableKind::Precautions)?,
        medications: load_table(datasets_dir, TableKind::Medications)?,
        diets: load_table(datasets_dir, TableKind::Diets)?,
        workouts: load_table(datasets_dir, TableKind::Workout)?,
        symptoms: load_table(datasets_dir, TableKind::Symptoms)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MedicationRow, PrecautionRow, WorkoutRow};

    #[test]
    fn parse_ignores_extra_columns() {
        let data = ",Disease,Medication\n0,Acne,['Retinoids']\n1,Acne,Antibiotics\n";
        let rows: Vec<MedicationRow> =
            parse_table(data.as_bytes(), TableKind::Medications).expect("Should parse");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].medication, "['Retinoids']");
    }

    #[test]
    fn parse_empty_cells_as_none() {
        let data = "Disease,Precaution_1,Precaution_2,Precaution_3,Precaution_4\nAcne,wash,,,sleep\n";
        let rows: Vec<PrecautionRow> =
            parse_table(data.as_bytes(), TableKind::Precautions).expect("Should parse");
        assert_eq!(rows[0].precaution_2, None);
        assert_eq!(rows[0].precautions(), vec!["wash", "sleep"]);
    }

    #[test]
    fn parse_preserves_disease_whitespace() {
        let data = "disease,workout\nDiabetes ,Walk daily\n";
        let rows: Vec<WorkoutRow> =
            parse_table(data.as_bytes(), TableKind::Workout).expect("Should parse");
        assert_eq!(rows[0].disease, "Diabetes ");
    }

    #[test]
    fn missing_column_is_an_error() {
        let data = "Disease,Drug\nAcne,Retinoids\n";
        let result: Result<Vec<MedicationRow>, _> =
            parse_table(data.as_bytes(), TableKind::Medications);
        match result {
            Err(ReferenceDataError::MissingColumns { missing, .. }) => {
                assert_eq!(missing, vec!["Medication"]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn ragged_row_is_an_error() {
        let data = "Disease,Medication\nAcne\n";
        let result: Result<Vec<MedicationRow>, _> =
            parse_table(data.as_bytes(), TableKind::Medications);
        assert!(matches!(result, Err(ReferenceDataError::Malformed { row: 1, .. })));
    }

    #[test]
    fn missing_file_gives_empty_table() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let tables = load_reference_tables(dir.path()).expect("Should load");
        for kind in TableKind::ALL {
            assert_eq!(tables.row_count(kind), 0);
        }
    }

    #[test]
    fn loads_present_files() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        std::fs::write(
            dir.path().join("diets.csv"),
            "Disease,Diet\nAcne,Low-glycemic diet\nAcne,Fruits\n",
        )
        .expect("Should write");

        let tables = load_reference_tables(dir.path()).expect("Should load");
        assert_eq!(tables.row_count(TableKind::Diets), 2);
        assert_eq!(tables.row_count(TableKind::Description), 0);
        assert_eq!(tables.aggregate("Acne").diets, vec!["Low-glycemic diet", "Fruits"]);
    }
}
