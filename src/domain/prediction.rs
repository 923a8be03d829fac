//! Prediction result types.
//!
//! Represents the output of the symptom lookup pipeline: a disease name plus
//! the reference information assembled for it.

use serde::{Deserialize, Serialize};

/// Description used when the description table has no row for a disease.
pub const NO_DESCRIPTION: &str = "No description available.";

/// Reasons a prediction request can be refused.
///
/// None of these are fatal to the process; each maps to a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredictionError {
    #[error("No symptoms were submitted")]
    EmptyInput,

    #[error("None of the submitted symptoms are recognised")]
    NoValidSymptoms,

    #[error("Prediction model is not loaded")]
    ModelUnavailable,

    #[error("Classifier returned label {0}, which is not in the disease catalog")]
    UnknownDiseaseLabel(u32),

    #[error("Classifier failed: {0}")]
    Classifier(String),
}

impl PredictionError {
    /// Message shown to the person who submitted the form.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyInput => "Please select at least one symptom to get a prediction.",
            Self::NoValidSymptoms => {
                "Not enough valid symptoms selected for prediction. Please choose more valid symptoms."
            }
            Self::ModelUnavailable => {
                "The prediction model could not be loaded. Please check the 'models' folder."
            }
            Self::UnknownDiseaseLabel(_) | Self::Classifier(_) => {
                "The prediction could not be completed. Please try again later."
            }
        }
    }

    /// Stable machine-readable kind, used in API error bodies.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyInput => "empty_input",
            Self::NoValidSymptoms => "no_valid_symptoms",
            Self::ModelUnavailable => "model_unavailable",
            Self::UnknownDiseaseLabel(_) => "unknown_disease_label",
            Self::Classifier(_) => "classifier_failure",
        }
    }
}

/// Everything returned for one successful prediction.
///
/// Every field is always populated; missing reference rows degrade to the
/// placeholder description or an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted disease name, exactly as the disease catalog spells it
    pub disease: String,

    /// Description text, or [`NO_DESCRIPTION`]
    pub description: String,

    /// Up to four precautions from the first matching row
    pub precautions: Vec<String>,

    /// Medication entries of every matching row, in table order
    pub medications: Vec<String>,

    /// Diet entries of every matching row, in table order
    pub diets: Vec<String>,

    /// Workout entries of every matching row, in table order
    pub workouts: Vec<String>,
}

impl PredictionResult {
    /// Result with no reference data attached.
    #[must_use]
    pub fn empty(disease: impl Into<String>) -> Self {
        Self {
            disease: disease.into(),
            description: NO_DESCRIPTION.to_string(),
            precautions: Vec::new(),
            medications: Vec::new(),
            diets: Vec::new(),
            workouts: Vec::new(),
        }
    }

    /// Whether any reference row matched the disease.
    #[must_use]
    pub fn has_reference_data(&self) -> bool {
        self.description != NO_DESCRIPTION
            || !self.precautions.is_empty()
            || !self.medications.is_empty()
            || !self.diets.is_empty()
            || !self.workouts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_is_fully_populated() {
        let result = PredictionResult::empty("NoSuchDisease");
        assert_eq!(result.disease, "NoSuchDisease");
        assert_eq!(result.description, NO_DESCRIPTION);
        assert!(result.precautions.is_empty());
        assert!(!result.has_reference_data());
    }

    #[test]
    fn test_model_unavailable_has_distinct_message() {
        assert_ne!(
            PredictionError::ModelUnavailable.user_message(),
            PredictionError::NoValidSymptoms.user_message()
        );
        assert_eq!(PredictionError::UnknownDiseaseLabel(99).kind(), "unknown_disease_label");
    }

    #[test]
    fn test_result_serializes_all_fields() {
        let json = serde_json::to_value(PredictionResult::empty("Acne")).expect("Should serialize");
        for field in ["disease", "description", "precautions", "medications", "diets", "workouts"] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
    }
}
