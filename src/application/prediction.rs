//! Prediction service: Orchestrates the symptom lookup pipeline.
//!
//! This service coordinates:
//! - Symptom vectorization against the symptom catalog
//! - Classification through the `Classifier` port
//! - Label → disease name translation
//! - Reference aggregation
//!
//! All inputs are loaded once into a [`PredictionContext`] and never mutated,
//! so one service instance is shared by every request.

use std::path::Path;
use std::sync::Arc;

use crate::adapters::csv_tables::{self, ReferenceDataError};
use crate::adapters::linear_svc::{LinearSvcAdapter, ModelLoadError};
use crate::domain::{
    DiseaseCatalog, PredictionError, PredictionResult, ReferenceTables, SymptomCatalog,
    SymptomVector, UnknownDisease,
};
use crate::ports::Classifier;

/// Fatal inconsistencies between the catalogs, the model and the tables.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error(transparent)]
    ReferenceData(#[from] ReferenceDataError),

    #[error("Model has {model} features but the symptom catalog has {catalog} slots")]
    FeatureCount { model: usize, catalog: usize },

    #[error("Model feature {slot} is {model:?} but symptom catalog slot {slot} is {catalog:?}")]
    FeatureOrder {
        slot: usize,
        model: String,
        catalog: String,
    },

    #[error("Model can predict label {0}, which is not in the disease catalog")]
    UnknownModelLabel(u32),

    #[error("Reference tables name diseases missing from the catalog: {}", format_unknown(.0))]
    UnknownTableDiseases(Vec<UnknownDisease>),
}

fn format_unknown(unknown: &[UnknownDisease]) -> String {
    unknown
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Everything the pipeline reads, built once at startup.
pub struct PredictionContext {
    symptoms: SymptomCatalog,
    diseases: DiseaseCatalog,
    tables: ReferenceTables,
    classifier: Option<Arc<dyn Classifier>>,
    model_digest: Option<String>,
}

impl std::fmt::Debug for PredictionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionContext")
            .field("symptoms", &self.symptoms.len())
            .field("diseases", &self.diseases.len())
            .field("model_loaded", &self.classifier.is_some())
            .field("model_digest", &self.model_digest)
            .finish_non_exhaustive()
    }
}

impl PredictionContext {
    /// Assemble a context and run the startup consistency checks.
    ///
    /// # Errors
    /// Returns `ContextError` if the classifier's feature layout or label space
    /// disagrees with the catalogs, or a table names an unknown disease.
    pub fn new(
        symptoms: SymptomCatalog,
        diseases: DiseaseCatalog,
        tables: ReferenceTables,
        classifier: Option<Arc<dyn Classifier>>,
    ) -> Result<Self, ContextError> {
        if let Some(model) = &classifier {
            check_model(model.as_ref(), &symptoms, &diseases)?;
        }

        let coverage = tables.coverage(&diseases);
        if !coverage.is_consistent() {
            return Err(ContextError::UnknownTableDiseases(coverage.unknown));
        }
        for (kind, name) in &coverage.missing {
            tracing::warn!("{} table has no rows for {:?}", kind, name);
        }

        Ok(Self {
            symptoms,
            diseases,
            tables,
            classifier,
            model_digest: None,
        })
    }

    /// Load the reference tables and the model artifact from disk.
    ///
    /// A missing or unreadable model leaves the context without a classifier;
    /// predictions then fail with `ModelUnavailable`.
    ///
    /// # Errors
    /// Returns `ContextError` for malformed tables or catalog mismatches.
    pub fn load(
        datasets_dir: &Path,
        models_dir: &Path,
        model_sha256: Option<&str>,
    ) -> Result<Self, ContextError> {
        tracing::info!("Loading reference tables from {:?}", datasets_dir);
        let tables = csv_tables::load_reference_tables(datasets_dir)?;

        let (classifier, digest) = match LinearSvcAdapter::load(models_dir, model_sha256) {
            Ok(model) => {
                let digest = model.digest().to_string();
                (Some(Arc::new(model) as Arc<dyn Classifier>), Some(digest))
            }
            Err(ModelLoadError::NotFound(path)) => {
                tracing::warn!("Model file {:?} not found; predictions are disabled", path);
                (None, None)
            }
            Err(e) => {
                tracing::error!("Failed to load model: {}; predictions are disabled", e);
                (None, None)
            }
        };

        let mut context = Self::new(
            SymptomCatalog::builtin(),
            DiseaseCatalog::builtin(),
            tables,
            classifier,
        )?;
        context.model_digest = digest;
        Ok(context)
    }

    #[must_use]
    pub fn symptoms(&self) -> &SymptomCatalog {
        &self.symptoms
    }

    #[must_use]
    pub fn diseases(&self) -> &DiseaseCatalog {
        &self.diseases
    }

    #[must_use]
    pub fn tables(&self) -> &ReferenceTables {
        &self.tables
    }

    /// SHA-256 of the loaded artifact, when it came from disk.
    #[must_use]
    pub fn model_digest(&self) -> Option<&str> {
        self.model_digest.as_deref()
    }
}

/// Check a classifier against both catalogs.
///
/// # Errors
/// Returns the first mismatch found.
pub fn check_model(
    model: &dyn Classifier,
    symptoms: &SymptomCatalog,
    diseases: &DiseaseCatalog,
) -> Result<(), ContextError> {
    let features = model.feature_names();
    if features.len() != symptoms.len() {
        return Err(ContextError::FeatureCount {
            model: features.len(),
            catalog: symptoms.len(),
        });
    }

    if let Some((slot, (model_name, catalog_name))) = features
        .iter()
        .zip(symptoms.names())
        .enumerate()
        .find(|(_, (m, c))| m != c)
    {
        return Err(ContextError::FeatureOrder {
            slot,
            model: model_name.clone(),
            catalog: catalog_name.clone(),
        });
    }

    if let Some(label) = model.labels().iter().find(|l| diseases.name(**l).is_none()) {
        return Err(ContextError::UnknownModelLabel(*label));
    }

    Ok(())
}

/// A prediction together with how the input was interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    pub result: PredictionResult,
    /// Tokens that matched the catalog, in input order
    pub matched: Vec<String>,
    /// Tokens that were skipped, in input order
    pub ignored: Vec<String>,
}

/// Service running the symptom → disease pipeline.
#[derive(Debug)]
pub struct PredictionService {
    context: PredictionContext,
}

impl PredictionService {
    /// Create a new prediction service.
    #[must_use]
    pub fn new(context: PredictionContext) -> Self {
        Self { context }
    }

    #[must_use]
    pub fn context(&self) -> &PredictionContext {
        &self.context
    }

    /// Whether a classifier is loaded.
    #[must_use]
    pub fn model_loaded(&self) -> bool {
        self.context.classifier.is_some()
    }

    /// Run the full pipeline on a comma-separated symptom string.
    ///
    /// # Errors
    /// - `ModelUnavailable` if no model is loaded (checked before parsing input)
    /// - `EmptyInput` / `NoValidSymptoms` from vectorization
    /// - `UnknownDiseaseLabel` if the classifier returns a label outside the catalog
    pub fn predict_from_symptoms(&self, raw_input: &str) -> Result<PredictionResult, PredictionError> {
        self.predict_detailed(raw_input).map(|p| p.result)
    }

    /// Like [`predict_from_symptoms`](Self::predict_from_symptoms), but also
    /// reports which tokens were used.
    ///
    /// # Errors
    /// Same as `predict_from_symptoms`.
    pub fn predict_detailed(&self, raw_input: &str) -> Result<Prediction, PredictionError> {
        if !self.model_loaded() {
            return Err(PredictionError::ModelUnavailable);
        }

        let vectorized = self.context.symptoms.vectorize(raw_input)?;
        tracing::debug!(
            "Vectorized {} symptom(s), ignored {}",
            vectorized.matched.len(),
            vectorized.ignored.len()
        );

        let disease = self.predict(&vectorized.vector)?;
        let result = self.aggregate(&disease);

        tracing::info!("Predicted {:?}", disease);
        Ok(Prediction {
            result,
            matched: vectorized.matched,
            ignored: vectorized.ignored,
        })
    }

    /// Classify a presence vector and return the disease name.
    ///
    /// An all-zero vector is passed to the classifier as is.
    ///
    /// # Errors
    /// Returns `ModelUnavailable`, `UnknownDiseaseLabel` or `Classifier`.
    pub fn predict(&self, vector: &SymptomVector) -> Result<String, PredictionError> {
        let classifier = self
            .context
            .classifier
            .as_ref()
            .ok_or(PredictionError::ModelUnavailable)?;

        let label = classifier
            .predict(&vector.to_features())
            .map_err(|e| PredictionError::Classifier(e.to_string()))?;

        self.context
            .diseases
            .name(label)
            .map(str::to_string)
            .ok_or(PredictionError::UnknownDiseaseLabel(label))
    }

    /// Reference information for a disease name. Never fails.
    #[must_use]
    pub fn aggregate(&self, disease: &str) -> PredictionResult {
        self.context.tables.aggregate(disease)
    }

    /// Typical symptoms of a disease, or `None` if the catalog does not know it.
    #[must_use]
    pub fn typical_symptoms(&self, disease: &str) -> Option<Vec<String>> {
        self.context
            .diseases
            .contains_name(disease)
            .then(|| self.context.tables.typical_symptoms(disease))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        DescriptionRow, DietRow, MedicationRow, PrecautionRow, WorkoutRow, NO_DESCRIPTION,
        SYMPTOM_NAMES,
    };
    use crate::ports::ClassifierError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedLabel {
        features: Vec<String>,
        labels: Vec<u32>,
        label: u32,
        calls: AtomicUsize,
        last_active: AtomicUsize,
    }

    impl FixedLabel {
        fn new(label: u32) -> Self {
            Self {
                features: SYMPTOM_NAMES.iter().map(|s| (*s).to_string()).collect(),
                labels: (0..41).collect(),
                label,
                calls: AtomicUsize::new(0),
                last_active: AtomicUsize::new(usize::MAX),
            }
        }
    }

    impl Classifier for FixedLabel {
        fn feature_names(&self) -> &[String] {
            &self.features
        }

        fn labels(&self) -> &[u32] {
            &self.labels
        }

        fn predict(&self, features: &[f64]) -> Result<u32, ClassifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let active = features.iter().filter(|v| **v > 0.0).count();
            self.last_active.store(active, Ordering::SeqCst);
            Ok(self.label)
        }
    }

    fn fungal_tables() -> ReferenceTables {
        let d = "Fungal infection";
        ReferenceTables {
            descriptions: vec![DescriptionRow {
                disease: d.into(),
                description: "Fungal infection is a common skin condition.".into(),
            }],
            precautions: vec![PrecautionRow {
                disease: d.into(),
                precaution_1: Some("bath twice".into()),
                precaution_2: Some("use detol or neem in bathing water".into()),
                precaution_3: Some("keep infected area dry".into()),
                precaution_4: Some("use clean cloths".into()),
            }],
            medications: vec![MedicationRow {
                disease: d.into(),
                medication: "['Antifungal Cream', 'Fluconazole']".into(),
            }],
            diets: vec![DietRow {
                disease: d.into(),
                diet: "['Antifungal Diet', 'Probiotics']".into(),
            }],
            workouts: vec![
                WorkoutRow {
                    disease: d.into(),
                    workout: "Avoid sugary foods".into(),
                },
                WorkoutRow {
                    disease: d.into(),
                    workout: "Consume probiotics".into(),
                },
            ],
            symptoms: Vec::new(),
        }
    }

    fn service_with(model: Option<Arc<FixedLabel>>) -> PredictionService {
        let classifier = model.map(|m| m as Arc<dyn Classifier>);
        let context = PredictionContext::new(
            SymptomCatalog::builtin(),
            DiseaseCatalog::builtin(),
            fungal_tables(),
            classifier,
        )
        .expect("Should build context");
        PredictionService::new(context)
    }

    #[test]
    fn test_end_to_end_fungal_infection() {
        let model = Arc::new(FixedLabel::new(15));
        let service = service_with(Some(model.clone()));

        let result = service
            .predict_from_symptoms("itching, skin_rash, nodal_skin_eruptions")
            .expect("Should predict");

        assert_eq!(result.disease, "Fungal infection");
        assert_ne!(result.description, NO_DESCRIPTION);
        assert_eq!(result.precautions.len(), 4);
        assert_eq!(result.workouts, vec!["Avoid sugary foods", "Consume probiotics"]);
        assert_eq!(model.last_active.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_unknown_tokens_are_ignored() {
        let model = Arc::new(FixedLabel::new(15));
        let service = service_with(Some(model.clone()));

        let with_bogus = service
            .predict_detailed("itching, bogus_symptom")
            .expect("Should predict");
        let plain = service.predict_detailed("itching").expect("Should predict");

        assert_eq!(with_bogus.result, plain.result);
        assert_eq!(with_bogus.ignored, vec!["bogus_symptom"]);
        assert_eq!(model.last_active.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_model_unavailable_before_classifier_and_vectorizer() {
        let service = service_with(None);
        assert!(!service.model_loaded());

        // Checked before input parsing, so even empty input reports the model.
        assert_eq!(
            service.predict_from_symptoms(""),
            Err(PredictionError::ModelUnavailable)
        );
        assert_eq!(
            service.predict_from_symptoms("itching"),
            Err(PredictionError::ModelUnavailable)
        );
    }

    #[test]
    fn test_input_errors_skip_classifier() {
        let model = Arc::new(FixedLabel::new(15));
        let service = service_with(Some(model.clone()));

        assert_eq!(
            service.predict_from_symptoms("  ,  ,"),
            Err(PredictionError::EmptyInput)
        );
        assert_eq!(
            service.predict_from_symptoms("not_a_real_symptom"),
            Err(PredictionError::NoValidSymptoms)
        );
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_all_zero_vector_reaches_classifier() {
        let model = Arc::new(FixedLabel::new(15));
        let service = service_with(Some(model.clone()));

        let disease = service
            .predict(&SymptomVector::zeros(SYMPTOM_NAMES.len()))
            .expect("Should predict");
        assert_eq!(disease, "Fungal infection");
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert_eq!(model.last_active.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unknown_label_from_classifier() {
        // Bypass the startup check to simulate a label the catalog lacks.
        let mut model = FixedLabel::new(99);
        model.labels = vec![0, 1];
        let service = service_with(Some(Arc::new(model)));

        assert_eq!(
            service.predict_from_symptoms("itching"),
            Err(PredictionError::UnknownDiseaseLabel(99))
        );
    }

    #[test]
    fn test_aggregate_unknown_disease() {
        let service = service_with(None);
        let result = service.aggregate("NoSuchDisease");
        assert_eq!(result, PredictionResult::empty("NoSuchDisease"));
    }

    #[test]
    fn test_typical_symptoms_requires_known_disease() {
        let service = service_with(None);
        assert_eq!(service.typical_symptoms("NoSuchDisease"), None);
        assert_eq!(service.typical_symptoms("Fungal infection"), Some(Vec::new()));
    }

    #[test]
    fn test_feature_order_mismatch_is_fatal() {
        let mut model = FixedLabel::new(15);
        model.features.swap(0, 1);
        let result = PredictionContext::new(
            SymptomCatalog::builtin(),
            DiseaseCatalog::builtin(),
            ReferenceTables::default(),
            Some(Arc::new(model)),
        );
        assert!(matches!(result, Err(ContextError::FeatureOrder { slot: 0, .. })));
    }

    #[test]
    fn test_feature_count_mismatch_is_fatal() {
        let mut model = FixedLabel::new(15);
        model.features.pop();
        let result = PredictionContext::new(
            SymptomCatalog::builtin(),
            DiseaseCatalog::builtin(),
            ReferenceTables::default(),
            Some(Arc::new(model)),
        );
        assert!(matches!(
            result,
            Err(ContextError::FeatureCount { model: 131, catalog: 132 })
        ));
    }

    #[test]
    fn test_unknown_model_label_is_fatal() {
        let mut model = FixedLabel::new(15);
        model.labels.push(41);
        let result = PredictionContext::new(
            SymptomCatalog::builtin(),
            DiseaseCatalog::builtin(),
            ReferenceTables::default(),
            Some(Arc::new(model)),
        );
        assert!(matches!(result, Err(ContextError::UnknownModelLabel(41))));
    }

    #[test]
    fn test_unknown_table_disease_is_fatal() {
        let mut tables = fungal_tables();
        tables.diets.push(DietRow {
            disease: "Diabetes".into(),
            diet: "Low sugar".into(),
        });
        let result = PredictionContext::new(
            SymptomCatalog::builtin(),
            DiseaseCatalog::builtin(),
            tables,
            None,
        );
        match result {
            Err(ContextError::UnknownTableDiseases(unknown)) => {
                assert_eq!(unknown.len(), 1);
                assert_eq!(unknown[0].near_match.as_deref(), Some("Diabetes "));
            }
            other => panic!("expected UnknownTableDiseases, got {other:?}"),
        }
    }

    #[test]
    fn test_load_without_model_is_degraded() {
        let datasets = tempfile::tempdir().expect("Should create temp dir");
        let models = tempfile::tempdir().expect("Should create temp dir");

        let context =
            PredictionContext::load(datasets.path(), models.path(), None).expect("Should load");
        assert!(context.model_digest().is_none());

        let service = PredictionService::new(context);
        assert!(!service.model_loaded());
    }
}
