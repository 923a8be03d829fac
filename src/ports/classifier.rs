//! Classifier port: Trait for the pre-trained disease classifier.
//!
//! This trait abstracts the model artifact format from the prediction
//! pipeline. The pipeline only relies on the feature layout, the label space,
//! and a deterministic `predict`.

/// Errors raised by a classifier at prediction time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifierError {
    #[error("Feature vector has {got} entries, model expects {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Model produced no decision")]
    NoDecision,
}

/// Trait for a trained symptom → disease classifier.
///
/// Implementations must be pure: the same features always produce the same
/// label, and `predict` has no side effects.
pub trait Classifier: Send + Sync {
    /// Feature names in the order the model expects them.
    ///
    /// Must equal the symptom catalog's slot order; checked at startup.
    fn feature_names(&self) -> &[String];

    /// Every label `predict` can return.
    ///
    /// Each must exist in the disease catalog; checked at startup.
    fn labels(&self) -> &[u32];

    /// Predict the class label for a 0/1 feature vector.
    ///
    /// # Errors
    /// Returns `ClassifierError::DimensionMismatch` if the vector length does
    /// not match `feature_names().len()`.
    fn predict(&self, features: &[f64]) -> Result<u32, ClassifierError>;
}
