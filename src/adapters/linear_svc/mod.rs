//! Linear SVC adapter: Implementation of Classifier from an exported model.
//!
//! The model is a one-vs-rest linear support vector classifier exported from
//! the training pipeline as JSON (`svc.json` in the models directory):
//!
//! ```text
//! {
//!   "format_version": 1,
//!   "feature_names": ["itching", "skin_rash", ...],
//!   "classes": [0, 1, ...],
//!   "coefficients": [[...], ...],   // one row per class
//!   "intercepts": [...]             // one per class
//! }
//! ```
//!
//! The predicted label is the class with the highest decision value
//! `w·x + b`; ties go to the class listed first.
//!
//! # Integrity
//!
//! When a SHA-256 pin is configured, the artifact bytes must hash to it before
//! they are parsed. This binds the deployed model to a known export.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ports::{Classifier, ClassifierError};

/// File name of the model artifact inside the models directory.
pub const MODEL_FILE: &str = "svc.json";

const SUPPORTED_FORMAT_VERSION: u32 = 1;

/// Errors while loading a model artifact.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("Model file {0:?} not found")]
    NotFound(PathBuf),

    #[error("Cannot read model file {path:?}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Model digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("Invalid model format: {0}")]
    Format(String),
}

/// Model parameters as exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedLinearSvc {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    pub classes: Vec<u32>,
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl ExportedLinearSvc {
    /// Check that all parameter shapes agree.
    ///
    /// # Errors
    /// Returns `ModelLoadError::Format` describing the first inconsistency.
    pub fn validate(&self) -> Result<(), ModelLoadError> {
        if self.format_version != SUPPORTED_FORMAT_VERSION {
            return Err(ModelLoadError::Format(format!(
                "Unsupported format_version: {}",
                self.format_version
            )));
        }

        let n_features = self.feature_names.len();
        let n_classes = self.classes.len();
        if n_features == 0 {
            return Err(ModelLoadError::Format("Model has no features".into()));
        }
        if n_classes < 2 {
            return Err(ModelLoadError::Format(format!(
                "Model needs at least 2 classes, got {n_classes}"
            )));
        }
        if self.coefficients.len() != n_classes || self.intercepts.len() != n_classes {
            return Err(ModelLoadError::Format(format!(
                "Expected {n_classes} coefficient rows and intercepts, got {} and {}",
                self.coefficients.len(),
                self.intercepts.len()
            )));
        }
        if let Some((i, row)) = self
            .coefficients
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != n_features)
        {
            return Err(ModelLoadError::Format(format!(
                "Coefficient row {i} has {} entries, expected {n_features}",
                row.len()
            )));
        }

        let mut sorted = self.classes.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != n_classes {
            return Err(ModelLoadError::Format("Duplicate class labels".into()));
        }

        let finite = self
            .coefficients
            .iter()
            .flatten()
            .chain(self.intercepts.iter())
            .all(|v| v.is_finite());
        if !finite {
            return Err(ModelLoadError::Format(
                "Model parameters contain NaN or infinite values".into(),
            ));
        }

        Ok(())
    }
}

/// Classifier backed by an exported linear SVC.
#[derive(Debug, Clone)]
pub struct LinearSvcAdapter {
    model: ExportedLinearSvc,
    digest: String,
}

impl LinearSvcAdapter {
    /// Build an adapter from already-parsed parameters.
    ///
    /// # Errors
    /// Returns `ModelLoadError::Format` if the parameters are inconsistent.
    pub fn from_model(model: ExportedLinearSvc) -> Result<Self, ModelLoadError> {
        model.validate()?;
        let bytes = serde_json::to_vec(&model).map_err(|e| ModelLoadError::Format(e.to_string()))?;
        Ok(Self {
            digest: sha256_hex(&bytes),
            model,
        })
    }

    /// Load `svc.json` from a models directory (or a direct file path).
    ///
    /// # Errors
    /// - `NotFound` if the artifact does not exist
    /// - `Io` if it cannot be read
    /// - `DigestMismatch` if `expected_sha256` is set and does not match
    /// - `Format` if the JSON is malformed or inconsistent
    pub fn load(path: &Path, expected_sha256: Option<&str>) -> Result<Self, ModelLoadError> {
        let model_path = if path.is_dir() {
            path.join(MODEL_FILE)
        } else {
            path.to_path_buf()
        };

        let bytes = match std::fs::read(&model_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ModelLoadError::NotFound(model_path));
            }
            Err(e) => {
                return Err(ModelLoadError::Io {
                    path: model_path,
                    message: e.to_string(),
                });
            }
        };

        let digest = sha256_hex(&bytes);
        if let Some(expected) = expected_sha256 {
            if !digest.eq_ignore_ascii_case(expected.trim()) {
                return Err(ModelLoadError::DigestMismatch {
                    expected: expected.trim().to_lowercase(),
                    actual: digest,
                });
            }
        }

        let model: ExportedLinearSvc =
            serde_json::from_slice(&bytes).map_err(|e| ModelLoadError::Format(e.to_string()))?;
        model.validate()?;

        tracing::info!(
            "Loaded model from {:?} (n_features={}, n_classes={}, sha256={})",
            model_path,
            model.feature_names.len(),
            model.classes.len(),
            digest
        );

        Ok(Self { model, digest })
    }

    /// SHA-256 of the artifact bytes, hex encoded.
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }

    fn decision_values(&self, features: &[f64]) -> Vec<f64> {
        self.model
            .coefficients
            .iter()
            .zip(&self.model.intercepts)
            .map(|(w, b)| w.iter().zip(features).map(|(wi, xi)| wi * xi).sum::<f64>() + b)
            .collect()
    }
}

impl Classifier for LinearSvcAdapter {
    fn feature_names(&self) -> &[String] {
        &self.model.feature_names
    }

    fn labels(&self) -> &[u32] {
        &self.model.classes
    }

    fn predict(&self, features: &[f64]) -> Result<u32, ClassifierError> {
        let expected = self.model.feature_names.len();
        if features.len() != expected {
            return Err(ClassifierError::DimensionMismatch {
                expected,
                got: features.len(),
            });
        }

        let scores = self.decision_values(features);
        let mut best: Option<(usize, f64)> = None;
        for (i, score) in scores.into_iter().enumerate() {
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((i, score)),
            }
        }

        best.map(|(i, _)| self.model.classes[i])
            .ok_or(ClassifierError::NoDecision)
    }
}

/// Hex-encoded SHA-256 of a byte slice.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_model() -> ExportedLinearSvc {
        ExportedLinearSvc {
            format_version: 1,
            feature_names: vec!["a".into(), "b".into(), "c".into()],
            classes: vec![7, 3],
            coefficients: vec![vec![1.0, 0.0, -1.0], vec![-1.0, 1.0, 0.5]],
            intercepts: vec![0.0, 0.0],
        }
    }

    #[test]
    fn test_predict_argmax() {
        let svc = LinearSvcAdapter::from_model(toy_model()).expect("Should build");
        assert_eq!(svc.predict(&[1.0, 0.0, 0.0]), Ok(7));
        assert_eq!(svc.predict(&[0.0, 1.0, 0.0]), Ok(3));
    }

    #[test]
    fn test_ties_go_to_first_class() {
        let svc = LinearSvcAdapter::from_model(toy_model()).expect("Should build");
        assert_eq!(svc.predict(&[0.0, 0.0, 0.0]), Ok(7));
    }

    #[test]
    fn test_dimension_mismatch() {
        let svc = LinearSvcAdapter::from_model(toy_model()).expect("Should build");
        assert_eq!(
            svc.predict(&[1.0]),
            Err(ClassifierError::DimensionMismatch { expected: 3, got: 1 })
        );
    }

    #[test]
    fn test_validate_rejects_bad_shapes() {
        let mut model = toy_model();
        model.intercepts.pop();
        assert!(matches!(
            LinearSvcAdapter::from_model(model),
            Err(ModelLoadError::Format(_))
        ));

        let mut model = toy_model();
        model.coefficients[1].push(0.0);
        assert!(model.validate().is_err());

        let mut model = toy_model();
        model.classes = vec![3, 3];
        assert!(model.validate().is_err());

        let mut model = toy_model();
        model.intercepts[0] = f64::NAN;
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_load_from_dir_and_digest_pin() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let bytes = serde_json::to_vec(&toy_model()).expect("Should serialize");
        std::fs::write(dir.path().join(MODEL_FILE), &bytes).expect("Should write");
        let digest = sha256_hex(&bytes);

        let svc = LinearSvcAdapter::load(dir.path(), None).expect("Should load");
        assert_eq!(svc.digest(), digest);
        assert_eq!(svc.labels(), &[7, 3]);

        let pinned = LinearSvcAdapter::load(dir.path(), Some(&digest.to_uppercase()));
        assert!(pinned.is_ok());

        let wrong = LinearSvcAdapter::load(dir.path(), Some(&"0".repeat(64)));
        assert!(matches!(wrong, Err(ModelLoadError::DigestMismatch { .. })));
    }

    #[test]
    fn test_load_missing_and_malformed() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        assert!(matches!(
            LinearSvcAdapter::load(dir.path(), None),
            Err(ModelLoadError::NotFound(_))
        ));

        std::fs::write(dir.path().join(MODEL_FILE), b"{not json").expect("Should write");
        assert!(matches!(
            LinearSvcAdapter::load(dir.path(), None),
            Err(ModelLoadError::Format(_))
        ));
    }
}
