#![allow(dead_code)]

//! Model Module - preprocessing + inference adapters.
//!
//! The scaler and classifier are opaque artifacts produced by the offline
//! training pipeline; this module only aligns their contracts. The adapter
//! is stateless aside from the loaded artifacts and never mutates input.

pub mod onnx;
pub mod scaler;

use std::path::PathBuf;

use crate::logic::error::{ScanError, ScanResult};
use crate::logic::features::FeatureVector;

use onnx::OnnxClassifier;
use scaler::StandardScaler;

// ============================================================================
// MODEL SELECTION
// ============================================================================

/// The classifiers the training pipeline exports. Identifiers match the
/// frontend model picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    RandomForest,
    IsolationForest,
    Svm,
    Mlp,
    LogisticRegression,
}

impl ModelKind {
    pub const DEFAULT: ModelKind = ModelKind::RandomForest;

    /// Parse a model identifier. Accepts the camelCase wire form as well as
    /// spaced/underscored display names, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "randomforest" | "rf" => Some(Self::RandomForest),
            "isolationforest" => Some(Self::IsolationForest),
            "svm" => Some(Self::Svm),
            "mlp" => Some(Self::Mlp),
            "logisticregression" | "logreg" => Some(Self::LogisticRegression),
            _ => None,
        }
    }

    /// Resolve a requested identifier, falling back to the default with a
    /// warning instead of failing the session.
    pub fn resolve_or_default(requested: Option<&str>) -> Self {
        match requested {
            None => Self::DEFAULT,
            Some(raw) => match Self::parse(raw) {
                Some(kind) => kind,
                None => {
                    log::warn!(
                        "Unknown model identifier '{}'; falling back to {}",
                        raw,
                        Self::DEFAULT.id()
                    );
                    Self::DEFAULT
                }
            },
        }
    }

    /// Wire identifier, recorded in the session summary.
    pub fn id(&self) -> &'static str {
        match self {
            Self::RandomForest => "randomForest",
            Self::IsolationForest => "isolationForest",
            Self::Svm => "svm",
            Self::Mlp => "mlp",
            Self::LogisticRegression => "logisticRegression",
        }
    }

    /// File stem of the exported ONNX graph.
    pub fn artifact_stem(&self) -> &'static str {
        match self {
            Self::RandomForest => "rf_model",
            Self::IsolationForest => "iforest_model",
            Self::Svm => "svm_model",
            Self::Mlp => "mlp_model",
            Self::LogisticRegression => "logreg_model",
        }
    }
}

// ============================================================================
// ARTIFACT CONTRACTS
// ============================================================================

/// Feature preprocessing fit during training.
pub trait FeatureScaler: Send {
    fn transform(&self, features: &FeatureVector) -> ScanResult<Vec<f32>>;
}

/// Trained classifier plus its label decoder.
pub trait LabelClassifier: Send {
    /// Returns the decoded label and, when the model exposes probability
    /// estimates, the maximum class probability. An absent confidence is a
    /// valid outcome, not an error.
    fn predict_with_confidence(&self, row: &[f32]) -> ScanResult<(String, Option<f64>)>;
}

/// Scaler + classifier pair driving one session.
pub struct InferenceAdapter {
    scaler: Box<dyn FeatureScaler>,
    classifier: Box<dyn LabelClassifier>,
}

impl InferenceAdapter {
    pub fn new(scaler: Box<dyn FeatureScaler>, classifier: Box<dyn LabelClassifier>) -> Self {
        Self {
            scaler,
            classifier,
        }
    }

    pub fn predict(&self, features: &FeatureVector) -> ScanResult<String> {
        Ok(self.predict_with_confidence(features)?.0)
    }

    pub fn predict_with_confidence(
        &self,
        features: &FeatureVector,
    ) -> ScanResult<(String, Option<f64>)> {
        let row = self.scaler.transform(features)?;
        self.classifier.predict_with_confidence(&row)
    }
}

// ============================================================================
// ARTIFACT LOADING
// ============================================================================

/// Source of trained artifacts. Sessions resolve their adapter through this
/// boundary so tests can substitute stubs.
pub trait ArtifactStore: Send + Sync {
    fn load(&self, kind: ModelKind) -> ScanResult<InferenceAdapter>;
}

/// Production store: artifacts on disk under the models directory.
pub struct DiskArtifacts {
    models_dir: PathBuf,
}

impl DiskArtifacts {
    pub fn new(models_dir: PathBuf) -> Self {
        Self { models_dir }
    }
}

impl ArtifactStore for DiskArtifacts {
    fn load(&self, kind: ModelKind) -> ScanResult<InferenceAdapter> {
        let scaler = StandardScaler::load(&self.models_dir.join("scaler.json"))?;
        let model_path = self
            .models_dir
            .join(format!("{}.onnx", kind.artifact_stem()));
        let labels_path = self.models_dir.join("label_map.json");
        let classifier = OnnxClassifier::load(&model_path, &labels_path)?;
        log::info!("Loaded {} artifacts from {:?}", kind.id(), self.models_dir);
        Ok(InferenceAdapter::new(
            Box::new(scaler),
            Box::new(classifier),
        ))
    }
}
