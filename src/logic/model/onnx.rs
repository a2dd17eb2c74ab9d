//! ONNX-backed classifier.
//!
//! Loads an exported classification graph plus its label map. The graph
//! contract: float32 `[1, N]` input, output either a class-probability
//! tensor (confidence = max probability) or an int64 class-index tensor
//! (no probability estimate, confidence absent).

use std::path::Path;

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;

use crate::logic::error::{ScanError, ScanResult};

use super::LabelClassifier;

pub struct OnnxClassifier {
    session: Mutex<Session>,
    labels: Vec<String>,
}

impl OnnxClassifier {
    pub fn load(model_path: &Path, labels_path: &Path) -> ScanResult<Self> {
        if !model_path.exists() {
            return Err(ScanError::ResourceLoad(format!(
                "model not found: {:?}",
                model_path
            )));
        }

        let raw = std::fs::read_to_string(labels_path)
            .map_err(|e| ScanError::ResourceLoad(format!("label map {:?}: {}", labels_path, e)))?;
        let labels: Vec<String> = serde_json::from_str(&raw)
            .map_err(|e| ScanError::ResourceLoad(format!("label map {:?}: {}", labels_path, e)))?;
        if labels.is_empty() {
            return Err(ScanError::ResourceLoad(format!(
                "label map {:?} is empty",
                labels_path
            )));
        }

        let session = Session::builder()
            .map_err(|e| ScanError::ResourceLoad(format!("session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ScanError::ResourceLoad(format!("optimization level: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| ScanError::ResourceLoad(format!("model {:?}: {}", model_path, e)))?;

        log::info!(
            "ONNX classifier loaded from {:?} ({} labels)",
            model_path,
            labels.len()
        );

        Ok(Self {
            session: Mutex::new(session),
            labels,
        })
    }

    fn decode(&self, index: usize) -> ScanResult<String> {
        self.labels
            .get(index)
            .cloned()
            .ok_or_else(|| ScanError::PerFlow(format!("class index {} out of label range", index)))
    }
}

impl LabelClassifier for OnnxClassifier {
    fn predict_with_confidence(&self, row: &[f32]) -> ScanResult<(String, Option<f64>)> {
        let mut session = self.session.lock();

        let output_names: Vec<String> =
            session.outputs().iter().map(|o| o.name().to_string()).collect();
        if output_names.is_empty() {
            return Err(ScanError::PerFlow("model defines no outputs".to_string()));
        }

        let array = Array2::<f32>::from_shape_vec((1, row.len()), row.to_vec())
            .map_err(|e| ScanError::PerFlow(format!("input shape: {}", e)))?;
        let input_tensor = Value::from_array(array)
            .map_err(|e| ScanError::PerFlow(format!("input tensor: {}", e)))?;

        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| ScanError::PerFlow(format!("inference failed: {}", e)))?;

        // Prefer a probability tensor: one score per known label.
        for name in &output_names {
            let Some(value) = outputs.get(name) else {
                continue;
            };
            if let Ok((_, scores)) = value.try_extract_tensor::<f32>() {
                if scores.len() == self.labels.len() {
                    let (index, max) = scores.iter().enumerate().fold(
                        (0usize, f32::MIN),
                        |(best_i, best), (i, &score)| {
                            if score > best {
                                (i, score)
                            } else {
                                (best_i, best)
                            }
                        },
                    );
                    return Ok((self.decode(index)?, Some(max as f64)));
                }
            }
        }

        // Fall back to a class-index tensor: label only, no probability.
        for name in &output_names {
            let Some(value) = outputs.get(name) else {
                continue;
            };
            if let Ok((_, indices)) = value.try_extract_tensor::<i64>() {
                if let Some(&index) = indices.first() {
                    return Ok((self.decode(index.max(0) as usize)?, None));
                }
            }
        }

        Err(ScanError::PerFlow(
            "model produced no usable output tensor".to_string(),
        ))
    }
}
