//! Feature scaler loaded from training parameters.
//!
//! `scaler.json` carries the per-feature mean and scale fit offline, in
//! layout order. Transform output is f32, the dtype the ONNX graphs expect.

use std::path::Path;

use serde::Deserialize;

use crate::logic::error::{ScanError, ScanResult};
use crate::logic::features::{FeatureVector, FEATURE_COUNT};

use super::FeatureScaler;

#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn load(path: &Path) -> ScanResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ScanError::ResourceLoad(format!("scaler {:?}: {}", path, e)))?;
        let scaler: StandardScaler = serde_json::from_str(&raw)
            .map_err(|e| ScanError::ResourceLoad(format!("scaler {:?}: {}", path, e)))?;

        if scaler.mean.len() != FEATURE_COUNT || scaler.scale.len() != FEATURE_COUNT {
            return Err(ScanError::ResourceLoad(format!(
                "scaler {:?}: expected {} parameters, got mean={} scale={}",
                path,
                FEATURE_COUNT,
                scaler.mean.len(),
                scaler.scale.len()
            )));
        }
        Ok(scaler)
    }

    #[cfg(test)]
    pub fn from_params(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self { mean, scale }
    }
}

impl FeatureScaler for StandardScaler {
    fn transform(&self, features: &FeatureVector) -> ScanResult<Vec<f32>> {
        let row = features
            .values()
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(value, (mean, scale))| {
                let divisor = if scale.abs() > 1e-8 { *scale } else { 1.0 };
                ((value - mean) / divisor) as f32
            })
            .collect();
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_standardizes_in_layout_order() {
        let mut mean = vec![0.0; FEATURE_COUNT];
        let mut scale = vec![1.0; FEATURE_COUNT];
        mean[0] = 10.0;
        scale[0] = 2.0;

        let scaler = StandardScaler::from_params(mean, scale);
        let mut features = FeatureVector::zeroed();
        features.set_index(0, 14.0);

        let row = scaler.transform(&features).unwrap();
        assert_eq!(row.len(), FEATURE_COUNT);
        assert!((row[0] - 2.0).abs() < 1e-6);
        assert_eq!(row[1], 0.0);
    }

    #[test]
    fn test_zero_scale_does_not_divide_by_zero() {
        let scaler =
            StandardScaler::from_params(vec![0.0; FEATURE_COUNT], vec![0.0; FEATURE_COUNT]);
        let mut features = FeatureVector::zeroed();
        features.set_index(3, 7.5);

        let row = scaler.transform(&features).unwrap();
        assert!((row[3] - 7.5).abs() < 1e-6);
        assert!(row.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_load_rejects_wrong_parameter_count() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("scaler.json");
        std::fs::write(&path, r#"{"mean":[0.0],"scale":[1.0]}"#).unwrap();

        let err = StandardScaler::load(&path).unwrap_err();
        assert!(matches!(err, ScanError::ResourceLoad(_)));
    }
}
