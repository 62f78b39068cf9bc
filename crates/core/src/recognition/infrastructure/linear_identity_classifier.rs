use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::recognition::domain::identity_classifier::IdentityClassifier;
use crate::shared::backend::BackendError;
use crate::shared::constants::EMBEDDING_DIM;

#[derive(Error, Debug)]
pub enum ClassifierLoadError {
    #[error("failed to read classifier {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse classifier {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed classifier: {0}")]
    Shape(String),
}

/// On-disk form: one coefficient row and intercept per class.
#[derive(Debug, Deserialize)]
struct LinearModel {
    classes: Vec<String>,
    coefficients: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
}

/// Multi-class linear face classifier (one-vs-rest decision scores,
/// softmax-normalized into probabilities).
#[derive(Debug)]
pub struct LinearIdentityClassifier {
    classes: Vec<String>,
    coefficients: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
}

impl LinearIdentityClassifier {
    pub fn from_file(path: &Path) -> Result<Self, ClassifierLoadError> {
        let raw = fs::read_to_string(path).map_err(|e| ClassifierLoadError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let model: LinearModel = serde_json::from_str(&raw).map_err(|e| ClassifierLoadError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        let classifier = Self::from_parts(model.classes, model.coefficients, model.intercepts)?;
        log::info!(
            "loaded classifier {} with {} identities",
            path.display(),
            classifier.classes.len()
        );
        Ok(classifier)
    }

    pub fn from_parts(
        classes: Vec<String>,
        coefficients: Vec<Vec<f64>>,
        intercepts: Vec<f64>,
    ) -> Result<Self, ClassifierLoadError> {
        if classes.is_empty() {
            return Err(ClassifierLoadError::Shape("no classes".to_string()));
        }
        if coefficients.len() != classes.len() || intercepts.len() != classes.len() {
            return Err(ClassifierLoadError::Shape(format!(
                "{} classes but {} coefficient rows and {} intercepts",
                classes.len(),
                coefficients.len(),
                intercepts.len()
            )));
        }
        if let Some((i, row)) = coefficients
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != EMBEDDING_DIM)
        {
            return Err(ClassifierLoadError::Shape(format!(
                "coefficient row {i} has {} columns, expected {EMBEDDING_DIM}",
                row.len()
            )));
        }
        Ok(Self {
            classes,
            coefficients,
            intercepts,
        })
    }
}

impl IdentityClassifier for LinearIdentityClassifier {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict_proba(&self, encoding: &[f32]) -> Result<Vec<f64>, BackendError> {
        if encoding.len() != EMBEDDING_DIM {
            return Err(format!(
                "encoding has {} values, expected {EMBEDDING_DIM}",
                encoding.len()
            )
            .into());
        }
        let scores: Vec<f64> = self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(row, b)| row.iter().zip(encoding).map(|(w, x)| w * *x as f64).sum::<f64>() + b)
            .collect();
        Ok(softmax(&scores))
    }
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}
