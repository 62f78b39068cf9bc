use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::detection::domain::label_map::LabelMapError;
use crate::recognition::infrastructure::linear_identity_classifier::ClassifierLoadError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("model file not found for {key}: {path}")]
    MissingModel { key: &'static str, path: PathBuf },
    #[error(transparent)]
    LabelMap(#[from] LabelMapError),
    #[error(transparent)]
    Classifier(#[from] ClassifierLoadError),
    #[error("failed to load {key} from {path}: {reason}")]
    Backend {
        key: &'static str,
        path: PathBuf,
        reason: String,
    },
}

/// Object detection settings (`objDetServer`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectStageConfig {
    pub obj_model_path: PathBuf,
    pub label_map_path: PathBuf,
    /// Frames after an inferred one that reuse its labels.
    pub conseq_images_to_skip: u32,
    pub min_score: f64,
    #[serde(default)]
    pub mount_point: String,
}

/// Face detection and recognition settings (`faceDetServer`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceStageConfig {
    pub face_det_model_path: PathBuf,
    pub face_emb_model_path: PathBuf,
    pub svm_model_path: PathBuf,
    pub min_svm_proba: f64,
    pub focus_measure_threshold: f64,
    pub min_face: u32,
    #[serde(default = "default_jitters")]
    pub num_jitters: u32,
    /// Falls back to the object stage's mount point when absent.
    #[serde(default)]
    pub mount_point: Option<String>,
}

fn default_jitters() -> u32 {
    1
}

/// Server configuration. Keys the pipeline does not use (transport
/// pipes, heartbeats) are accepted and ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub obj_det_server: ObjectStageConfig,
    pub face_det_server: FaceStageConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config = Self::parse(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Checks thresholds. Model paths are checked when backends are loaded.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let obj = &self.obj_det_server;
        let face = &self.face_det_server;
        check_unit_interval("objDetServer.minScore", obj.min_score)?;
        check_unit_interval("faceDetServer.minSvmProba", face.min_svm_proba)?;
        if !face.focus_measure_threshold.is_finite() || face.focus_measure_threshold < 0.0 {
            return Err(ConfigError::Invalid {
                key: "faceDetServer.focusMeasureThreshold",
                reason: format!(
                    "must be a non-negative number, got {}",
                    face.focus_measure_threshold
                ),
            });
        }
        if face.num_jitters == 0 {
            return Err(ConfigError::Invalid {
                key: "faceDetServer.numJitters",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn face_mount_point(&self) -> &str {
        self.face_det_server
            .mount_point
            .as_deref()
            .unwrap_or(&self.obj_det_server.mount_point)
    }

    /// Replaces both stages' mount points.
    pub fn override_mount_point(&mut self, mount_point: &str) {
        self.obj_det_server.mount_point = mount_point.to_string();
        self.face_det_server.mount_point = Some(mount_point.to_string());
    }
}

fn check_unit_interval(key: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("must be between 0.0 and 1.0, got {value}"),
        });
    }
    Ok(())
}

/// Fails with [`ConfigError::MissingModel`] unless `path` is an existing file.
pub fn require_file(key: &'static str, path: &Path) -> Result<(), ConfigError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ConfigError::MissingModel {
            key,
            path: path.to_path_buf(),
        })
    }
}
