use std::path::Path;
use std::sync::Arc;

use crate::detection::domain::face_extraction_stage::FaceExtractionStage;
use crate::detection::domain::label_map::LabelMap;
use crate::detection::domain::object_detection_stage::ObjectDetectionStage;
use crate::detection::infrastructure::onnx_ssd_detector::OnnxSsdDetector;
use crate::imaging::infrastructure::file_image_source::FileImageSource;
use crate::pipeline::detect_faces_use_case::DetectFacesUseCase;
use crate::pipeline::detect_objects_use_case::DetectObjectsUseCase;
use crate::pipeline::pipeline_orchestrator::PipelineOrchestrator;
use crate::recognition::domain::face_identity_stage::FaceIdentityStage;
use crate::recognition::domain::face_quality_gate::FaceQualityGate;
use crate::recognition::infrastructure::linear_identity_classifier::LinearIdentityClassifier;
use crate::recognition::infrastructure::onnx_face_encoder::OnnxFaceEncoder;
use crate::shared::backend::BackendError;
use crate::shared::config::{require_file, Config, ConfigError};
use crate::shared::constants::{FACE_INPUT_SIZE, OBJECT_INPUT_SIZE};

/// Loads every model named in `config` and wires both passes.
pub fn build_orchestrator(config: &Config) -> Result<PipelineOrchestrator, ConfigError> {
    let obj = &config.obj_det_server;
    let face = &config.face_det_server;

    require_file("objDetServer.objModelPath", &obj.obj_model_path)?;
    require_file("objDetServer.labelMapPath", &obj.label_map_path)?;
    require_file("faceDetServer.faceDetModelPath", &face.face_det_model_path)?;
    require_file("faceDetServer.faceEmbModelPath", &face.face_emb_model_path)?;
    require_file("faceDetServer.svmModelPath", &face.svm_model_path)?;

    let labels = LabelMap::from_file(&obj.label_map_path)?;
    log::info!("loaded {} object labels", labels.len());

    let object_detector = backend("objDetServer.objModelPath", &obj.obj_model_path, |p| {
        OnnxSsdDetector::new(p, OBJECT_INPUT_SIZE)
    })?;
    let face_detector = backend("faceDetServer.faceDetModelPath", &face.face_det_model_path, |p| {
        OnnxSsdDetector::new(p, FACE_INPUT_SIZE)
    })?;
    let encoder = backend(
        "faceDetServer.faceEmbModelPath",
        &face.face_emb_model_path,
        OnnxFaceEncoder::new,
    )?;
    let classifier = LinearIdentityClassifier::from_file(&face.svm_model_path)?;

    let objects = DetectObjectsUseCase::new(
        Arc::new(FileImageSource::new(obj.mount_point.clone())),
        ObjectDetectionStage::new(Arc::new(object_detector), Arc::new(labels), obj.min_score),
        obj.conseq_images_to_skip,
    );
    let faces = DetectFacesUseCase::new(
        Arc::new(FileImageSource::new(config.face_mount_point())),
        FaceExtractionStage::new(Arc::new(face_detector)),
        FaceQualityGate::new(face.min_face, face.focus_measure_threshold),
        FaceIdentityStage::new(
            Arc::new(encoder),
            Arc::new(classifier),
            face.num_jitters,
            face.min_svm_proba,
        ),
    );
    Ok(PipelineOrchestrator::new(objects, faces))
}

fn backend<T>(
    key: &'static str,
    path: &Path,
    load: impl FnOnce(&Path) -> Result<T, BackendError>,
) -> Result<T, ConfigError> {
    load(path).map_err(|e| ConfigError::Backend {
        key,
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
