use crate::pipeline::detect_faces_use_case::DetectFacesUseCase;
use crate::pipeline::detect_objects_use_case::DetectObjectsUseCase;
use crate::shared::image_result::ImageResult;

/// Both recognition passes over one set of loaded backends.
///
/// Each call owns its own skip state, so one orchestrator can serve
/// concurrent batches through `&self`.
pub struct PipelineOrchestrator {
    objects: DetectObjectsUseCase,
    faces: DetectFacesUseCase,
}

impl PipelineOrchestrator {
    pub fn new(objects: DetectObjectsUseCase, faces: DetectFacesUseCase) -> Self {
        Self { objects, faces }
    }

    pub fn detect_objects<S: AsRef<str>>(&self, image_paths: &[S]) -> Vec<ImageResult> {
        self.objects.execute(image_paths)
    }

    pub fn detect_faces(&self, results: &[ImageResult]) -> Vec<ImageResult> {
        self.faces.execute(results)
    }

    /// Object pass followed by the face pass on its output.
    pub fn run<S: AsRef<str>>(&self, image_paths: &[S]) -> Vec<ImageResult> {
        self.detect_faces(&self.detect_objects(image_paths))
    }

    pub fn detect_objects_json<S: AsRef<str>>(&self, image_paths: &[S]) -> Result<String, serde_json::Error> {
        self.objects.execute_json(image_paths)
    }

    pub fn detect_faces_json(&self, object_results: &str) -> Result<String, serde_json::Error> {
        self.faces.execute_json(object_results)
    }
}
