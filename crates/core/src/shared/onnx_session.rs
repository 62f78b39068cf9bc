use std::path::Path;

use ort::execution_providers::ExecutionProviderDispatch;

use crate::shared::backend::BackendError;

/// Hardware execution providers for this platform; ONNX Runtime falls
/// back to CPU for anything they cannot run.
#[allow(unused_mut)]
fn platform_execution_providers() -> Vec<ExecutionProviderDispatch> {
    let mut providers = Vec::new();
    #[cfg(target_os = "macos")]
    providers.push(ort::execution_providers::CoreMLExecutionProvider::default().build());
    #[cfg(target_os = "windows")]
    providers.push(ort::execution_providers::DirectMLExecutionProvider::default().build());
    providers
}

/// Opens an inference session for `model_path`.
///
/// Inter-op parallelism is pinned to one thread: requests are already
/// spread over one worker per stage.
pub fn open_session(model_path: &Path) -> Result<ort::session::Session, BackendError> {
    let intra_threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let session = ort::session::Session::builder()?
        .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
        .with_inter_threads(1)?
        .with_intra_threads(intra_threads)?
        .with_execution_providers(platform_execution_providers())?
        .commit_from_file(model_path)?;
    log::info!("loaded model {}", model_path.display());
    Ok(session)
}

/// Square spatial size declared by the model's first input, if static.
///
/// Handles both NHWC (`[1, H, W, 3]`) and NCHW (`[1, 3, H, W]`) layouts.
pub fn declared_input_size(session: &ort::session::Session) -> Option<u32> {
    let input = session.inputs().first()?;
    let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() else {
        return None;
    };
    spatial_size(shape)
}

fn spatial_size(shape: &[i64]) -> Option<u32> {
    if shape.len() < 4 {
        return None;
    }
    let h = if shape[3] == 3 { shape[1] } else { shape[2] };
    (h > 0).then_some(h as u32)
}
