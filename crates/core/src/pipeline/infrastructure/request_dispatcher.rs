use std::io::{BufRead, Write};
use std::thread::{Scope, ScopedJoinHandle};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::pipeline::pipeline_orchestrator::PipelineOrchestrator;
use crate::shared::image_result::ImageResult;

const DETECT_OBJECTS: &str = "detect_objects";
const DETECT_FACES: &str = "detect_faces";

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("failed to read requests: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to write response: {0}")]
    Write(#[source] std::io::Error),
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("{0} worker panicked")]
    WorkerPanicked(&'static str),
}

/// The two calls a client can make.
pub trait RecognitionService: Send + Sync {
    fn detect_objects(&self, image_paths: &[String]) -> Vec<ImageResult>;
    fn detect_faces(&self, results: &[ImageResult]) -> Vec<ImageResult>;
}

impl RecognitionService for PipelineOrchestrator {
    fn detect_objects(&self, image_paths: &[String]) -> Vec<ImageResult> {
        PipelineOrchestrator::detect_objects(self, image_paths)
    }

    fn detect_faces(&self, results: &[ImageResult]) -> Vec<ImageResult> {
        PipelineOrchestrator::detect_faces(self, results)
    }
}

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    id: Value,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct Response {
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Response {
    fn from_outcome(id: Value, outcome: Result<Value, String>) -> Self {
        match outcome {
            Ok(result) => Self {
                id,
                result: Some(result),
                error: None,
            },
            Err(error) => Self {
                id,
                result: None,
                error: Some(error),
            },
        }
    }
}

struct Job {
    id: Value,
    params: Value,
}

/// Answers newline-delimited JSON requests until `input` ends.
///
/// Object and face requests run on separate worker threads, so a slow
/// face batch does not hold up object requests. Responses are written as
/// they complete; clients correlate them by `id`. Returns the number of
/// responses written.
pub fn serve<R, W>(service: &dyn RecognitionService, input: R, output: W) -> Result<usize, DispatchError>
where
    R: BufRead,
    W: Write + Send,
{
    let (objects_tx, objects_rx) = crossbeam_channel::unbounded::<Job>();
    let (faces_tx, faces_rx) = crossbeam_channel::unbounded::<Job>();
    let (response_tx, response_rx) = crossbeam_channel::unbounded::<Response>();

    std::thread::scope(|scope| {
        let objects_worker = spawn_worker(scope, objects_rx, response_tx.clone(), |params| {
            let paths: Vec<String> = parse_params(params)?;
            encode(service.detect_objects(&paths))
        });
        let faces_worker = spawn_worker(scope, faces_rx, response_tx.clone(), |params| {
            let results: Vec<ImageResult> = parse_params(params)?;
            encode(service.detect_faces(&results))
        });
        let writer = scope.spawn(move || write_responses(output, response_rx));

        let read_result = read_requests(input, &objects_tx, &faces_tx, &response_tx);

        // Closing the job queues lets the workers drain and exit.
        drop(objects_tx);
        drop(faces_tx);
        drop(response_tx);

        objects_worker
            .join()
            .map_err(|_| DispatchError::WorkerPanicked(DETECT_OBJECTS))?;
        faces_worker
            .join()
            .map_err(|_| DispatchError::WorkerPanicked(DETECT_FACES))?;
        let written = writer
            .join()
            .map_err(|_| DispatchError::WorkerPanicked("writer"))??;
        read_result?;
        log::info!("request stream closed after {written} responses");
        Ok(written)
    })
}

fn read_requests<R: BufRead>(
    input: R,
    objects_tx: &crossbeam_channel::Sender<Job>,
    faces_tx: &crossbeam_channel::Sender<Job>,
    response_tx: &crossbeam_channel::Sender<Response>,
) -> Result<(), DispatchError> {
    // Raw bytes: a line that is not UTF-8 is a bad request, not a read failure.
    for line in input.split(b'\n') {
        let line = line.map_err(DispatchError::Read)?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let request: Request = match serde_json::from_slice(&line) {
            Ok(request) => request,
            Err(e) => {
                log::error!("malformed request: {e}");
                let _ = response_tx.send(Response::from_outcome(
                    Value::Null,
                    Err(format!("malformed request: {e}")),
                ));
                continue;
            }
        };
        log::debug!("request {} {}", request.id, request.method);

        let queue = match request.method.as_str() {
            DETECT_OBJECTS => objects_tx,
            DETECT_FACES => faces_tx,
            other => {
                let _ = response_tx.send(Response::from_outcome(
                    request.id,
                    Err(format!("unknown method: {other}")),
                ));
                continue;
            }
        };
        let job = Job {
            id: request.id,
            params: request.params,
        };
        if queue.send(job).is_err() {
            break;
        }
    }
    Ok(())
}

fn spawn_worker<'scope, 'env, F>(
    scope: &'scope Scope<'scope, 'env>,
    jobs: crossbeam_channel::Receiver<Job>,
    responses: crossbeam_channel::Sender<Response>,
    handle: F,
) -> ScopedJoinHandle<'scope, ()>
where
    F: Fn(Value) -> Result<Value, String> + Send + 'scope,
{
    scope.spawn(move || {
        for job in jobs {
            let response = Response::from_outcome(job.id, handle(job.params));
            if responses.send(response).is_err() {
                break;
            }
        }
    })
}

fn write_responses<W: Write>(
    mut output: W,
    responses: crossbeam_channel::Receiver<Response>,
) -> Result<usize, DispatchError> {
    let mut written = 0;
    for response in responses {
        let line = serde_json::to_string(&response)?;
        writeln!(output, "{line}").map_err(DispatchError::Write)?;
        output.flush().map_err(DispatchError::Write)?;
        written += 1;
    }
    Ok(written)
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, String> {
    serde_json::from_value(params).map_err(|e| format!("invalid params: {e}"))
}

fn encode(results: Vec<ImageResult>) -> Result<Value, String> {
    serde_json::to_value(results).map_err(|e| e.to_string())
}
