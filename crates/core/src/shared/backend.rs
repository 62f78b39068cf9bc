/// Error returned by model backends.
///
/// Backends are shared across threads, so their errors must be too.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;
