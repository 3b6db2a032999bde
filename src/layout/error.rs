use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("layout backend `{backend}` failed: {message}")]
    Solver {
        backend: &'static str,
        message: String,
    },
    #[error("layout backend `{backend}` returned no positions for {expected} nodes")]
    EmptyOutput {
        backend: &'static str,
        expected: usize,
    },
    #[error("layout backend `{0}` is not compiled in")]
    Unavailable(&'static str),
}
