/// Errors from the host-side adapters.
///
/// Mission-facing adapters (the CSV feed) swallow these and count them —
/// a bad file must never fault the mission. Only the durable log writer
/// surfaces them to the caller.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
