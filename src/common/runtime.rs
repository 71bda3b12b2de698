use tokio::runtime::Runtime;

/// Builds the single-threaded runtime that drives one mock server listener.
pub(crate) fn new_current_thread() -> std::io::Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}
