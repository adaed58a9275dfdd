use tracing::Level;

/// Initialize the global tracing subscriber.
///
/// Call once from the host adapter at plugin initialization. Debug mode
/// prints raw wire traffic, which may include user info in the console.
pub fn init(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::INFO };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();
}
