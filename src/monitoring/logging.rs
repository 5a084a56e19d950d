//! Tracing subscriber installation.

use tracing::Level;

/// Install a formatting subscriber at the given level.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .try_init();
}

/// Install the default INFO-level subscriber.
pub fn init_default() {
    init(Level::INFO);
}
