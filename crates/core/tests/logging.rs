//! Runs in its own binary: `setup_logging` installs a process-wide
//! subscriber and panic hook.

use oba_core::logging::setup_logging;

#[test]
fn test_setup_is_idempotent() {
    setup_logging();
    setup_logging();

    tracing::info!("logging initialized");
}
