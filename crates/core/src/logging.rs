use std::panic::PanicHookInfo;
use std::sync::Once;

use tracing_subscriber::{
    filter::FilterFn, fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Install a stderr subscriber for `oba_*` targets and route panics into it.
///
/// Safe to call from every entry point; only the first call has an effect.
/// If the host already installed a global subscriber, that one is kept.
pub fn setup_logging() {
    static LOGGING_SETUP: Once = Once::new();

    LOGGING_SETUP.call_once(|| {
        let filter =
            FilterFn::new(|meta| meta.module_path().unwrap_or_default().starts_with("oba_"));
        let layer = tracing_subscriber::fmt::layer()
            .event_format(Format::default().with_target(true))
            .with_writer(std::io::stderr);

        if tracing_subscriber::registry()
            .with(layer)
            .with(filter)
            .try_init()
            .is_ok()
        {
            std::panic::set_hook(Box::new(panic_hook));
        }
    })
}

fn panic_hook(info: &PanicHookInfo) {
    tracing::error!("{info}")
}
