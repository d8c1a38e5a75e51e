use std::sync::Once;

use env_logger::Builder;
use log::LevelFilter;

static INIT: Once = Once::new();

/// Installs an `env_logger` backend at `info`, overridable through
/// `RUST_LOG`. Safe to call more than once.
pub fn init_logging() {
    INIT.call_once_force(|_| {
        let mut builder = Builder::new();

        builder
            .filter_level(LevelFilter::Info)
            .filter_module("shelf_index", LevelFilter::Info)
            .filter_module("shelf_catalog", LevelFilter::Info)
            .format_timestamp_millis()
            .parse_default_env();

        // Another logger may already be installed by the host application.
        let _ = builder.try_init();
    });
}

#[cfg(test)]
mod tests {
    use log::{debug, info};

    use super::*;

    #[test]
    fn test_init_logging_twice() {
        init_logging();
        init_logging();
        debug!("debug message in test");
        info!("info message in test");
    }
}
