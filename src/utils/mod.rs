pub mod build_info;
pub mod persistence;

use std::{env, path::PathBuf, sync::Once};

use dirs::home_dir;

static TRACING_INIT: Once = Once::new();

const DEFAULT_DIR_NAME: &str = ".quote_wizard";
const CONFIG_FILE: &str = "config.json";
const SNAPSHOT_DIR: &str = "snapshots";

/// Initializes the global tracing subscriber. Output goes to stderr so it never
/// interleaves with the wizard's own terminal output.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("quote_wizard=info"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

/// Returns the application data directory, defaulting to `~/.quote_wizard`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os("QUOTE_WIZARD_HOME") {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Path of the JSON configuration file inside a data directory.
pub fn config_file_in(base: &std::path::Path) -> PathBuf {
    base.join(CONFIG_FILE)
}

/// Directory holding completed-form snapshots inside a data directory.
pub fn snapshot_dir_in(base: &std::path::Path) -> PathBuf {
    base.join(SNAPSHOT_DIR)
}
