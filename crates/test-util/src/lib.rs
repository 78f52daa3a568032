use std::path::PathBuf;
use std::sync::Once;

use serde_json::Value;

pub mod prelude {
    pub use crate::{Builder, LogLevel, read_testdata, read_testdata_json};
    pub use similar_asserts::assert_eq as sim_assert_eq;
}

/// Returns the workspace root directory via the `CARGO_WORKSPACE_DIR` env var
/// set in `.cargo/config.toml`.
///
/// # Panics
///
/// Panics if `CARGO_WORKSPACE_DIR` is not set.
#[must_use]
pub fn workspace_root() -> PathBuf {
    PathBuf::from(
        std::env::var("CARGO_WORKSPACE_DIR")
            .expect("CARGO_WORKSPACE_DIR must be set in .cargo/config.toml"),
    )
}

/// Returns the path to the workspace `testdata/` directory.
#[must_use]
pub fn workspace_testdata() -> PathBuf {
    workspace_root().join("testdata")
}

/// Reads a file relative to the workspace `testdata/` directory.
///
/// # Panics
///
/// Panics if the file cannot be read.
#[must_use]
pub fn read_testdata(relative_path: &str) -> Vec<u8> {
    let path = workspace_testdata().join(relative_path);
    std::fs::read(&path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

/// Reads and parses a JSON file relative to the workspace `testdata/` directory.
///
/// # Panics
///
/// Panics if the file cannot be read or is not valid JSON.
#[must_use]
pub fn read_testdata_json(relative_path: &str) -> Value {
    let bytes = read_testdata(relative_path);
    serde_json::from_slice(&bytes).unwrap_or_else(|e| panic!("parse {relative_path}: {e}"))
}

pub type LogLevel = tracing::metadata::Level;

static INIT_EYRE: Once = Once::new();
static INIT_TRACING: Once = Once::new();

#[derive(Default)]
pub struct TestGuard {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Builder {
    setup_tracing: bool,
    install_eyre: bool,
    env_filter: Option<String>,
    log_level: LogLevel,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            setup_tracing: true,
            install_eyre: true,
            env_filter: None,
            log_level: LogLevel::DEBUG,
        }
    }
}

impl Builder {
    /// Initialize test.
    ///
    /// This ensures `color_eyre` and the tracing subscriber are set up once.
    ///
    /// # Panics
    ///
    /// Panics if `color_eyre` installation fails.
    pub fn build(self) -> TestGuard {
        if self.install_eyre {
            INIT_EYRE.call_once(|| {
                color_eyre::install().expect("failed to install eyre");
            });
        }
        if self.setup_tracing {
            let directive = self
                .env_filter
                .clone()
                .unwrap_or_else(|| self.log_level.to_string().to_ascii_lowercase());
            INIT_TRACING.call_once(|| {
                let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(directive));
                // another test harness may already own the global subscriber
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(env_filter)
                    .with_test_writer()
                    .without_time()
                    .try_init();
            });
        }
        TestGuard::default()
    }

    /// Toggle setting up tracing inside the test.
    #[must_use]
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.setup_tracing = enabled;
        self
    }

    /// Toggle log level for tracing inside the test.
    #[must_use]
    pub fn with_log_level(mut self, log_level: impl Into<LogLevel>) -> Self {
        self.log_level = log_level.into();
        self
    }

    /// Toggle installation of `color_eyre`.
    #[must_use]
    pub fn with_eyre(mut self, enabled: bool) -> Self {
        self.install_eyre = enabled;
        self
    }

    /// Configure the tracing subscribers env filter.
    ///
    /// Requires tracing to be enabled with `Self::with_tracing`.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }
}

/// Create a new builder.
#[must_use]
pub fn builder() -> Builder {
    Builder::default()
}
