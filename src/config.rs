#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex, OnceLock},
    time::Duration,
};

use anyhow::{Context, Result};
use tracing::Level;

use crate::{
    constants::{
        DEFAULT_COMPILE_TIMEOUT_MS, DEFAULT_PROCESS_LIMIT_SECS, DEFAULT_PUZZLE_DIR,
    },
    java::BracingStyle,
    puzzle::Difficulty,
};

/// Settings shared across the crate, read from the environment once.
#[derive(Debug, Clone)]
pub struct ConfigState {
    /// How long the game waits for a compile-and-run before giving up.
    compile_timeout: Duration,
    /// Ceiling for any single `javac`/`java` process.
    process_limit:   Duration,
    /// Difficulty new sessions start with.
    difficulty:      Difficulty,
    /// Directory puzzles are loaded from.
    puzzle_dir:      PathBuf,
    /// Directory candidate programs are compiled in.
    scratch_dir:     PathBuf,
    /// Brace layout puzzles are shown in.
    bracing:         BracingStyle,
    /// Most verbose level the binary logs at.
    log_level:       Level,
}

impl Default for ConfigState {
    fn default() -> Self {
        Self {
            compile_timeout: Duration::from_millis(DEFAULT_COMPILE_TIMEOUT_MS),
            process_limit:   Duration::from_secs(DEFAULT_PROCESS_LIMIT_SECS),
            difficulty:      Difficulty::default(),
            puzzle_dir:      PathBuf::from(DEFAULT_PUZZLE_DIR),
            scratch_dir:     std::env::temp_dir(),
            bracing:         BracingStyle::default(),
            log_level:       Level::INFO,
        }
    }
}

impl ConfigState {
    /// Builds the configuration from `TOKANAGRAMMAR_*` environment variables,
    /// falling back to defaults for anything unset. A set but malformed value
    /// is an error.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let difficulty = match std::env::var("TOKANAGRAMMAR_DIFFICULTY") {
            Ok(value) => {
                let percent = value
                    .trim()
                    .parse::<i64>()
                    .with_context(|| format!("TOKANAGRAMMAR_DIFFICULTY is not a number: {value}"))?;
                Difficulty::new(percent)?
            }
            Err(_) => defaults.difficulty,
        };

        let bracing = match std::env::var("TOKANAGRAMMAR_BRACING") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.bracing,
        };

        let log_level = match std::env::var("TOKANAGRAMMAR_LOG") {
            Ok(value) => value
                .trim()
                .parse::<Level>()
                .with_context(|| format!("TOKANAGRAMMAR_LOG is not a log level: {value}"))?,
            Err(_) => defaults.log_level,
        };

        Ok(Self {
            compile_timeout: read_duration_ms(
                "TOKANAGRAMMAR_COMPILE_TIMEOUT_MS",
                DEFAULT_COMPILE_TIMEOUT_MS,
            )?,
            process_limit: read_duration_ms(
                "TOKANAGRAMMAR_PROCESS_LIMIT_MS",
                DEFAULT_PROCESS_LIMIT_SECS * 1000,
            )?,
            difficulty,
            puzzle_dir: read_path("TOKANAGRAMMAR_PUZZLE_DIR").unwrap_or(defaults.puzzle_dir),
            scratch_dir: read_path("TOKANAGRAMMAR_SCRATCH_DIR").unwrap_or(defaults.scratch_dir),
            bracing,
            log_level,
        })
    }

    /// Returns the compile-and-run timeout.
    pub fn compile_timeout(&self) -> Duration {
        self.compile_timeout
    }

    /// Overrides the compile-and-run timeout.
    pub fn with_compile_timeout(mut self, timeout: Duration) -> Self {
        self.compile_timeout = timeout;
        self
    }

    /// Returns the per-process ceiling.
    pub fn process_limit(&self) -> Duration {
        self.process_limit
    }

    /// Returns the starting difficulty.
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Overrides the starting difficulty.
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Returns the puzzle directory.
    pub fn puzzle_dir(&self) -> &Path {
        self.puzzle_dir.as_path()
    }

    /// Overrides the puzzle directory.
    pub fn with_puzzle_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.puzzle_dir = dir.into();
        self
    }

    /// Returns the scratch directory.
    pub fn scratch_dir(&self) -> &Path {
        self.scratch_dir.as_path()
    }

    /// Returns the brace layout.
    pub fn bracing(&self) -> BracingStyle {
        self.bracing
    }

    /// Overrides the brace layout.
    pub fn with_bracing(mut self, bracing: BracingStyle) -> Self {
        self.bracing = bracing;
        self
    }

    /// Returns the log level.
    pub fn log_level(&self) -> Level {
        self.log_level
    }
}

/// Shared configuration handle used throughout the crate.
#[derive(Clone, Debug)]
pub struct ConfigHandle(Arc<ConfigState>);

impl std::ops::Deref for ConfigHandle {
    type Target = ConfigState;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Global storage for the lazily constructed configuration state.
static CONFIG_SLOT: OnceLock<Mutex<Option<Arc<ConfigState>>>> = OnceLock::new();

/// Returns the mutex guarding the global configuration slot.
fn slot() -> &'static Mutex<Option<Arc<ConfigState>>> {
    CONFIG_SLOT.get_or_init(|| Mutex::new(None))
}

/// Ensure the global configuration has been initialized and return a handle.
pub fn ensure_initialized() -> Result<ConfigHandle> {
    let mut guard = slot().lock().expect("config slot poisoned");
    if let Some(cfg) = guard.as_ref() {
        return Ok(ConfigHandle(Arc::clone(cfg)));
    }

    let cfg = Arc::new(ConfigState::from_env()?);
    *guard = Some(Arc::clone(&cfg));
    Ok(ConfigHandle(cfg))
}

/// Replaces the global configuration, e.g. after applying command line flags.
pub fn install(state: ConfigState) -> ConfigHandle {
    let cfg = Arc::new(state);
    *slot().lock().expect("config slot poisoned") = Some(Arc::clone(&cfg));
    ConfigHandle(cfg)
}

/// Returns the active configuration, initializing it on demand.
pub fn get() -> ConfigHandle {
    ensure_initialized().expect("configuration initialization failed")
}

/// Reads an environment variable as a `Duration` of milliseconds.
fn read_duration_ms(env: &str, default_ms: u64) -> Result<Duration> {
    parse_duration_ms(env, std::env::var(env).ok(), default_ms)
}

/// Parses `value` as milliseconds, using `default_ms` when it is missing.
fn parse_duration_ms(env: &str, value: Option<String>, default_ms: u64) -> Result<Duration> {
    match value {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .with_context(|| format!("{env} is not a number of milliseconds: {value}")),
        None => Ok(Duration::from_millis(default_ms)),
    }
}

/// Reads a non-empty path from the environment.
fn read_path(env: &str) -> Option<PathBuf> {
    std::env::var(env)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
