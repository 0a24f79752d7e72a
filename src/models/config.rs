use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration loaded from an optional YAML file
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// External renderer invocation
    #[serde(default)]
    pub renderer: RendererConfig,

    /// Directory holding saved diagram pairs
    #[serde(default = "default_save_dir")]
    pub save_dir: PathBuf,

    /// Directory for per-request scratch files of `/render`
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
}

fn default_save_dir() -> PathBuf {
    PathBuf::from("saved_diagrams")
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir()
}

/// How the external rendering executable is invoked.
///
/// The source file path is appended after `args`, so the default
/// runs `java -jar plantuml.jar <source>`.
#[derive(Debug, Deserialize, Clone)]
pub struct RendererConfig {
    #[serde(default = "default_command")]
    pub command: String,

    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Maximum run time in seconds; 0 disables the limit
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_command() -> String {
    "java".to_string()
}

fn default_args() -> Vec<String> {
    vec!["-jar".to_string(), "plantuml.jar".to_string()]
}

fn default_timeout_secs() -> u64 {
    60
}

impl RendererConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            renderer: RendererConfig::default(),
            save_dir: default_save_dir(),
            work_dir: default_work_dir(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file, falling back to defaults
    pub fn load_from_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str::<Self>(&content) {
                Ok(config) => {
                    tracing::info!(
                        path = %path.display(),
                        command = %config.renderer.command,
                        "Loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    tracing::warn!(%e, path = %path.display(), "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(%e, path = %path.display(), "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    /// Build the effective configuration from `CONFIG_FILE` plus env overrides
    pub fn from_env() -> Self {
        let mut config = match std::env::var("CONFIG_FILE") {
            Ok(path) => Self::load_from_file(Path::new(&path)),
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply `SAVE_DIR`, `WORK_DIR`, `RENDER_COMMAND`, `RENDER_ARGS` and
    /// `RENDER_TIMEOUT_SECS` on top of the loaded values
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("SAVE_DIR") {
            self.save_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("WORK_DIR") {
            self.work_dir = PathBuf::from(dir);
        }
        if let Some(command) = lookup("RENDER_COMMAND") {
            self.renderer.command = command;
        }
        if let Some(args) = lookup("RENDER_ARGS") {
            self.renderer.args = args.split_whitespace().map(str::to_string).collect();
        }
        if let Some(secs) = lookup("RENDER_TIMEOUT_SECS") {
            match secs.parse() {
                Ok(secs) => self.renderer.timeout_secs = secs,
                Err(e) => tracing::warn!(%e, value = %secs, "Ignoring invalid RENDER_TIMEOUT_SECS"),
            }
        }
    }
}
