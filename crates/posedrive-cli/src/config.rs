//! Configuration Vault – reads/writes `~/.posedrive/config.toml`.

use posedrive_kernel::TranslatorConfig;
use posedrive_perception::{AngleWrap, PITCH_OFFSET_DEG};
use posedrive_runtime::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where executed commands go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// One `forward();`-style line per command on stdout.
    #[default]
    Script,
    /// Commands are only logged.
    Log,
}

impl std::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputMode::Script => write!(f, "script"),
            OutputMode::Log => write!(f, "log"),
        }
    }
}

/// Persisted user configuration stored in `~/.posedrive/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Translation-Y distance that triggers forward/backward.
    #[serde(default = "default_translation_threshold")]
    pub translation_threshold: f64,

    /// Yaw/pitch distance in degrees that triggers left/right and up/down.
    #[serde(default = "default_rotation_threshold")]
    pub rotation_threshold: f64,

    /// Degrees added to the raw pitch angle.
    #[serde(default = "default_pitch_offset")]
    pub pitch_offset: f64,

    /// `"raw"` or `"shortest"`.
    #[serde(default)]
    pub angle_wrap: AngleWrap,

    #[serde(default)]
    pub output: OutputMode,

    /// JSON-lines sample file used when no path is given on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,

    /// Replay rate, emulating a live sensor. Zero replays as fast as samples
    /// can be read, in which case how many samples are dropped depends on
    /// scheduling.
    #[serde(default = "default_sample_rate_hz")]
    pub sample_rate_hz: Option<f64>,
}

fn default_translation_threshold() -> f64 {
    posedrive_kernel::TRANSLATION_THRESHOLD
}
fn default_rotation_threshold() -> f64 {
    posedrive_kernel::ROTATION_THRESHOLD_DEG
}
fn default_pitch_offset() -> f64 {
    PITCH_OFFSET_DEG
}
fn default_sample_rate_hz() -> Option<f64> {
    Some(DEFAULT_SAMPLE_RATE_HZ)
}

/// Replay rate used unless the config file says otherwise.
pub const DEFAULT_SAMPLE_RATE_HZ: f64 = 30.0;

impl Default for Config {
    fn default() -> Self {
        Self {
            translation_threshold: default_translation_threshold(),
            rotation_threshold: default_rotation_threshold(),
            pitch_offset: default_pitch_offset(),
            angle_wrap: AngleWrap::default(),
            output: OutputMode::default(),
            source_path: None,
            sample_rate_hz: default_sample_rate_hz(),
        }
    }
}

impl Config {
    /// Reject thresholds that would make every sample (or no sample) fire.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("translation_threshold", self.translation_threshold),
            ("rotation_threshold", self.rotation_threshold),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(format!("{name} must be a positive number, got {value}"));
            }
        }
        if !self.pitch_offset.is_finite() {
            return Err(format!("pitch_offset must be finite, got {}", self.pitch_offset));
        }
        Ok(())
    }

    /// Build the runtime configuration.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            translator: TranslatorConfig {
                translation_threshold: self.translation_threshold,
                rotation_threshold: self.rotation_threshold,
                pitch_offset: self.pitch_offset,
                angle_wrap: self.angle_wrap,
            },
            sample_interval: self
                .sample_rate_hz
                .filter(|hz| hz.is_finite() && *hz > 0.0)
                .map(|hz| Duration::from_secs_f64(1.0 / hz)),
        }
    }
}

/// Return the path to `~/.posedrive/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".posedrive").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path, applying environment overrides.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    cfg.validate()?;
    Ok(Some(cfg))
}

/// Default configuration with `POSEDRIVE_*` environment overrides applied.
///
/// Used when no config file exists yet or the existing one is unusable.
pub fn defaults() -> Config {
    defaults_from(|key| std::env::var(key).ok())
}

fn defaults_from(lookup: impl Fn(&str) -> Option<String>) -> Config {
    let mut cfg = Config::default();
    apply_overrides(&mut cfg, lookup);
    cfg
}

/// Apply `POSEDRIVE_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `POSEDRIVE_TRANSLATION_THRESHOLD` | `translation_threshold` |
/// | `POSEDRIVE_ROTATION_THRESHOLD` | `rotation_threshold` |
/// | `POSEDRIVE_ANGLE_WRAP` | `angle_wrap` |
/// | `POSEDRIVE_SOURCE` | `source_path` |
/// | `POSEDRIVE_SAMPLE_RATE_HZ` | `sample_rate_hz` |
///
/// Values that do not parse, or thresholds that are not positive, are
/// ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides(cfg, |key| std::env::var(key).ok());
}

fn apply_overrides(cfg: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let positive = |v: String| v.trim().parse::<f64>().ok().filter(|x| x.is_finite() && *x > 0.0);

    if let Some(v) = lookup("POSEDRIVE_TRANSLATION_THRESHOLD").and_then(positive) {
        cfg.translation_threshold = v;
    }
    if let Some(v) = lookup("POSEDRIVE_ROTATION_THRESHOLD").and_then(positive) {
        cfg.rotation_threshold = v;
    }
    if let Some(v) = lookup("POSEDRIVE_ANGLE_WRAP")
        && let Ok(wrap) = v.parse::<AngleWrap>()
    {
        cfg.angle_wrap = wrap;
    }
    if let Some(v) = lookup("POSEDRIVE_SOURCE") {
        cfg.source_path = Some(v);
    }
    if let Some(v) = lookup("POSEDRIVE_SAMPLE_RATE_HZ").and_then(positive) {
        cfg.sample_rate_hz = Some(v);
    }
}

/// Save the config to disk, creating `~/.posedrive/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
