/// External configuration loader.
///
/// Reads `config.toml` from the path given on the command line, or else
/// from the executable's directory (or CWD). Falls back to defaults if the
/// file is missing, incomplete or broken.
///
/// ```toml
/// [general]
/// data_dir = "saves"      # holds levels/ and games/
/// log_level = "info"
///
/// [replay]
/// strict = false          # fail instead of skipping illegal recorded moves
///
/// [animation]
/// victory_step_ms = 100   # per spiral cell, divided by the ring number
/// victory_hold_ms = 800
///
/// [gamepad]
/// confirm = ["South", "Start"]
/// cancel = ["East", "Select"]
/// ```

use log::LevelFilter;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::sim::replay::ReplayPolicy;

pub const CONFIG_FILE: &str = "config.toml";

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub data_dir: PathBuf,
    pub log_level: LevelFilter,
    pub replay: ReplayConfig,
    pub animation: AnimationConfig,
    pub gamepad: GamepadConfig,
    /// Problems found while loading. Reported once logging is up.
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct ReplayConfig {
    pub strict: bool,
}

impl ReplayConfig {
    pub fn policy(&self) -> ReplayPolicy {
        ReplayPolicy::from_strict(self.strict)
    }
}

#[derive(Clone, Debug)]
pub struct AnimationConfig {
    pub victory_step_ms: u64,
    pub victory_hold_ms: u64,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    replay: TomlReplay,
    #[serde(default)]
    animation: TomlAnimation,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_data_dir")]
    data_dir: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

#[derive(Deserialize, Debug, Default)]
struct TomlReplay {
    #[serde(default)]
    strict: bool,
}

#[derive(Deserialize, Debug)]
struct TomlAnimation {
    #[serde(default = "default_victory_step")]
    victory_step_ms: u64,
    #[serde(default = "default_victory_hold")]
    victory_hold_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
}

// ── Defaults ──

fn default_data_dir() -> String { "saves".into() }
fn default_log_level() -> String { "info".into() }
fn default_victory_step() -> u64 { 100 }
fn default_victory_hold() -> u64 { 800 }
fn default_confirm() -> Vec<String> { vec!["South".into(), "Start".into()] }
fn default_cancel() -> Vec<String> { vec!["East".into(), "Select".into()] }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

impl Default for TomlAnimation {
    fn default() -> Self {
        TomlAnimation {
            victory_step_ms: default_victory_step(),
            victory_hold_ms: default_victory_hold(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `explicit` if given, else search for `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.local/share/conmaze`.
    pub fn load(explicit: Option<&Path>) -> Self {
        let search_dirs = candidate_dirs();
        let mut warnings = vec![];

        let toml_cfg = match explicit {
            Some(path) => read_toml(path, &mut warnings).unwrap_or_default(),
            None => load_toml(&search_dirs, &mut warnings),
        };

        // Resolve data directory
        let data_dir_str = &toml_cfg.general.data_dir;
        let data_dir = if Path::new(data_dir_str).is_absolute() {
            PathBuf::from(data_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(data_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(data_dir_str))
        };

        GameConfig::from_toml(toml_cfg, data_dir, warnings)
    }

    /// Build a config from TOML text alone. The data directory is taken as
    /// written.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let toml_cfg: TomlConfig = toml::from_str(text)?;
        let data_dir = PathBuf::from(&toml_cfg.general.data_dir);
        Ok(GameConfig::from_toml(toml_cfg, data_dir, vec![]))
    }

    fn from_toml(toml_cfg: TomlConfig, data_dir: PathBuf, mut warnings: Vec<String>) -> Self {
        let log_level = toml_cfg.general.log_level.parse().unwrap_or_else(|_| {
            warnings.push(format!(
                "unknown log_level {:?}, using info",
                toml_cfg.general.log_level
            ));
            LevelFilter::Info
        });

        GameConfig {
            data_dir,
            log_level,
            replay: ReplayConfig {
                strict: toml_cfg.replay.strict,
            },
            animation: AnimationConfig {
                victory_step_ms: toml_cfg.animation.victory_step_ms,
                victory_hold_ms: toml_cfg.animation.victory_hold_ms,
            },
            gamepad: GamepadConfig {
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
            },
            warnings,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        let toml_cfg = TomlConfig::default();
        let data_dir = PathBuf::from(&toml_cfg.general.data_dir);
        GameConfig::from_toml(toml_cfg, data_dir, vec![])
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data home (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so data next to the real binary is still found.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/conmaze)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/conmaze");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. Fallback
    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            if let Some(cfg) = read_toml(&path, warnings) {
                return cfg;
            }
            return TomlConfig::default();
        }
    }
    TomlConfig::default()
}

fn read_toml(path: &Path, warnings: &mut Vec<String>) -> Option<TomlConfig> {
    match std::fs::read_to_string(path) {
        Ok(text) => match toml::from_str::<TomlConfig>(&text) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                warnings.push(format!("{} parse error, using defaults: {e}", path.display()));
                None
            }
        },
        Err(e) => {
            warnings.push(format!("could not read {}: {e}", path.display()));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("saves"));
        assert_eq!(cfg.log_level, LevelFilter::Info);
        assert!(!cfg.replay.strict);
        assert_eq!(cfg.animation.victory_step_ms, 100);
        assert_eq!(cfg.gamepad.confirm, vec!["South".to_string(), "Start".to_string()]);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            "[general]\nlog_level = \"debug\"\n[replay]\nstrict = true\n",
        ).unwrap();
        assert_eq!(cfg.log_level, LevelFilter::Debug);
        assert_eq!(cfg.data_dir, PathBuf::from("saves"));
        assert_eq!(cfg.replay.policy(), ReplayPolicy::Strict);
        assert_eq!(cfg.animation.victory_hold_ms, 800);
    }

    #[test]
    fn unknown_log_level_warns() {
        let cfg = GameConfig::from_toml_str("[general]\nlog_level = \"loud\"\n").unwrap();
        assert_eq!(cfg.log_level, LevelFilter::Info);
        assert_eq!(cfg.warnings.len(), 1);
    }

    #[test]
    fn broken_file_falls_back_with_warning() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        std::fs::write(&path, "[general\n").unwrap();
        let cfg = GameConfig::load(Some(&path));
        assert!(!cfg.replay.strict);
        assert_eq!(cfg.warnings.len(), 1);
    }

    #[test]
    fn explicit_file_is_used() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("mine.toml");
        let data = tmp.path().join("data");
        std::fs::write(&path, format!("[general]\ndata_dir = {:?}\n", data.display().to_string())).unwrap();
        let cfg = GameConfig::load(Some(&path));
        assert_eq!(cfg.data_dir, data);
        assert!(cfg.warnings.is_empty());
    }
}
