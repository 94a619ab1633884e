/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD, or
/// `~/.local/share/hopper`, first match wins.
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;
use tracing::{info, warn};

// ── Errors ──

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config.toml parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid lane layout: {0}")]
    InvalidLanes(String),
}

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub player: PlayerConfig,
    pub board: BoardConfig,
    pub tick_rate_ms: u64,
}

/// Rules of a single run, in seconds and points.
#[derive(Clone, Debug)]
pub struct PlayerConfig {
    pub total_lives: i32,
    pub points_per_step: u32,
    pub time_limit: f32,
    pub respawn_delay: f32,
    pub move_duration: f32,
    pub move_substeps: u32,
    pub invincible: bool,
}

#[derive(Clone, Debug)]
pub struct BoardConfig {
    /// One marker per row, start row first: S=safe R=road W=water F=finish.
    pub lanes: String,
    pub width: f32,
    /// Traffic layout seed; `None` draws a fresh one per run.
    pub seed: Option<u64>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        let t = TomlPlayer::default();
        PlayerConfig {
            total_lives: t.total_lives,
            points_per_step: t.points_per_step,
            time_limit: t.time_limit,
            respawn_delay: t.respawn_delay,
            move_duration: t.move_duration,
            move_substeps: t.move_substeps,
            invincible: t.invincible,
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    player: TomlPlayer,
    #[serde(default)]
    board: TomlBoard,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlPlayer {
    #[serde(default = "default_total_lives")]
    total_lives: i32,
    #[serde(default = "default_points_per_step")]
    points_per_step: u32,
    #[serde(default = "default_time_limit")]
    time_limit: f32,
    #[serde(default = "default_respawn_delay")]
    respawn_delay: f32,
    #[serde(default = "default_move_duration")]
    move_duration: f32,
    #[serde(default = "default_move_substeps")]
    move_substeps: u32,
    #[serde(default)]
    invincible: bool,
}

#[derive(Deserialize, Debug)]
struct TomlBoard {
    #[serde(default = "default_lanes")]
    lanes: String,
    #[serde(default = "default_width")]
    width: f32,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

// ── Defaults ──

fn default_total_lives() -> i32 { 5 }
fn default_points_per_step() -> u32 { 100 }
fn default_time_limit() -> f32 { 20.0 }
fn default_respawn_delay() -> f32 { 0.5 }
fn default_move_duration() -> f32 { 0.1 }
fn default_move_substeps() -> u32 { 5 }
fn default_lanes() -> String { "SRRRRSWWWWWF".into() }
fn default_width() -> f32 { 15.0 }
fn default_tick_rate() -> u64 { 16 }

impl Default for TomlPlayer {
    fn default() -> Self {
        TomlPlayer {
            total_lives: default_total_lives(),
            points_per_step: default_points_per_step(),
            time_limit: default_time_limit(),
            respawn_delay: default_respawn_delay(),
            move_duration: default_move_duration(),
            move_substeps: default_move_substeps(),
            invincible: false,
        }
    }
}

impl Default for TomlBoard {
    fn default() -> Self {
        TomlBoard {
            lanes: default_lanes(),
            width: default_width(),
            seed: None,
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            tick_rate_ms: default_tick_rate(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.local/share/hopper` when it exists.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let toml_cfg = match find_config(&candidate_dirs()) {
            Some(path) => match read_toml(&path) {
                Ok(cfg) => {
                    info!("Loaded {}", path.display());
                    cfg
                }
                Err(e) => {
                    warn!("{e}; using default settings");
                    TomlConfig::default()
                }
            },
            None => TomlConfig::default(),
        };
        Self::from_toml(toml_cfg)
    }

    /// Parse config text directly (no file search).
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let cfg: TomlConfig = toml::from_str(text)?;
        Ok(Self::from_toml(cfg))
    }

    fn from_toml(t: TomlConfig) -> Self {
        GameConfig {
            player: PlayerConfig {
                // a run with fewer than one life could never start
                total_lives: t.player.total_lives.max(1),
                points_per_step: t.player.points_per_step,
                time_limit: t.player.time_limit,
                respawn_delay: t.player.respawn_delay,
                move_duration: t.player.move_duration,
                move_substeps: t.player.move_substeps.max(1),
                invincible: t.player.invincible,
            },
            board: BoardConfig {
                lanes: t.board.lanes,
                width: t.board.width,
                seed: t.board.seed,
            },
            tick_rate_ms: t.general.tick_rate_ms.max(1),
        }
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/hopper");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

fn find_config(search_dirs: &[PathBuf]) -> Option<PathBuf> {
    search_dirs.iter()
        .map(|d| d.join("config.toml"))
        .find(|p| p.exists())
}

fn read_toml(path: &PathBuf) -> Result<TomlConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    Ok(toml::from_str::<TomlConfig>(&text)?)
}
