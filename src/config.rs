//! Application-level configuration loading, including the runtime game catalog.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "HOF_BACK_CONFIG_PATH";
/// Default directory for the device-local fallback and cache files.
const DEFAULT_DATA_DIR: &str = "data";

/// Presentation metadata for one game in the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct GameMeta {
    /// Human-readable title.
    pub name: String,
    /// Unit suffix rendered after scores (empty for plain points).
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Game catalog in display order, keyed by game id.
    pub games: IndexMap<String, GameMeta>,
    /// Whether score writes require a signed-in identity while the remote
    /// tier is reachable.
    pub require_auth_for_write: bool,
    /// Minimum gap between two accepted nickname changes.
    pub nickname_cooldown_ms: u64,
    /// Accepted nickname changes per UTC calendar day.
    pub nickname_daily_limit: u32,
    /// Directory holding the local fallback and cache files.
    pub data_dir: PathBuf,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in catalog and limits.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        games = app_config.games.len(),
                        "loaded game catalog from config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Catalog metadata for a game id, if the game is known.
    pub fn game(&self, game_id: &str) -> Option<&GameMeta> {
        self.games.get(game_id)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            games: default_games(),
            require_auth_for_write: true,
            nickname_cooldown_ms: 30_000,
            nickname_daily_limit: 2,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    games: Option<IndexMap<String, GameMeta>>,
    #[serde(default)]
    require_auth_for_write: Option<bool>,
    #[serde(default)]
    nickname_cooldown_ms: Option<u64>,
    #[serde(default)]
    nickname_daily_limit: Option<u32>,
    #[serde(default)]
    data_dir: Option<PathBuf>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            games: raw.games.unwrap_or(defaults.games),
            require_auth_for_write: raw
                .require_auth_for_write
                .unwrap_or(defaults.require_auth_for_write),
            nickname_cooldown_ms: raw
                .nickname_cooldown_ms
                .unwrap_or(defaults.nickname_cooldown_ms),
            nickname_daily_limit: raw
                .nickname_daily_limit
                .unwrap_or(defaults.nickname_daily_limit),
            data_dir: raw.data_dir.unwrap_or(defaults.data_dir),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in game catalog shipped with the binary.
fn default_games() -> IndexMap<String, GameMeta> {
    fn meta(name: &str, unit: &str) -> GameMeta {
        GameMeta {
            name: name.to_owned(),
            unit: unit.to_owned(),
        }
    }

    IndexMap::from([
        ("jump".to_owned(), meta("Slime Jump", "m")),
        ("tetris".to_owned(), meta("Tetris", "")),
        ("snake".to_owned(), meta("Neon Snake", "")),
        ("memory".to_owned(), meta("Memory Match", "Lv")),
        ("blockBlast".to_owned(), meta("Block Blast", "")),
        ("catch".to_owned(), meta("Clown Catch", "")),
        ("stack".to_owned(), meta("Perfect Tower", "F")),
        ("dodge".to_owned(), meta("Cosmic Dodge", "s")),
        ("dino".to_owned(), meta("Dino Dash", "")),
    ])
}
