//! Command line, config file and the settings derived from them
//!
//! Precedence is command line, then the JSON config file, then defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::effects::{normalize_capture_size, EqualizerConfig};
use crate::error::PlayerError;

const MIN_POLL_INTERVAL_MS: u64 = 10;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "eqplayer", version, about = "Playlist player with equalizer and waveform")]
pub struct Cli {
    /// Directory track identifiers are resolved against
    #[arg(long, env = "EQPLAYER_MUSIC_DIR", default_value = ".")]
    pub music_dir: PathBuf,

    /// JSON config file
    #[arg(long, env = "EQPLAYER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Read commands from stdin and print state as JSON lines
    #[arg(long, env = "EQPLAYER_HEADLESS")]
    pub headless: bool,

    #[arg(long, env = "EQPLAYER_POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<u64>,

    #[arg(long, env = "EQPLAYER_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Track identifiers; replaces the configured playlist
    pub tracks: Vec<String>,
}

/// On-disk config. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub playlist: Vec<String>,
    pub poll_interval_ms: u64,
    pub capture_size: usize,
    pub equalizer: EqualizerConfig,
    pub autoplay: bool,
    pub pause_on_focus_lost: bool,
    pub log_dir: PathBuf,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            playlist: Vec::new(),
            poll_interval_ms: 300,
            capture_size: 1024,
            equalizer: EqualizerConfig::default(),
            autoplay: true,
            pause_on_focus_lost: false,
            log_dir: PathBuf::from(".logs"),
        }
    }
}

impl FileConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }
}

/// Knobs the orchestrator itself reads.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    pub poll_interval: Duration,
    pub capture_size: usize,
    pub equalizer: EqualizerConfig,
    /// Start playing as soon as a loaded track is prepared
    pub autoplay: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        let file = FileConfig::default();
        Self {
            poll_interval: Duration::from_millis(file.poll_interval_ms),
            capture_size: file.capture_size,
            equalizer: file.equalizer,
            autoplay: file.autoplay,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    pub dir: PathBuf,
    /// Write to a rolling file instead of stderr (the TUI owns the terminal)
    pub to_file: bool,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub music_dir: PathBuf,
    pub headless: bool,
    pub playlist: Vec<String>,
    pub pause_on_focus_lost: bool,
    pub player: PlayerConfig,
    pub log: LogConfig,
}

impl Settings {
    pub fn load(cli: Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::from_path(path)?,
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    pub fn merge(cli: Cli, file: FileConfig) -> Result<Self> {
        let playlist = if cli.tracks.is_empty() { file.playlist } else { cli.tracks };
        if playlist.is_empty() {
            return Err(PlayerError::InvalidCommand("playlist is empty".to_string()))
                .context("Pass track ids on the command line or set `playlist` in the config file");
        }

        let poll_ms = cli.poll_interval_ms.unwrap_or(file.poll_interval_ms).max(MIN_POLL_INTERVAL_MS);
        Ok(Self {
            music_dir: cli.music_dir,
            headless: cli.headless,
            playlist,
            pause_on_focus_lost: file.pause_on_focus_lost,
            player: PlayerConfig {
                poll_interval: Duration::from_millis(poll_ms),
                capture_size: normalize_capture_size(file.capture_size),
                equalizer: file.equalizer,
                autoplay: file.autoplay,
            },
            log: LogConfig {
                dir: cli.log_dir.unwrap_or(file.log_dir),
                to_file: !cli.headless,
            },
        })
    }
}
