//! Server configuration: built-in defaults, overridden by an optional TOML file,
//! overridden again by CLI flags — the same three-layer merge
//! `core_config::load_from` uses for `oxidized.toml`, generalized from "one scroll
//! setting" to the handful of values a canvas session needs at startup.

use anyhow::Result;
use canvas_wire::{Color, CursorStyle, EventMask};
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "canvas-server", version, about = "Remote 2D canvas drawing server")]
pub struct Args {
    /// Optional path to a `canvas.toml` (overrides file discovery).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub bind: Option<String>,
    #[arg(long)]
    pub width: Option<u32>,
    #[arg(long)]
    pub height: Option<u32>,
    #[arg(long)]
    pub title: Option<String>,
    /// Comma-separated event names to enable (e.g. "mouse_down,resize,key_down").
    /// Unrecognized names are ignored with a warning. Defaults to every event kind.
    #[arg(long, value_delimiter = ',')]
    pub event_mask: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
struct ConfigFile {
    #[serde(default)]
    bind: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    background: Option<[u8; 4]>,
    #[serde(default)]
    cursor: Option<String>,
    #[serde(default)]
    static_dir: Option<PathBuf>,
    #[serde(default)]
    event_mask: Option<Vec<String>>,
}

/// Fully resolved startup configuration for a [`Listener`](crate::listener::Listener).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub background: Color,
    pub cursor: CursorStyle,
    pub event_mask: EventMask,
    /// Directory the bootstrap page and any user static assets are served from.
    /// `None` means serve only the built-in embedded bootstrap page.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: String::from("127.0.0.1:9000"),
            width: 800,
            height: 600,
            title: String::from("canvas"),
            background: Color::WHITE,
            cursor: CursorStyle::Default,
            event_mask: EventMask::all(),
            static_dir: None,
        }
    }
}

fn discover() -> PathBuf {
    let local = PathBuf::from("canvas.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("canvas-server").join("canvas.toml");
    }
    PathBuf::from("canvas.toml")
}

fn parse_event_mask(names: &[String]) -> EventMask {
    let mut mask = EventMask::empty();
    for name in names {
        let flag = match name.as_str() {
            "mouse_move" => EventMask::MOUSE_MOVE,
            "mouse_down" => EventMask::MOUSE_DOWN,
            "mouse_up" => EventMask::MOUSE_UP,
            "mouse_enter" => EventMask::MOUSE_ENTER,
            "mouse_leave" => EventMask::MOUSE_LEAVE,
            "mouse_over" => EventMask::MOUSE_OVER,
            "mouse_out" => EventMask::MOUSE_OUT,
            "wheel" => EventMask::WHEEL,
            "key_down" => EventMask::KEY_DOWN,
            "key_up" => EventMask::KEY_UP,
            "key_press" => EventMask::KEY_PRESS,
            "touch" => EventMask::TOUCH,
            "resize" => EventMask::RESIZE,
            "click" => EventMask::CLICK,
            "dblclick" => EventMask::DBLCLICK,
            "auxclick" => EventMask::AUXCLICK,
            "context_menu" => EventMask::CONTEXT_MENU,
            "focus_blur" => EventMask::FOCUS_BLUR,
            other => {
                warn!(target: "server.config", name = other, "unknown_event_mask_entry_ignored");
                continue;
            }
        };
        mask |= flag;
    }
    mask
}

fn parse_cursor(name: &str) -> Option<CursorStyle> {
    Some(match name {
        "default" => CursorStyle::Default,
        "pointer" => CursorStyle::Pointer,
        "crosshair" => CursorStyle::Crosshair,
        "text" => CursorStyle::Text,
        "move" => CursorStyle::Move,
        "not-allowed" => CursorStyle::NotAllowed,
        "grab" => CursorStyle::Grab,
        "grabbing" => CursorStyle::Grabbing,
        "none" => CursorStyle::None,
        _ => return None,
    })
}

impl ServerConfig {
    /// Loads the file at `path` (or the discovered default), falling back to
    /// built-in defaults on any I/O or parse error — the same resilience
    /// `core_config::load_from` applies, logged at `warn` instead of silently eaten.
    fn load_file(path: Option<PathBuf>) -> ConfigFile {
        let path = path.unwrap_or_else(discover);
        match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<ConfigFile>(&content) {
                Ok(file) => file,
                Err(err) => {
                    warn!(target: "server.config", %err, path = %path.display(), "parse_error_using_defaults");
                    ConfigFile::default()
                }
            },
            Err(_) => ConfigFile::default(),
        }
    }

    /// Discovery order: explicit path → `./canvas.toml` → platform config dir →
    /// built-in defaults. CLI flags in `args` always win over the file.
    pub fn from_env_and_file(args: &Args) -> Result<Self> {
        let file = Self::load_file(args.config.clone());
        let defaults = Self::default();

        let cursor = file
            .cursor
            .as_deref()
            .and_then(parse_cursor)
            .unwrap_or(defaults.cursor);

        let background = file
            .background
            .map(|[r, g, b, a]| Color::rgba(r, g, b, a))
            .unwrap_or(defaults.background);

        let event_mask = args
            .event_mask
            .clone()
            .or(file.event_mask)
            .map(|names| parse_event_mask(&names))
            .unwrap_or(defaults.event_mask);

        let config = Self {
            bind: args
                .bind
                .clone()
                .or(file.bind)
                .unwrap_or(defaults.bind),
            width: args.width.or(file.width).unwrap_or(defaults.width),
            height: args.height.or(file.height).unwrap_or(defaults.height),
            title: args.title.clone().or(file.title).unwrap_or(defaults.title),
            background,
            cursor,
            event_mask,
            static_dir: file.static_dir,
        };

        info!(
            target: "server.config",
            bind = config.bind.as_str(),
            width = config.width,
            height = config.height,
            "resolved"
        );
        Ok(config)
    }

    pub fn static_dir(&self) -> Option<&Path> {
        self.static_dir.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args {
            config: None,
            bind: None,
            width: None,
            height: None,
            title: None,
            event_mask: None,
        }
    }

    #[test]
    fn cli_flags_override_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canvas.toml");
        std::fs::write(&path, "bind = \"0.0.0.0:8080\"\nwidth = 1024\n").unwrap();

        let mut cli = args();
        cli.config = Some(path);
        cli.width = Some(99);

        let config = ServerConfig::from_env_and_file(&cli).unwrap();
        assert_eq!(config.bind, "0.0.0.0:8080");
        assert_eq!(config.width, 99);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let mut cli = args();
        cli.config = Some(PathBuf::from("/nonexistent/canvas.toml"));
        let config = ServerConfig::from_env_and_file(&cli).unwrap();
        assert_eq!(config.bind, ServerConfig::default().bind);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canvas.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();

        let mut cli = args();
        cli.config = Some(path);
        let config = ServerConfig::from_env_and_file(&cli).unwrap();
        assert_eq!(config.width, ServerConfig::default().width);
    }

    #[test]
    fn event_mask_parses_from_file_and_ignores_unknown_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canvas.toml");
        std::fs::write(
            &path,
            "event_mask = [\"mouse_down\", \"resize\", \"not_a_real_event\"]\n",
        )
        .unwrap();

        let mut cli = args();
        cli.config = Some(path);
        let config = ServerConfig::from_env_and_file(&cli).unwrap();
        assert_eq!(
            config.event_mask,
            EventMask::MOUSE_DOWN | EventMask::RESIZE
        );
    }

    #[test]
    fn event_mask_cli_flag_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canvas.toml");
        std::fs::write(&path, "event_mask = [\"mouse_down\"]\n").unwrap();

        let mut cli = args();
        cli.config = Some(path);
        cli.event_mask = Some(vec!["click".to_string()]);
        let config = ServerConfig::from_env_and_file(&cli).unwrap();
        assert_eq!(config.event_mask, EventMask::CLICK);
    }

    #[test]
    fn background_color_parses_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canvas.toml");
        std::fs::write(&path, "background = [10, 20, 30, 255]\n").unwrap();

        let mut cli = args();
        cli.config = Some(path);
        let config = ServerConfig::from_env_and_file(&cli).unwrap();
        assert_eq!(config.background, Color::rgba(10, 20, 30, 255));
    }
}
