use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::{audio_queue::DEFAULT_COOLDOWN, sampler::DEFAULT_SAMPLE_INTERVAL};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8090";
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const DEFAULT_PLAYER: &str = "ffplay";
pub const DEFAULT_PLAYER_ARGS: [&str; 4] = ["-nodisp", "-autoexit", "-loglevel", "quiet"];
pub const DEFAULT_FRAMES_DIR: &str = "frames";
pub const DEFAULT_FPS: u32 = 30;

#[derive(Debug, Deserialize, Default)]
struct AppConfigFile {
    server: Option<ServerConfigFile>,
    session: Option<SessionConfigFile>,
    player: Option<PlayerConfigFile>,
    http: Option<HttpConfigFile>,
    source: Option<SourceConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ServerConfigFile {
    url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct SessionConfigFile {
    sample_interval: Option<u32>,
    cooldown_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct PlayerConfigFile {
    program: Option<String>,
    args: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct HttpConfigFile {
    addr: Option<String>,
    static_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    frames_dir: Option<PathBuf>,
    fps: Option<u32>,
    #[serde(rename = "loop")]
    looped: Option<bool>,
    camera: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_url: String,
    pub request_timeout: Duration,
    pub sample_interval: u32,
    pub cooldown: Duration,
    pub player_program: String,
    pub player_args: Vec<String>,
    pub http_addr: String,
    pub static_dir: PathBuf,
    pub source: SourceSettings,
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub frames_dir: PathBuf,
    pub fps: u32,
    pub looped: bool,
    /// Ruta V4L2 (`/dev/video0`); solo con la feature `camera-v4l2`.
    pub camera: Option<String>,
}

/// Ajustes de línea de comandos; tienen la última palabra.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub server_url: Option<String>,
    pub sample_interval: Option<u32>,
    pub cooldown_ms: Option<u64>,
    pub http_addr: Option<String>,
    pub frames_dir: Option<PathBuf>,
    pub fps: Option<u32>,
    pub camera: Option<String>,
}

impl AppConfig {
    /// Valores por defecto ← fichero TOML ← variables `VISION_*`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => read_config_file(path)?,
            None => AppConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg);
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: AppConfigFile) -> Self {
        let server = file.server.unwrap_or_default();
        let session = file.session.unwrap_or_default();
        let player = file.player.unwrap_or_default();
        let http = file.http.unwrap_or_default();
        let source = file.source.unwrap_or_default();

        Self {
            server_url: server.url.unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            request_timeout: Duration::from_secs(server.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            sample_interval: session.sample_interval.unwrap_or(DEFAULT_SAMPLE_INTERVAL),
            cooldown: session.cooldown_ms.map(Duration::from_millis).unwrap_or(DEFAULT_COOLDOWN),
            player_program: player.program.unwrap_or_else(|| DEFAULT_PLAYER.to_string()),
            player_args: player
                .args
                .unwrap_or_else(|| DEFAULT_PLAYER_ARGS.iter().map(|s| s.to_string()).collect()),
            http_addr: http.addr.unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string()),
            static_dir: http.static_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
            source: SourceSettings {
                frames_dir: source.frames_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_FRAMES_DIR)),
                fps: source.fps.unwrap_or(DEFAULT_FPS),
                looped: source.looped.unwrap_or(true),
                camera: source.camera,
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(url) = non_empty_env("VISION_SERVER_URL") {
            self.server_url = url;
        }
        if let Some(interval) = non_empty_env("VISION_SAMPLE_INTERVAL") {
            self.sample_interval = interval
                .parse()
                .map_err(|_| anyhow!("VISION_SAMPLE_INTERVAL must be a positive integer"))?;
        }
        if let Some(ms) = non_empty_env("VISION_COOLDOWN_MS") {
            let ms: u64 = ms
                .parse()
                .map_err(|_| anyhow!("VISION_COOLDOWN_MS must be an integer number of milliseconds"))?;
            self.cooldown = Duration::from_millis(ms);
        }
        if let Some(addr) = non_empty_env("VISION_HTTP_ADDR") {
            self.http_addr = addr;
        }
        if let Some(program) = non_empty_env("VISION_PLAYER") {
            self.player_program = program;
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, o: ConfigOverrides) -> Result<()> {
        if let Some(url) = o.server_url {
            self.server_url = url;
        }
        if let Some(interval) = o.sample_interval {
            self.sample_interval = interval;
        }
        if let Some(ms) = o.cooldown_ms {
            self.cooldown = Duration::from_millis(ms);
        }
        if let Some(addr) = o.http_addr {
            self.http_addr = addr;
        }
        if let Some(dir) = o.frames_dir {
            self.source.frames_dir = dir;
        }
        if let Some(fps) = o.fps {
            self.source.fps = fps;
        }
        if o.camera.is_some() {
            self.source.camera = o.camera;
        }
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if self.server_url.trim().is_empty() {
            return Err(anyhow!("server url must not be empty"));
        }
        if self.sample_interval == 0 {
            return Err(anyhow!("sample_interval must be greater than zero"));
        }
        if self.request_timeout.is_zero() {
            return Err(anyhow!("request timeout must be greater than zero"));
        }
        if self.player_program.trim().is_empty() {
            return Err(anyhow!("player program must not be empty"));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_file(AppConfigFile::default())
    }
}

fn read_config_file(path: &Path) -> Result<AppConfigFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
