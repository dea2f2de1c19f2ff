use directories::BaseDirs;
use serde::Deserialize;
use std::{env, fs, path::Path, path::PathBuf, time::Duration};
use tracing::warn;
use url::Url;
use zterm_core::controller::{ControllerConfig, UnloadPolicy};
use zterm_core::cursor::CursorStyle;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const URL_ENV: &str = "ZTERM_URL";

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ClientFileConfig {
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub unload_timeout_ms: Option<u64>,
    pub cursor: Option<String>,
    pub blink_ms: Option<u64>,
    pub unload: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: Url,
    pub timeout: Duration,
    /// Upper bound on the shutdown newline flush.
    pub unload_timeout: Duration,
    pub proxy: Option<String>,
    pub controller: ControllerConfig,
}

impl ClientConfig {
    pub fn from_env_and_file() -> anyhow::Result<Self> {
        let file_cfg = Self::config_path()
            .filter(|p| p.exists())
            .and_then(|p| Self::read_file(&p));
        let env_url = env::var(URL_ENV).ok();
        let proxy = env::var("HTTPS_PROXY")
            .ok()
            .or_else(|| env::var("HTTP_PROXY").ok());
        Self::resolve(env_url, file_cfg.unwrap_or_default(), proxy)
    }

    /// Environment beats file beats defaults.
    pub fn resolve(
        env_url: Option<String>,
        file_cfg: ClientFileConfig,
        proxy: Option<String>,
    ) -> anyhow::Result<Self> {
        let raw_url = env_url
            .or(file_cfg.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(raw_url.trim())
            .map_err(|e| anyhow::anyhow!("invalid server url {:?}: {}", raw_url, e))?;

        let blink = file_cfg.blink_ms.map(Duration::from_millis);
        let cursor = match file_cfg.cursor.as_deref() {
            Some(name) => CursorStyle::from_name(name, blink).unwrap_or_else(|| {
                warn!(target: "remote::config", "unknown cursor style {:?}, using static", name);
                CursorStyle::Static
            }),
            None => CursorStyle::Static,
        };
        let unload = match file_cfg.unload.as_deref() {
            Some(name) => UnloadPolicy::from_name(name).unwrap_or_else(|| {
                warn!(target: "remote::config", "unknown unload policy {:?}, using beacon", name);
                UnloadPolicy::Beacon
            }),
            None => UnloadPolicy::Beacon,
        };

        Ok(ClientConfig {
            base_url,
            timeout: Duration::from_millis(file_cfg.timeout_ms.unwrap_or(10_000)),
            unload_timeout: Duration::from_millis(file_cfg.unload_timeout_ms.unwrap_or(500)),
            proxy,
            controller: ControllerConfig { cursor, unload },
        })
    }

    fn read_file(path: &Path) -> Option<ClientFileConfig> {
        let text = fs::read_to_string(path).ok()?;
        match toml::from_str::<ClientFileConfig>(&text) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                warn!(target: "remote::config", "ignoring {}: {}", path.display(), e);
                None
            }
        }
    }

    fn config_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        let p = if cfg!(target_os = "windows") {
            base.home_dir().join(".zterm").join("config.toml")
        } else {
            base.config_dir().join("zterm").join("config.toml")
        };
        Some(p)
    }
}
