use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader, Read},
    path::PathBuf,
    time::Duration,
};

use directories::BaseDirs;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        let config_path = default_config_path();
        let mut cfg = match fs::File::open(&config_path) {
            Ok(file) => Self::from_reader(file),
            Err(_) => Self::from_reader(std::io::empty()),
        };
        cfg.config_path = config_path;

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                cfg.inner.insert(k, v);
            }
        }

        cfg
    }

    /// Parse `KEY=VALUE` lines on top of the defaults. Environment is not consulted.
    pub fn from_reader<R: Read>(reader: R) -> Self {
        let mut map = default_map();
        for line in BufReader::new(reader).lines().map_while(Result::ok) {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((k, v)) = line.split_once('=') {
                map.insert(k.trim().to_string(), v.trim().to_string());
            }
        }
        Self { inner: map, config_path: default_config_path() }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned()
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.inner.insert(key.to_string(), value.into());
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn api_base_url(&self) -> String {
        self.get("API_BASE_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.get_u64("REQUEST_TIMEOUT").unwrap_or(60))
    }

    pub fn focus_delay(&self) -> Duration {
        Duration::from_millis(self.get_u64("FOCUS_DELAY_MS").unwrap_or(50))
    }

    pub fn log_level(&self) -> String {
        self.get("LOG_LEVEL").unwrap_or_else(|| "warn".into())
    }

    pub fn log_path(&self) -> PathBuf {
        self.get("LOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join("ggedit").join("ggedit.log"))
    }
}

fn is_config_key(k: &str) -> bool {
    const KEYS: &[&str] = &[
        "API_BASE_URL",
        "REQUEST_TIMEOUT",
        "FOCUS_DELAY_MS",
        "LOG_LEVEL",
        "LOG_PATH",
        "DEFAULT_COLOR",
    ];

    KEYS.contains(&k) || k.starts_with("GGEDIT_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("ggedit").join(".ggeditrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();
    m.insert("API_BASE_URL".into(), DEFAULT_API_BASE_URL.into());
    m.insert("REQUEST_TIMEOUT".into(), "60".into());
    m.insert("FOCUS_DELAY_MS".into(), "50".into());
    m.insert("LOG_LEVEL".into(), "warn".into());
    m.insert("DEFAULT_COLOR".into(), "green".into());
    m
}
