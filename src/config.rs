use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TEMPERATURE: f64 = 0.5;
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const LOG_FILENAME: &str = "radiocheck.log";

/// Extensions the upload affordances accept (audio/wav, audio/mpeg, audio/aiff).
pub const ACCEPTED_EXTENSIONS: &[&str] = &["wav", "mp3", "aif", "aiff"];

/// Resolved runtime settings, built once from the command line and environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f64,
    pub timeout_secs: u64,
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILENAME)
    }
}

/// `<platform data dir>/radiocheck`, or `./.radiocheck` when the platform has none.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("radiocheck"))
        .unwrap_or_else(|| PathBuf::from(".radiocheck"))
}

/// Whether a file name carries one of the accepted audio extensions.
pub fn is_accepted_audio(name: &str) -> bool {
    std::path::Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ACCEPTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
