use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Language codes following ISO 639-1, plus "auto" for detection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lang(pub String);

impl Lang {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the "auto" pseudo-code requesting source detection
    pub fn is_auto(&self) -> bool {
        self.0 == "auto"
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Lang {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Lang {
    fn from(s: String) -> Self {
        Self(s)
    }
}

fn default_source_lang() -> Lang {
    Lang::new("auto")
}

fn default_target_lang() -> Lang {
    Lang::new("en")
}

/// Language used when source detection fails.
pub const DETECTION_FALLBACK_LANG: &str = "en";

/// Translation backend and chunking policy.
///
/// The retry/backoff/delay values are deliberately named fields rather than
/// inline constants so the chunked translator can be tested with a paused
/// clock and so operators can loosen them for stricter rate limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    /// Translation endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum characters per translation chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Total attempts per chunk before aborting the run
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed wait between attempts for the same chunk, in seconds
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,

    /// Fixed pause after each successful chunk, in seconds
    #[serde(default = "default_chunk_delay_secs")]
    pub chunk_delay_secs: u64,

    /// Characters of document text sampled for language detection
    #[serde(default = "default_detect_sample_chars")]
    pub detect_sample_chars: usize,
}

fn default_endpoint() -> String {
    "https://translate.googleapis.com/translate_a/single".to_string()
}

const fn default_request_timeout_secs() -> u64 {
    60
}

const fn default_chunk_size() -> usize {
    4000
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_retry_backoff_secs() -> u64 {
    3
}

const fn default_chunk_delay_secs() -> u64 {
    1
}

const fn default_detect_sample_chars() -> usize {
    2000
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_secs: default_request_timeout_secs(),
            chunk_size: default_chunk_size(),
            max_attempts: default_max_attempts(),
            retry_backoff_secs: default_retry_backoff_secs(),
            chunk_delay_secs: default_chunk_delay_secs(),
            detect_sample_chars: default_detect_sample_chars(),
        }
    }
}

/// Candidate font files for non-Latin target scripts.
///
/// The resolver walks `search_paths` in order and embeds the first file it
/// can load. The defaults favor Noto Sans Bengali; other scripts can be
/// served by prepending paths here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontConfig {
    #[serde(default = "default_font_search_paths")]
    pub search_paths: Vec<PathBuf>,
}

fn default_font_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(exe) = std::env::current_exe()
        && let Some(dir) = exe.parent()
    {
        paths.push(dir.join("NotoSansBengali-Regular.ttf"));
    }

    paths.push(PathBuf::from(
        "/usr/share/fonts/truetype/noto/NotoSansBengali-Regular.ttf",
    ));

    if let Some(home) = std::env::var_os("HOME") {
        paths.push(PathBuf::from(home).join(".fonts/NotoSansBengali-Regular.ttf"));
    }

    let windows_fonts = PathBuf::from("C:\\Windows\\Fonts");
    paths.push(windows_fonts.join("NotoSansBengali-Regular.ttf"));
    paths.push(windows_fonts.join("solaimanlipi.ttf"));
    paths.push(windows_fonts.join("kalpurush.ttf"));

    paths
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            search_paths: default_font_search_paths(),
        }
    }
}

/// Page geometry for the flow-reconstruction renderer (US Letter defaults).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FlowConfig {
    #[serde(default = "default_page_width")]
    pub page_width: f32,
    #[serde(default = "default_page_height")]
    pub page_height: f32,
    #[serde(default = "default_margin")]
    pub margin: f32,
    #[serde(default = "default_line_height")]
    pub line_height: f32,
    #[serde(default = "default_flow_font_size")]
    pub font_size: f32,
}

const fn default_page_width() -> f32 {
    612.0
}

const fn default_page_height() -> f32 {
    792.0
}

const fn default_margin() -> f32 {
    72.0
}

const fn default_line_height() -> f32 {
    16.0
}

const fn default_flow_font_size() -> f32 {
    12.0
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            page_width: default_page_width(),
            page_height: default_page_height(),
            margin: default_margin(),
            line_height: default_line_height(),
            font_size: default_flow_font_size(),
        }
    }
}

/// Settings for the layout-preservation renderer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Rasterization resolution for page backgrounds
    #[serde(default = "default_render_dpi")]
    pub render_dpi: f32,

    /// Fixed font size for overlaid block text (fit is not enforced)
    #[serde(default = "default_block_font_size")]
    pub block_font_size: f32,

    /// JPEG quality for background images (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

const fn default_render_dpi() -> f32 {
    150.0
}

const fn default_block_font_size() -> f32 {
    10.0
}

const fn default_jpeg_quality() -> u8 {
    85
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            render_dpi: default_render_dpi(),
            block_font_size: default_block_font_size(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Source language ("auto" = detect from extracted text)
    #[serde(default = "default_source_lang")]
    pub source_lang: Lang,

    /// Target language
    #[serde(default = "default_target_lang")]
    pub target_lang: Lang,

    /// Translation backend and chunking policy
    #[serde(default)]
    pub translator: TranslatorConfig,

    /// Font search configuration
    #[serde(default)]
    pub fonts: FontConfig,

    /// Flow renderer page geometry
    #[serde(default)]
    pub flow: FlowConfig,

    /// Layout renderer settings
    #[serde(default)]
    pub layout: LayoutConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_lang: default_source_lang(),
            target_lang: default_target_lang(),
            translator: TranslatorConfig::default(),
            fonts: FontConfig::default(),
            flow: FlowConfig::default(),
            layout: LayoutConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::error::Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::error::Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        toml::from_str(&content)
            .map_err(|e| crate::error::Error::ConfigLoad(format!("Failed to parse config: {e}")))
    }

    /// Load from default locations (~/.config/pdf-babel/config.toml, ./config.toml)
    pub fn load() -> Self {
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("pdf-babel").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        let local_config = std::path::PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.source_lang.is_auto());
        assert_eq!(config.target_lang.as_str(), "en");
        assert_eq!(config.translator.chunk_size, 4000);
        assert_eq!(config.translator.max_attempts, 3);
        assert_eq!(config.translator.retry_backoff_secs, 3);
        assert_eq!(config.translator.chunk_delay_secs, 1);
    }

    #[test]
    fn test_partial_config_parses() {
        let config: AppConfig = toml::from_str(
            r#"
            target_lang = "bn"

            [translator]
            chunk_size = 1000
            "#,
        )
        .unwrap();
        assert_eq!(config.target_lang.as_str(), "bn");
        assert_eq!(config.translator.chunk_size, 1000);
        // Untouched fields keep their defaults
        assert_eq!(config.translator.max_attempts, 3);
        assert_eq!(config.flow.margin, 72.0);
    }
}
