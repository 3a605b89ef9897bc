use pixelstore_codec::CompressionConfig;
use pixelstore_common::i18n::Locale;
use pixelstore_common::paths::{UrlLayout, STATIC_IMAGE_URL_PREFIX};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub compression: CompressionConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    2368
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory stored images live under
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Sub-directory the site is mounted under (e.g. "/blog")
    #[serde(default)]
    pub subdir: String,

    /// URL prefix identifying stored images
    #[serde(default = "default_static_prefix")]
    pub static_prefix: String,

    /// `max-age` sent with served images (default: one year)
    #[serde(default = "default_cache_max_age")]
    pub cache_max_age_secs: u64,

    /// Language of user-facing error messages
    #[serde(default)]
    pub locale: Locale,
}

fn default_root() -> PathBuf {
    PathBuf::from("./content/images")
}

fn default_static_prefix() -> String {
    STATIC_IMAGE_URL_PREFIX.to_string()
}

fn default_cache_max_age() -> u64 {
    365 * 24 * 60 * 60
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            subdir: String::new(),
            static_prefix: default_static_prefix(),
            cache_max_age_secs: default_cache_max_age(),
            locale: Locale::default(),
        }
    }
}

impl StorageConfig {
    pub fn url_layout(&self) -> UrlLayout {
        UrlLayout::new(self.subdir.clone(), self.static_prefix.clone())
    }

    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cache_max_age_secs)
    }
}
