//! Service configuration
//!
//! Settings are read from an optional TOML file (`podcast.toml`). Every field
//! has a default so an empty or missing file yields a working service; the
//! command line can override the most common fields afterwards.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use podcast_minimax::{ClientConfig, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result, validation_error};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub provider: ProviderSettings,
    pub voices: BTreeMap<String, DefaultVoice>,
    pub bgm: BgmSettings,
    pub limits: LimitSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body, uploads included
    pub body_limit_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            body_limit_bytes: 100 * 1024 * 1024,
        }
    }
}

impl ServerSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| validation_error("server.host", "not a valid bind address").into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("outputs"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub base_url: String,
    pub group_id: Option<String>,
    pub tts_model: String,
    pub chat_model: String,
    pub image_model: String,
    pub speech_speed: f32,
    pub script_temperature: f32,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            group_id: None,
            tts_model: "speech-02-hd".to_string(),
            chat_model: "MiniMax-M1".to_string(),
            image_model: "image-01".to_string(),
            speech_speed: 1.0,
            script_temperature: 0.8,
            connect_timeout_secs: 10,
            request_timeout_secs: 300,
        }
    }
}

impl ProviderSettings {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            group_id: self.group_id.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..ClientConfig::default()
        }
    }
}

/// Built-in voice offered to callers by short name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultVoice {
    pub name: String,
    pub voice_id: String,
    pub gender: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BgmSettings {
    pub bgm01: PathBuf,
    pub bgm02: PathBuf,
}

impl Default for BgmSettings {
    fn default() -> Self {
        Self {
            bgm01: PathBuf::from("assets/bgm01.wav"),
            bgm02: PathBuf::from("assets/bgm02.wav"),
        }
    }
}

impl BgmSettings {
    /// Maps a public static file name onto its configured path.
    pub fn resolve(&self, filename: &str) -> Option<&Path> {
        match filename {
            "bgm01.wav" => Some(&self.bgm01),
            "bgm02.wav" => Some(&self.bgm02),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitSettings {
    pub max_content_chars: usize,
    pub max_dialogue_lines: usize,
    pub url_fetch_timeout_secs: u64,
    pub cover_download_timeout_secs: u64,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_content_chars: 20_000,
            max_dialogue_lines: 60,
            url_fetch_timeout_secs: 30,
            cover_download_timeout_secs: 30,
        }
    }
}

impl LimitSettings {
    pub fn url_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.url_fetch_timeout_secs)
    }

    pub fn cover_download_timeout(&self) -> Duration {
        Duration::from_secs(self.cover_download_timeout_secs)
    }
}

pub fn default_voices() -> BTreeMap<String, DefaultVoice> {
    [
        DefaultVoice {
            name: "mini".to_string(),
            voice_id: "female-shaonv".to_string(),
            gender: "female".to_string(),
            description: "Bright, lively female host".to_string(),
        },
        DefaultVoice {
            name: "max".to_string(),
            voice_id: "male-qn-jingying".to_string(),
            gender: "male".to_string(),
            description: "Calm, articulate male host".to_string(),
        },
    ]
    .into_iter()
    .map(|voice| (voice.name.clone(), voice))
    .collect()
}

impl Settings {
    /// Defaults with the built-in voices filled in.
    pub fn new() -> Self {
        Self {
            voices: default_voices(),
            ..Self::default()
        }
    }

    /// Load configuration from file
    pub async fn load(path: &Path) -> Result<Self> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|_| ConfigError::FileNotFound {
                    path: path.to_path_buf(),
                })?;

        let mut settings: Settings =
            toml::from_str(&content).map_err(|source| ConfigError::ParseError {
                path: path.to_path_buf(),
                source,
            })?;
        if settings.voices.is_empty() {
            settings.voices = default_voices();
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Load `path` when given, otherwise start from defaults.
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path).await,
            None => {
                let settings = Self::new();
                settings.validate()?;
                Ok(settings)
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.body_limit_bytes == 0 {
            return Err(validation_error("server.body_limit_bytes", "must be greater than 0").into());
        }
        if self.storage.upload_dir.as_os_str().is_empty() {
            return Err(validation_error("storage.upload_dir", "cannot be empty").into());
        }
        if self.storage.output_dir.as_os_str().is_empty() {
            return Err(validation_error("storage.output_dir", "cannot be empty").into());
        }
        if url::Url::parse(&self.provider.base_url).is_err() {
            return Err(validation_error("provider.base_url", "must be an absolute URL").into());
        }
        for (field, value) in [
            ("provider.tts_model", &self.provider.tts_model),
            ("provider.chat_model", &self.provider.chat_model),
            ("provider.image_model", &self.provider.image_model),
        ] {
            if value.trim().is_empty() {
                return Err(validation_error(field, "cannot be empty").into());
            }
        }
        if !(0.5..=2.0).contains(&self.provider.speech_speed) {
            return Err(validation_error("provider.speech_speed", "must be between 0.5 and 2.0").into());
        }
        if self.limits.max_content_chars == 0 {
            return Err(validation_error("limits.max_content_chars", "must be greater than 0").into());
        }
        if self.limits.max_dialogue_lines == 0 {
            return Err(validation_error("limits.max_dialogue_lines", "must be greater than 0").into());
        }
        if self.limits.url_fetch_timeout_secs == 0 || self.limits.cover_download_timeout_secs == 0 {
            return Err(validation_error("limits", "timeouts must be greater than 0").into());
        }
        for (key, voice) in &self.voices {
            if voice.voice_id.trim().is_empty() {
                return Err(validation_error(&format!("voices.{key}.voice_id"), "cannot be empty").into());
            }
        }
        Ok(())
    }

    pub fn voice(&self, name: &str) -> Option<&DefaultVoice> {
        self.voices.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::new();
        settings.validate().unwrap();
        assert_eq!(settings.voice("mini").unwrap().voice_id, "female-shaonv");
        assert_eq!(settings.voice("max").unwrap().voice_id, "male-qn-jingying");
        assert_eq!(settings.server.bind_addr().unwrap().port(), 5001);
    }

    #[tokio::test]
    async fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("podcast.toml");
        tokio::fs::write(
            &path,
            "[server]\nport = 8080\n\n[limits]\nmax_dialogue_lines = 10\n",
        )
        .await
        .unwrap();

        let settings = Settings::load(&path).await.unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.limits.max_dialogue_lines, 10);
        assert_eq!(settings.limits.max_content_chars, 20_000);
        assert_eq!(settings.voices.len(), 2);
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let err = Settings::load(Path::new("/no/such/podcast.toml"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::StudioError::Config(ConfigError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("podcast.toml");
        tokio::fs::write(&path, "[provider]\nbase_url = \"nope\"\n")
            .await
            .unwrap();
        let err = Settings::load(&path).await.unwrap_err();
        assert!(err.to_string().contains("provider.base_url"));

        tokio::fs::write(&path, "[server\n").await.unwrap();
        let err = Settings::load(&path).await.unwrap_err();
        assert!(matches!(
            err,
            crate::StudioError::Config(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn bgm_resolves_only_known_names() {
        let bgm = BgmSettings::default();
        assert_eq!(bgm.resolve("bgm01.wav"), Some(Path::new("assets/bgm01.wav")));
        assert_eq!(bgm.resolve("../secret"), None);
    }
}
