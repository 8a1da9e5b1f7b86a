use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Default)]
pub struct Config {
    pub application: Application,
    pub backend: Backend,
    pub manga_api: MangaApi,
    pub cache: Cache,
    pub storage: Storage,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct Application {
    pub name: String,
    pub log_level: String,
}

impl Default for Application {
    fn default() -> Self {
        Self {
            name: "hilaw-client".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// How the backend expects the session credential to travel.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    Bearer,
    Cookie,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct Backend {
    pub base_url: String,
    pub auth_mode: AuthMode,
    pub session_check_path: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_seconds: u64,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            auth_mode: AuthMode::Bearer,
            session_check_path: "/auth/me".to_string(),
            timeout_seconds: 10,
        }
    }
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct MangaApi {
    pub base_url: String,
    pub image_origin: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_seconds: u64,
    pub retry: Retry,
}

impl Default for MangaApi {
    fn default() -> Self {
        Self {
            base_url: "https://api.comick.fun".to_string(),
            image_origin: "https://meo.comick.pictures".to_string(),
            timeout_seconds: 10,
            retry: Retry::default(),
        }
    }
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct Retry {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_retries: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub base_delay_ms: u64,
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 250,
        }
    }
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct Cache {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub hot_manga_ttl_minutes: i64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub trending_ttl_minutes: i64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub manga_info_ttl_minutes: i64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub chapters_ttl_minutes: i64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub profile_ttl_minutes: i64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub hot_manga_page_size: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub trending_limit: usize,
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            hot_manga_ttl_minutes: 60,
            trending_ttl_minutes: 60,
            manga_info_ttl_minutes: 60,
            chapters_ttl_minutes: 15,
            profile_ttl_minutes: 30,
            hot_manga_page_size: 30,
            trending_limit: 30,
        }
    }
}

impl Cache {
    pub fn hot_manga_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.hot_manga_ttl_minutes)
    }

    pub fn trending_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.trending_ttl_minutes)
    }

    pub fn manga_info_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.manga_info_ttl_minutes)
    }

    pub fn chapters_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.chapters_ttl_minutes)
    }

    pub fn profile_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.profile_ttl_minutes)
    }
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct Storage {
    /// Directory for persisted state. Without one everything lives in memory.
    pub directory: Option<PathBuf>,
    pub namespace: String,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            directory: None,
            namespace: "manga-hilaw".to_string(),
        }
    }
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self, anyhow::Error> {
        let base_path = std::env::current_dir()?;
        let environment: Environment = std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()
            .map_err(anyhow::Error::msg)?;

        Ok(Self::from_directory(base_path.join("configuration"), environment)?)
    }

    pub fn from_directory(
        config_directory: PathBuf,
        environment: Environment,
    ) -> Result<Self, figment::Error> {
        let environment_filename = format!("{}.yaml", environment.as_str());

        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::file(config_directory.join("base.yaml")))
            .merge(Yaml::file(config_directory.join(environment_filename)))
            .merge(Env::prefixed("APP_").split("__"))
            .extract()
    }
}

pub fn read_config() -> Result<Config, anyhow::Error> {
    Config::new()
}
