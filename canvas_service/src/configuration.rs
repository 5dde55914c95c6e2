use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::{
    postgres::{PgConnectOptions, PgSslMode},
    ConnectOptions,
};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub document_store: DocumentStoreSettings,
    pub vector_index: VectorIndexSettings,
    pub anthropic: AnthropicSettings,
    pub coordinates: CoordinatesSettings,
    pub similarity: SimilaritySettings,
    pub gravity: GravitySettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

/// Where artifacts documents are persisted
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum DocumentStoreSettings {
    InMemory,
    Postgres(DatabaseSettings),
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub database_name: String,
    // Determines if we demand the connection to be encrypted or not
    pub require_ssl: bool,
}

impl DatabaseSettings {
    pub fn without_db(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };
        PgConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(self.password.expose_secret())
            .port(self.port)
            .ssl_mode(ssl_mode)
    }

    pub fn with_db(&self) -> PgConnectOptions {
        // sqlx statements are logged at TRACE level, not INFO
        self.without_db()
            .database(&self.database_name)
            .log_statements(tracing::log::LevelFilter::Trace)
    }
}

/// Where the nearest-neighbor structure over artifacts coordinates lives
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum VectorIndexSettings {
    InMemory,
    Qdrant(QdrantSettings),
}

#[derive(Debug, Deserialize, Clone)]
pub struct QdrantSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub grpc_port: u16,
    /// Prefix of the collection name, the index schema version is appended to it
    pub collection_prefix: String,
}

impl QdrantSettings {
    pub fn get_grpc_base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.grpc_port)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnthropicSettings {
    pub base_url: String,
    pub api_key: Secret<String>,
    pub generation_model: String,
    pub embedding_model: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub generation_max_tokens: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CoordinatesSettings {
    pub mode: CoordinatesMode,
}

/// How coordinates are given to a newly created artifact
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CoordinatesMode {
    /// Independent uniform draws, until a real embedding is requested
    Random,
    /// Asks the embedding collaborator for the artifact text
    Embedding,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimilaritySettings {
    pub gravity_threshold: f32,
    pub magnet_distance_threshold: f32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub magnet_top_k: usize,
    /// Above this number of artifacts, computing gravity pairs is logged as degraded
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub large_room_warning: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GravitySettings {
    pub enabled: bool,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub interval_secs: u64,
    pub min_separation: f64,
    pub strength: f64,
}

/// Extracts app settings from configuration files and env variables
///
/// `base.yaml` holds the settings shared by all environments, then `local.yaml` or `production.yaml`
/// is layered on top depending on `APP_ENVIRONMENT` (`local` when unset).
///
/// Environment variables prefixed with `APP` and using `__` as separator win over files,
/// for ex: `APP_APPLICATION__PORT=5001` sets `Settings.application.port`
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .expect("Failed to parse APP_ENVIRONMENT.");
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

/// The possible runtime environment for our application.
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
