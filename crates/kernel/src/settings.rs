use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "FEEDBASE_ENV";
const CONFIG_DIR_ENV: &str = "FEEDBASE_CONFIG_DIR";
const ENV_PREFIX: &str = "FEEDBASE";

/// Environment variable naming the database to bootstrap.
pub const DATABASE_NAME_ENV: &str = "MONGO_INITDB_DATABASE";
/// Environment variable carrying the MongoDB connection string.
pub const DATABASE_URI_ENV: &str = "MONGO_URL";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl Environment {
    fn parse(value: &str) -> anyhow::Result<Self> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

/// Values read from well-known process variables that take precedence over files.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub database_name: Option<String>,
    pub database_uri: Option<String>,
}

impl EnvOverrides {
    /// Capture the overrides from the current process environment.
    pub fn from_process() -> Self {
        Self {
            database_name: std::env::var(DATABASE_NAME_ENV).ok(),
            database_uri: std::env::var(DATABASE_URI_ENV).ok(),
        }
    }
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay,
    /// `FEEDBASE__*` variables and finally the MongoDB init variables.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            // Default to the `config` directory under the working directory.
            Err(_) => std::env::current_dir()
                .map(|cwd| cwd.join("config"))
                .with_context(|| "unable to resolve current directory")?,
        };

        let env_source = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__");

        Self::layered(
            &config_dir,
            &environment,
            EnvOverrides::from_process(),
            Some(env_source),
        )
    }

    /// Build settings from an explicit config directory and override set.
    ///
    /// `load` is a thin wrapper that gathers these inputs from the process;
    /// everything after that point is deterministic.
    pub fn layered(
        config_dir: &Path,
        environment: &str,
        overrides: EnvOverrides,
        env_source: Option<config::Environment>,
    ) -> anyhow::Result<Self> {
        let parsed_environment = Environment::parse(environment)?;

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let mut builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false));

        if let Some(source) = env_source {
            builder = builder.add_source(source);
        }

        let builder = builder
            .set_override_option("database.name", overrides.database_name)
            .with_context(|| format!("failed to apply {}", DATABASE_NAME_ENV))?
            .set_override_option("database.uri", overrides.database_uri)
            .with_context(|| format!("failed to apply {}", DATABASE_URI_ENV))?;

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        settings.environment = parsed_environment;

        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "DatabaseSettings::default_uri")]
    pub uri: String,
    /// Target database. Left unset here so a missing value is reported by the
    /// bootstrapper instead of silently falling back to a default.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "DatabaseSettings::default_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "DatabaseSettings::default_timeout_ms")]
    pub server_selection_timeout_ms: u64,
}

impl DatabaseSettings {
    fn default_uri() -> String {
        "mongodb://127.0.0.1:27017".to_string()
    }

    fn default_timeout_ms() -> u64 {
        10_000
    }

    /// Settings pointing at the default URI with the given database name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            uri: Self::default_uri(),
            name: None,
            connect_timeout_ms: Self::default_timeout_ms(),
            server_selection_timeout_ms: Self::default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// Default `EnvFilter` directive when `RUST_LOG` is not set.
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, file: &str, contents: &str) {
        std::fs::write(dir.join(file), contents).unwrap();
    }

    #[test]
    fn default_environment_is_local() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Local);
    }

    #[test]
    fn default_database_uri_is_localhost() {
        let settings = Settings::default();
        assert_eq!(settings.database.uri, "mongodb://127.0.0.1:27017");
        assert_eq!(settings.database.name, None);
    }

    #[test]
    fn missing_config_dir_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::layered(
            &dir.path().join("absent"),
            "local",
            EnvOverrides::default(),
            None,
        )
        .unwrap();

        assert_eq!(settings.database.connect_timeout_ms, 10_000);
        assert_eq!(settings.telemetry.log_format, LogFormat::Pretty);
        assert!(settings.database.name.is_none());
    }

    #[test]
    fn environment_file_overlays_base_file() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "base.toml",
            "[database]\nname = \"base\"\nuri = \"mongodb://base:27017\"\n",
        );
        write(
            dir.path(),
            "staging.toml",
            "[database]\nname = \"staging_feed\"\n\n[telemetry]\nlog_format = \"json\"\n",
        );

        let settings =
            Settings::layered(dir.path(), "staging", EnvOverrides::default(), None).unwrap();

        assert_eq!(settings.environment, Environment::Staging);
        assert_eq!(settings.database.name.as_deref(), Some("staging_feed"));
        assert_eq!(settings.database.uri, "mongodb://base:27017");
        assert_eq!(settings.telemetry.log_format, LogFormat::Json);
    }

    #[test]
    fn init_variables_take_precedence_over_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "base.toml", "[database]\nname = \"from_file\"\n");

        let overrides = EnvOverrides {
            database_name: Some("blog".to_string()),
            database_uri: Some("mongodb://mongo:27017".to_string()),
        };
        let settings = Settings::layered(dir.path(), "local", overrides, None).unwrap();

        assert_eq!(settings.database.name.as_deref(), Some("blog"));
        assert_eq!(settings.database.uri, "mongodb://mongo:27017");
    }

    #[test]
    fn empty_init_variable_is_kept_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = EnvOverrides {
            database_name: Some(String::new()),
            database_uri: None,
        };
        let settings = Settings::layered(dir.path(), "local", overrides, None).unwrap();

        assert_eq!(settings.database.name.as_deref(), Some(""));
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::layered(dir.path(), "qa", EnvOverrides::default(), None).unwrap_err();
        assert!(err.to_string().contains("unsupported environment 'qa'"));
    }
}
