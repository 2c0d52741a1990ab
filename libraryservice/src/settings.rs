use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
/// Location of the static documents the record store is seeded from
pub struct DataSettings {
    pub books_path: PathBuf,
    pub users_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    pub service_name: String,
    /// Exports spans to a local Jaeger agent when set
    pub jaeger_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub data: DataSettings,
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Built-in defaults, then `config/libraryservice.*` if present,
    /// then `LIBRARY__SECTION__KEY` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::with_name("config/libraryservice").required(false))
            .add_source(
                Environment::with_prefix("LIBRARY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("data.books_path", "data/books.json")?
            .set_default("data.users_path", "data/users.json")?
            .set_default("telemetry.service_name", "libraryservice")?
            .set_default("telemetry.jaeger_enabled", false)
    }
}

#[cfg(test)]
mod settings_tests {
    use super::*;

    #[test]
    fn defaults_are_complete() {
        let settings: Settings = Settings::builder()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.data.books_path, PathBuf::from("data/books.json"));
        assert!(!settings.telemetry.jaeger_enabled);
    }

    #[test]
    fn overrides_win_over_defaults() {
        let settings: Settings = Settings::builder()
            .unwrap()
            .set_override("server.port", 8080)
            .unwrap()
            .set_override("data.users_path", "/srv/users.json")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.data.users_path, PathBuf::from("/srv/users.json"));
    }
}
