//! [`Config`]-related definitions.

use std::time;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use serde::{de, Deserialize, Deserializer};
use service::domain::house::similarity::Score;
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// [JWT] secret.
    ///
    /// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
    #[default("secret".to_owned())]
    pub jwt_secret: String,

    /// Duplicate detection configuration.
    pub duplicates: Duplicates,
}

impl From<Service> for service::Config {
    fn from(value: Service) -> Self {
        let Service {
            jwt_secret,
            duplicates: Duplicates {
                similarity_threshold,
            },
        } = value;
        Self {
            jwt_encoding_key: jsonwebtoken::EncodingKey::from_secret(
                jwt_secret.as_bytes(),
            ),
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(
                jwt_secret.as_bytes(),
            ),
            similarity_threshold,
        }
    }
}

/// Duplicate detection configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Duplicates {
    /// Minimal score at which registered houses are reported as similar to
    /// the one being saved.
    #[default(Score::WARNING_THRESHOLD)]
    #[serde(deserialize_with = "deserialize_score")]
    pub similarity_threshold: Score,
}

/// Deserializes a [`Score`] from its string or numeric representation.
fn deserialize_score<'de, D>(deserializer: D) -> Result<Score, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Str(String),
    }

    let s = match Raw::deserialize(deserializer)? {
        Raw::Num(n) => n.to_string(),
        Raw::Str(s) => s,
    };
    s.parse().map_err(|e| {
        de::Error::custom(format!("invalid similarity threshold `{s}`: {e}"))
    })
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("localhost".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("housing_user".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("secure_password".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("housing_fund".to_owned())]
    pub dbname: String,

    /// Timeout of establishing a new connection.
    #[default(time::Duration::from_secs(5))]
    #[serde(with = "humantime_serde")]
    pub connect_timeout: time::Duration,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
            connect_timeout,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            connect_timeout: Some(connect_timeout),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use config::{builder::DefaultState, ConfigBuilder};
    use service::domain::house::similarity::Score;

    use super::Config;

    fn load(overrides: &[(&str, &str)]) -> Config {
        overrides
            .iter()
            .fold(ConfigBuilder::<DefaultState>::default(), |b, (k, v)| {
                b.set_override(*k, *v).expect("valid override")
            })
            .build()
            .expect("valid config")
            .try_deserialize()
            .expect("deserializable config")
    }

    #[test]
    fn defaults_to_housing_fund_database() {
        let conf = load(&[]);

        assert_eq!(conf.postgres.host, "localhost");
        assert_eq!(conf.postgres.port, 5432);
        assert_eq!(conf.postgres.dbname, "housing_fund");
        assert_eq!(conf.postgres.user, "housing_user");
        assert_eq!(conf.postgres.connect_timeout.as_secs(), 5);
    }

    #[test]
    fn defaults_to_warning_threshold() {
        let conf = load(&[]);

        assert_eq!(
            conf.service.duplicates.similarity_threshold,
            Score::WARNING_THRESHOLD,
        );
    }

    #[test]
    fn overrides_threshold() {
        let conf =
            load(&[("service.duplicates.similarity_threshold", "0.85")]);

        assert_eq!(
            conf.service.duplicates.similarity_threshold,
            "0.85".parse::<Score>().expect("valid score"),
        );
    }

    #[test]
    fn rejects_threshold_out_of_range() {
        let res = ConfigBuilder::<DefaultState>::default()
            .set_override("service.duplicates.similarity_threshold", "1.5")
            .expect("valid override")
            .build()
            .expect("valid config")
            .try_deserialize::<Config>();

        assert!(res.is_err());
    }

    #[test]
    fn parses_humantime_durations() {
        let conf = load(&[("postgres.connect_timeout", "1m 30s")]);

        assert_eq!(conf.postgres.connect_timeout.as_secs(), 90);
    }
}
