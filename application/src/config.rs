//! [`Config`]-related definitions.

use std::{num::NonZeroU8, time};

use common::Money;
use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use derive_more::{Display, Error as StdError};
use secrecy::SecretString;
use serde::Deserialize;
use service::{
    domain::lead,
    infra::{mail::sendgrid, payment::stripe},
};
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Stripe configuration.
    pub stripe: Stripe,

    /// SendGrid configuration.
    pub sendgrid: SendGrid,

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
    /// Key authorizing administrative requests.
    ///
    /// Administrative requests are refused while it's empty.
    pub admin_key: String,

    /// Price of a lead purchase unless specified on publishing, like
    /// `39.00EUR`.
    #[default("39.00EUR".to_owned())]
    pub lead_price: String,

    /// Maximum number of lead purchases unless specified on publishing.
    #[default(3)]
    pub lead_max_sales: u8,

    /// Number of attempts to record a lead purchase under contention.
    #[default(3)]
    pub purchase_attempts: u8,

    /// Time a professional lookup is cached for while tracking interactions.
    #[default(time::Duration::from_secs(5 * 60))]
    #[serde(with = "humantime_serde")]
    pub professional_cache_ttl: time::Duration,

    /// Service tasks configuration.
    pub tasks: Tasks,
}

impl TryFrom<Service> for service::Config {
    type Error = InvalidServiceConfig;

    fn try_from(value: Service) -> Result<Self, Self::Error> {
        let Service {
            admin_key,
            lead_price,
            lead_max_sales,
            purchase_attempts,
            professional_cache_ttl,
            tasks: Tasks { expire_premiums },
        } = value;

        let lead_price = lead_price
            .parse::<Money>()
            .ok()
            .filter(Money::is_positive)
            .ok_or(InvalidServiceConfig::LeadPrice)?;
        let lead_max_sales = lead::MaxSales::new(lead_max_sales)
            .ok_or(InvalidServiceConfig::LeadMaxSales)?;
        let purchase_attempts = NonZeroU8::new(purchase_attempts)
            .ok_or(InvalidServiceConfig::PurchaseAttempts)?;

        Ok(Self {
            admin_key: SecretString::from(admin_key),
            lead_price,
            lead_max_sales,
            purchase_attempts,
            professional_cache_ttl,
            expire_premiums: service::task::expire_premiums::Config {
                interval: expire_premiums.interval,
            },
        })
    }
}

/// Error of converting [`Service`] configuration.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum InvalidServiceConfig {
    /// `lead_price` is not a positive amount.
    #[display("`service.lead_price` must be a positive amount like `39.00EUR`")]
    LeadPrice,

    /// `lead_max_sales` is out of range.
    #[display(
        "`service.lead_max_sales` must be within `1..={}`",
        lead::MaxSales::MAX
    )]
    LeadMaxSales,

    /// `purchase_attempts` is zero.
    #[display("`service.purchase_attempts` must be positive")]
    PurchaseAttempts,
}

/// Service tasks configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Tasks {
    /// `ExpirePremiums` task configuration.
    pub expire_premiums: Task,
}

/// Service task configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Task {
    /// Task execution interval.
    ///
    /// The task is disabled if not specified.
    #[serde(with = "humantime_serde")]
    pub interval: Option<time::Duration>,
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// [Stripe] configuration.
///
/// [Stripe]: https://stripe.com
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Stripe {
    /// Secret API key.
    pub secret_key: String,

    /// Base URL of the API.
    #[default("https://api.stripe.com".to_owned())]
    pub api_url: String,
}

impl From<Stripe> for stripe::Config {
    fn from(value: Stripe) -> Self {
        let Stripe {
            secret_key,
            api_url,
        } = value;

        Self {
            secret_key: SecretString::from(secret_key),
            api_url,
        }
    }
}

/// [SendGrid] configuration.
///
/// [SendGrid]: https://sendgrid.com
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct SendGrid {
    /// API key.
    pub api_key: String,

    /// Base URL of the API.
    #[default("https://api.sendgrid.com".to_owned())]
    pub api_url: String,

    /// Email address the messages are sent from.
    #[default("noreply@portail-habitat.fr".to_owned())]
    pub sender_email: String,

    /// Name the messages are sent from.
    #[default("Portail Habitat".to_owned())]
    pub sender_name: String,
}

impl From<SendGrid> for sendgrid::Config {
    fn from(value: SendGrid) -> Self {
        let SendGrid {
            api_key,
            api_url,
            sender_email,
            sender_name,
        } = value;

        Self {
            api_key: SecretString::from(api_key),
            api_url,
            sender_email,
            sender_name,
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
    use common::{Currency, Money};

    use super::{InvalidServiceConfig, Service};

    #[test]
    fn converts_default_service_config() {
        let config = service::Config::try_from(Service::default()).unwrap();

        assert_eq!(
            config.lead_price,
            Money::from_minor_units(3900, Currency::Eur),
        );
        assert_eq!(u8::from(config.lead_max_sales), 3);
        assert_eq!(config.purchase_attempts.get(), 3);
        assert!(config.expire_premiums.interval.is_none());
    }

    #[test]
    fn rejects_invalid_service_config() {
        let free = Service {
            lead_price: "0EUR".to_owned(),
            ..Service::default()
        };
        assert!(matches!(
            service::Config::try_from(free),
            Err(InvalidServiceConfig::LeadPrice),
        ));

        let unlimited = Service {
            lead_max_sales: 11,
            ..Service::default()
        };
        assert!(matches!(
            service::Config::try_from(unlimited),
            Err(InvalidServiceConfig::LeadMaxSales),
        ));
    }
}
