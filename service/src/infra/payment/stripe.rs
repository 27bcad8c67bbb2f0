//! [Stripe] [`Payments`] implementation.
//!
//! [Stripe]: https://docs.stripe.com/api/payment_intents

use std::{collections::HashMap, str::FromStr as _, sync::Arc};

use common::{
    operations::{By, Insert, Select},
    Currency, Money,
};
use derive_more::{Debug, Display, Error as StdError, From};
use reqwest::StatusCode;
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use smart_default::SmartDefault;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        contact,
        payment::{
            Intent, IntentId, IntentStatus, LeadPurchase, NewIntent, Purpose,
        },
    },
    infra::payment,
};
#[cfg(doc)]
use crate::infra::Payments;

/// [`Stripe`] configuration.
#[derive(Clone, Debug, SmartDefault)]
pub struct Config {
    /// Secret API key.
    #[debug(skip)]
    #[default(SecretString::from(""))]
    pub secret_key: SecretString,

    /// Base URL of the API.
    #[default("https://api.stripe.com".into())]
    pub api_url: String,
}

/// [Stripe] API client.
///
/// [Stripe]: https://stripe.com
#[derive(Clone, Debug)]
pub struct Stripe(Arc<Inner>);

/// Inner representation of a [`Stripe`] client.
#[derive(Debug)]
struct Inner {
    /// HTTP client performing requests.
    http: reqwest::Client,

    /// [`Config`] of the client.
    config: Config,
}

impl Stripe {
    /// Metadata key holding the [`Purpose`] tag of an [`Intent`].
    const PURPOSE_KEY: &'static str = "type";

    /// Creates a new [`Stripe`] client with the provided [`Config`].
    ///
    /// # Errors
    ///
    /// If failed to build an HTTP client.
    pub fn new(config: Config) -> Result<Self, Traced<payment::Error>> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;
        Ok(Self(Arc::new(Inner { http, config })))
    }

    /// Returns the URL of the `payment_intents` API resource.
    fn intents_url(&self) -> String {
        format!(
            "{}/v1/payment_intents",
            self.0.config.api_url.trim_end_matches('/'),
        )
    }

    /// Sends the provided request and decodes the [`Intent`] from its
    /// response.
    ///
    /// [`None`] is returned if [Stripe] responds with
    /// [`StatusCode::NOT_FOUND`].
    ///
    /// [Stripe]: https://stripe.com
    async fn send(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<Option<Intent>, Traced<payment::Error>> {
        let resp = req
            .bearer_auth(self.0.config.secret_key.expose_secret())
            .send()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let message = resp
                .json::<ErrorResponse>()
                .await
                .map(|r| r.error.message)
                .unwrap_or_default();
            return Err(tracerr::new!(Error::Api {
                status: status.as_u16(),
                message,
            }))
            .map_err(tracerr::map_from);
        }

        let raw = resp
            .json::<RawIntent>()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;
        raw.try_into()
            .map(Some)
            .map_err(|e: Error| tracerr::new!(e))
            .map_err(tracerr::map_from)
    }
}

impl payment::Payments<Insert<NewIntent>> for Stripe {
    type Ok = Intent;
    type Err = Traced<payment::Error>;

    async fn execute(
        &self,
        Insert(new): Insert<NewIntent>,
    ) -> Result<Self::Ok, Self::Err> {
        let NewIntent {
            amount,
            description,
            purchase,
        } = new;

        let cents = amount
            .to_minor_units()
            .ok_or(Error::InvalidAmount(amount))
            .map_err(tracerr::wrap!())
            .map_err(tracerr::map_from)?;
        let form = [
            ("amount", cents.to_string()),
            ("currency", amount.currency.to_string().to_lowercase()),
            ("description", description),
            ("automatic_payment_methods[enabled]", "true".into()),
            ("metadata[type]", Purpose::MARKETPLACE_LEAD.into()),
            ("metadata[leadId]", purchase.lead_id.to_string()),
            ("metadata[buyerId]", purchase.buyer_id.to_string()),
            ("metadata[buyerName]", purchase.buyer_name.to_string()),
            ("metadata[buyerEmail]", purchase.buyer_email.to_string()),
        ];

        let req = self.0.http.post(self.intents_url()).form(&form);
        self.send(req)
            .await
            .map_err(tracerr::wrap!())?
            .ok_or_else(|| {
                tracerr::new!(Error::Malformed("created intent not found"))
            })
            .map_err(tracerr::map_from)
    }
}

impl payment::Payments<Select<By<Option<Intent>, IntentId>>> for Stripe {
    type Ok = Option<Intent>;
    type Err = Traced<payment::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Intent>, IntentId>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let req = self.0.http.get(format!("{}/{id}", self.intents_url()));
        self.send(req).await.map_err(tracerr::wrap!())
    }
}

/// [Stripe] payment intent object.
///
/// [Stripe]: https://docs.stripe.com/api/payment_intents/object
#[derive(Debug, Deserialize)]
struct RawIntent {
    /// Unique identifier of the object.
    id: String,

    /// Client secret of the payment intent.
    #[debug(skip)]
    client_secret: String,

    /// Amount in the smallest currency unit.
    amount: i64,

    /// Three-letter ISO currency code, in lowercase.
    currency: String,

    /// Status of the payment intent.
    status: String,

    /// Key-value pairs attached to the object.
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl TryFrom<RawIntent> for Intent {
    type Error = Error;

    fn try_from(raw: RawIntent) -> Result<Self, Self::Error> {
        let RawIntent {
            id,
            client_secret,
            amount,
            currency,
            status,
            mut metadata,
        } = raw;

        let id = IntentId::new(id).ok_or(Error::Malformed("`id`"))?;
        let currency = Currency::from_str(&currency.to_uppercase())
            .map_err(|_| Error::Malformed("`currency`"))?;
        let status = IntentStatus::from_str(&status)
            .map_err(|_| Error::Malformed("`status`"))?;

        let tag = metadata.remove(Stripe::PURPOSE_KEY).unwrap_or_default();
        let purpose = if tag == Purpose::MARKETPLACE_LEAD {
            let mut field = |key: &str| {
                metadata.remove(key).ok_or(Error::Malformed("`metadata`"))
            };
            Purpose::MarketplaceLead(LeadPurchase {
                lead_id: field("leadId")?
                    .parse()
                    .map_err(|_| Error::Malformed("`metadata.leadId`"))?,
                buyer_id: field("buyerId")?
                    .parse()
                    .map_err(|_| Error::Malformed("`metadata.buyerId`"))?,
                buyer_name: contact::Name::new(field("buyerName")?)
                    .ok_or(Error::Malformed("`metadata.buyerName`"))?,
                buyer_email: contact::Email::new(field("buyerEmail")?)
                    .ok_or(Error::Malformed("`metadata.buyerEmail`"))?,
            })
        } else {
            log::debug!("payment intent `{id}` is tagged `{tag}`");
            Purpose::Other(tag)
        };

        Ok(Self {
            id,
            client_secret: client_secret.into(),
            amount: Money::from_minor_units(amount, currency),
            status,
            purpose,
        })
    }
}

/// [Stripe] error response.
///
/// [Stripe]: https://docs.stripe.com/api/errors
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    /// Error details.
    error: ErrorDetails,
}

/// Details of an [`ErrorResponse`].
#[derive(Debug, Deserialize)]
struct ErrorDetails {
    /// Human-readable message.
    #[serde(default)]
    message: String,
}

/// [`Stripe`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// HTTP request failed.
    #[display("HTTP request failed: {_0}")]
    Request(reqwest::Error),

    /// API responded with an error.
    #[display("Stripe API responded with `{status}`: {message}")]
    #[from(ignore)]
    Api {
        /// HTTP status code of the response.
        status: u16,

        /// Error message of the response.
        message: String,
    },

    /// Amount cannot be charged.
    #[display("`{_0}` cannot be charged")]
    #[from(ignore)]
    InvalidAmount(#[error(not(source))] Money),

    /// API responded with an unexpected payload.
    #[display("Malformed payment intent: {_0}")]
    #[from(ignore)]
    Malformed(#[error(not(source))] &'static str),
}
