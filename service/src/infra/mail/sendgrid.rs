//! [SendGrid] [`Mailer`] implementation.
//!
//! [SendGrid]: https://www.twilio.com/docs/sendgrid/api-reference/mail-send

use std::sync::Arc;

use common::operations::Deliver;
use derive_more::{Debug, Display, Error as StdError, From};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Serialize;
use smart_default::SmartDefault;
use tracerr::Traced;

use crate::infra::mail::{self, Message};
#[cfg(doc)]
use crate::infra::Mailer;

/// [`SendGrid`] configuration.
#[derive(Clone, Debug, SmartDefault)]
pub struct Config {
    /// API key.
    #[debug(skip)]
    #[default(SecretString::from(""))]
    pub api_key: SecretString,

    /// Base URL of the API.
    #[default("https://api.sendgrid.com".into())]
    pub api_url: String,

    /// Email address the messages are sent from.
    #[default("noreply@portail-habitat.fr".into())]
    pub sender_email: String,

    /// Name the messages are sent from.
    #[default("Portail Habitat".into())]
    pub sender_name: String,
}

/// [SendGrid] API client.
///
/// [SendGrid]: https://sendgrid.com
#[derive(Clone, Debug)]
pub struct SendGrid(Arc<Inner>);

/// Inner representation of a [`SendGrid`] client.
#[derive(Debug)]
struct Inner {
    /// HTTP client performing requests.
    http: reqwest::Client,

    /// [`Config`] of the client.
    config: Config,
}

impl SendGrid {
    /// Creates a new [`SendGrid`] client with the provided [`Config`].
    ///
    /// # Errors
    ///
    /// If failed to build an HTTP client.
    pub fn new(config: Config) -> Result<Self, Traced<mail::Error>> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;
        Ok(Self(Arc::new(Inner { http, config })))
    }
}

impl mail::Mailer<Deliver<Message>> for SendGrid {
    type Ok = ();
    type Err = Traced<mail::Error>;

    async fn execute(
        &self,
        Deliver(msg): Deliver<Message>,
    ) -> Result<Self::Ok, Self::Err> {
        let Config {
            api_key,
            api_url,
            sender_email,
            sender_name,
        } = &self.0.config;

        let payload = Payload {
            personalizations: [Personalization {
                to: [Address {
                    email: msg.to.as_ref(),
                    name: None,
                }],
            }],
            from: Address {
                email: sender_email.as_str(),
                name: Some(sender_name.as_str()),
            },
            subject: &msg.subject,
            content: [Content {
                kind: "text/html",
                value: &msg.html,
            }],
        };

        let resp = self
            .0
            .http
            .post(format!("{}/v3/mail/send", api_url.trim_end_matches('/')))
            .bearer_auth(api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(tracerr::new!(Error::Api {
                status: status.as_u16(),
                body,
            }))
            .map_err(tracerr::map_from);
        }
        Ok(())
    }
}

/// [SendGrid] mail send request body.
///
/// [SendGrid]: https://docs.sendgrid.com/api-reference/mail-send/mail-send
#[derive(Debug, Serialize)]
struct Payload<'a> {
    /// Recipients of the message.
    personalizations: [Personalization<'a>; 1],

    /// Sender of the message.
    from: Address<'a>,

    /// Subject of the message.
    subject: &'a str,

    /// Bodies of the message.
    content: [Content<'a>; 1],
}

/// Recipients block of a [`Payload`].
#[derive(Debug, Serialize)]
struct Personalization<'a> {
    /// Primary recipients.
    to: [Address<'a>; 1],
}

/// Email address with an optional display name.
#[derive(Debug, Serialize)]
struct Address<'a> {
    /// Email address.
    email: &'a str,

    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

/// Body of a [`Payload`].
#[derive(Debug, Serialize)]
struct Content<'a> {
    /// MIME type of the body.
    #[serde(rename = "type")]
    kind: &'static str,

    /// Body itself.
    value: &'a str,
}

/// [`SendGrid`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// HTTP request failed.
    #[display("HTTP request failed: {_0}")]
    Request(reqwest::Error),

    /// API responded with an error.
    #[display("SendGrid API responded with `{status}`: {body}")]
    #[from(ignore)]
    Api {
        /// HTTP status code of the response.
        status: u16,

        /// Body of the response.
        body: String,
    },
}
