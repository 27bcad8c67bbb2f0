//! [`Mailer`]-related implementations.

#[cfg(feature = "sendgrid")]
pub mod sendgrid;

use derive_more::{Display, Error as StdError, From};

use crate::domain::contact;

#[cfg(feature = "sendgrid")]
pub use self::sendgrid::SendGrid;

/// Email delivery operation.
pub use common::Handler as Mailer;

/// Email message to be delivered.
#[derive(Clone, Debug)]
pub struct Message {
    /// Recipient of this [`Message`].
    pub to: contact::Email,

    /// Subject of this [`Message`].
    pub subject: String,

    /// HTML body of this [`Message`].
    pub html: String,
}

/// [`Mailer`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    #[cfg(feature = "sendgrid")]
    /// [`SendGrid`] error.
    SendGrid(sendgrid::Error),
}
