//! Infrastructure layer.

pub mod database;
#[cfg(test)]
pub(crate) mod fake;
pub mod mail;
pub mod payment;

pub use self::{
    database::{Database, Memory},
    mail::Mailer,
    payment::Payments,
};
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
#[cfg(feature = "sendgrid")]
pub use self::mail::SendGrid;
#[cfg(feature = "stripe")]
pub use self::payment::Stripe;
