//! Payment [`Intent`] definitions.

use common::Money;
use derive_more::{AsRef, Debug, Display};
use secrecy::SecretString;
use strum::{Display as StrumDisplay, EnumString};

use crate::domain::{contact, lead, professional};
#[cfg(doc)]
use crate::domain::{Lead, Professional};

/// Payment intent registered in a payment processor.
#[derive(Clone, Debug)]
pub struct Intent {
    /// ID of this [`Intent`].
    pub id: IntentId,

    /// Secret the client confirms this [`Intent`] with.
    #[debug(skip)]
    pub client_secret: SecretString,

    /// Amount of this [`Intent`].
    pub amount: Money,

    /// [`IntentStatus`] of this [`Intent`].
    pub status: IntentStatus,

    /// [`Purpose`] of this [`Intent`] recovered from its metadata.
    pub purpose: Purpose,
}

/// New payment [`Intent`] to be registered.
#[derive(Clone, Debug)]
pub struct NewIntent {
    /// Amount to be paid.
    pub amount: Money,

    /// Human-readable description shown to the payer.
    pub description: String,

    /// [`LeadPurchase`] being paid for.
    pub purchase: LeadPurchase,
}

/// ID of an [`Intent`] assigned by the payment processor.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
pub struct IntentId(String);

impl IntentId {
    /// Creates a new [`IntentId`] if the given `id` is valid.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        (!id.is_empty()
            && id.len() <= 255
            && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_'))
        .then_some(Self(id))
    }
}

/// Status of an [`Intent`].
#[derive(Clone, Copy, Debug, EnumString, Eq, PartialEq, StrumDisplay)]
#[strum(serialize_all = "snake_case")]
pub enum IntentStatus {
    /// Waiting for a payment method.
    RequiresPaymentMethod,

    /// Waiting for the client's confirmation.
    RequiresConfirmation,

    /// Waiting for the client's additional action (like 3-D Secure).
    RequiresAction,

    /// Being processed.
    Processing,

    /// Authorized and waiting for capture.
    RequiresCapture,

    /// Canceled.
    Canceled,

    /// Paid.
    Succeeded,
}

/// Purpose of an [`Intent`], as stored in its metadata.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Purpose {
    /// Purchase of a [`Lead`] on the marketplace.
    MarketplaceLead(LeadPurchase),

    /// Anything else, tagged with the raw metadata type.
    Other(String),
}

impl Purpose {
    /// Metadata tag of the [`Purpose::MarketplaceLead`].
    pub const MARKETPLACE_LEAD: &'static str = "marketplace_lead";
}

/// [`Lead`] purchase an [`Intent`] pays for.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LeadPurchase {
    /// ID of the [`Lead`] being purchased.
    pub lead_id: lead::Id,

    /// ID of the [`Professional`] purchasing the [`Lead`].
    pub buyer_id: professional::Id,

    /// [`contact::Name`] of the buyer.
    pub buyer_name: contact::Name,

    /// [`contact::Email`] of the buyer.
    pub buyer_email: contact::Email,
}
