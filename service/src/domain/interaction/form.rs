//! [`FormSubmission`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use uuid::Uuid;

use crate::domain::{
    contact::{Email, Name, Phone},
    professional,
};
#[cfg(doc)]
use crate::domain::Professional;

/// Contact form submitted to a [`Professional`].
#[derive(Clone, Debug)]
pub struct FormSubmission {
    /// ID of this [`FormSubmission`].
    pub id: Id,

    /// ID of the [`Professional`] this [`FormSubmission`] is addressed to.
    pub professional_id: professional::Id,

    /// [`Name`] of the sender.
    pub name: Name,

    /// [`Email`] of the sender.
    pub email: Email,

    /// [`Phone`] of the sender.
    pub phone: Option<Phone>,

    /// [`Message`] of the sender.
    pub message: Option<Message>,

    /// [`DateTime`] when this [`FormSubmission`] was submitted.
    pub submitted_at: SubmissionDateTime,
}

/// ID of a [`FormSubmission`].
#[derive(Clone, Copy, Debug, Display, Eq, From, Hash, Into, PartialEq)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new time-ordered [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

/// Free-form message of a [`FormSubmission`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Message(String);

impl Message {
    /// Maximum number of characters in a [`Message`].
    pub const MAX_LEN: usize = 2000;

    /// Creates a new [`Message`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        (!text.trim().is_empty() && text.chars().count() <= Self::MAX_LEN)
            .then_some(Self(text))
    }
}

/// [`DateTime`] when a [`FormSubmission`] was submitted.
pub type SubmissionDateTime = DateTimeOf<(FormSubmission, unit::Occurrence)>;

#[cfg(test)]
mod spec {
    use super::Message;

    #[test]
    fn validates_message() {
        assert!(Message::new("Bonjour, je souhaite un devis.").is_some());
        assert!(Message::new("   ").is_none());
        assert!(Message::new("a".repeat(Message::MAX_LEN + 1)).is_none());
    }
}
