//! [`Professional`] definitions.

pub mod premium;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::contact::{City, Email, Name, Phone};

pub use self::premium::Premium;

/// Building-trade professional (artisan) buying [`Lead`]s.
///
/// [`Lead`]: crate::domain::Lead
#[derive(Clone, Debug)]
pub struct Professional {
    /// ID of this [`Professional`].
    pub id: Id,

    /// [`Name`] of the company of this [`Professional`].
    pub company_name: Name,

    /// [`Email`] of this [`Professional`].
    pub email: Email,

    /// [`Phone`] of this [`Professional`].
    pub phone: Option<Phone>,

    /// [`City`] this [`Professional`] works in.
    pub city: City,

    /// Current [`Premium`] of this [`Professional`], if any.
    pub premium: Option<Premium>,

    /// [`SubscriptionStatus`] of this [`Professional`].
    pub subscription: SubscriptionStatus,

    /// [`DateTime`] when this [`Professional`] was registered.
    pub created_at: CreationDateTime,
}

impl Professional {
    /// Activates the provided [`Premium`], replacing the current one.
    pub fn activate_premium(&mut self, premium: Premium) {
        self.premium = Some(premium);
        self.subscription = SubscriptionStatus::Active;
    }

    /// Resets the [`Premium`] of this [`Professional`] to inactive defaults.
    ///
    /// Returns `false` if it is inactive already.
    pub fn deactivate_premium(&mut self) -> bool {
        let changed = self.premium.is_some()
            || self.subscription != SubscriptionStatus::Inactive;
        self.premium = None;
        self.subscription = SubscriptionStatus::Inactive;
        changed
    }

    /// Resets the [`Premium`] of this [`Professional`] if it's expired at the
    /// provided [`DateTime`], marking the subscription as
    /// [`SubscriptionStatus::Expired`].
    ///
    /// Returns `false` if there is nothing to expire.
    pub fn expire_premium<Of: ?Sized>(&mut self, at: DateTimeOf<Of>) -> bool {
        if !self.premium.as_ref().is_some_and(|p| p.is_expired_at(at)) {
            return false;
        }
        self.premium = None;
        self.subscription = SubscriptionStatus::Expired;
        true
    }
}

/// ID of a [`Professional`].
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
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

define_kind! {
    #[doc = "Status of a [`Professional`]'s premium subscription."]
    enum SubscriptionStatus {
        #[doc = "No [`Premium`] has been activated, or it was deactivated."]
        Inactive = 1,

        #[doc = "[`Premium`] is active."]
        Active = 2,

        #[doc = "[`Premium`] has ended and was reset by the expiry sweep."]
        Expired = 3,
    }
}

/// [`DateTime`] when a [`Professional`] was registered.
pub type CreationDateTime = DateTimeOf<(Professional, unit::Creation)>;

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::domain::contact;

    use super::{
        premium::Plan, Id, Premium, Professional, SubscriptionStatus,
    };

    fn at(s: &str) -> DateTime {
        DateTime::from_rfc3339(s).unwrap()
    }

    fn professional() -> Professional {
        Professional {
            id: Id::new(),
            company_name: contact::Name::new("Dupont Plomberie").unwrap(),
            email: contact::Email::new("contact@dupont.fr").unwrap(),
            phone: None,
            city: contact::City::new("Paris").unwrap(),
            premium: None,
            subscription: SubscriptionStatus::Inactive,
            created_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn expires_monthly_premium() {
        let mut pro = professional();
        pro.activate_premium(
            Premium::new(
                Plan::Monthly,
                at("2024-01-15T00:00:00Z").coerce(),
                true,
                None,
            )
            .unwrap(),
        );
        assert_eq!(pro.subscription, SubscriptionStatus::Active);

        assert!(!pro.expire_premium(at("2024-02-15T00:00:00Z")));
        assert!(pro.expire_premium(at("2024-02-16T00:00:00Z")));
        assert_eq!(pro.premium, None);
        assert_eq!(pro.subscription, SubscriptionStatus::Expired);

        assert!(!pro.expire_premium(at("2024-02-17T00:00:00Z")));
    }

    #[test]
    fn deactivation_is_idempotent() {
        let mut pro = professional();
        pro.activate_premium(
            Premium::new(Plan::Lifetime, DateTime::now().coerce(), true, None)
                .unwrap(),
        );

        assert!(pro.deactivate_premium());
        assert_eq!(pro.subscription, SubscriptionStatus::Inactive);
        assert!(!pro.deactivate_premium());
    }
}
