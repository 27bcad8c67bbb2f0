//! [`Lead`] definitions.

use common::{define_kind, unit, DateTimeOf, Money};
#[cfg(doc)]
use common::DateTime;
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    contact::{City, Email, Name, Phone, PostalCode},
    payment, professional,
};

/// Homeowner's project request sold to [`Professional`]s on the marketplace.
///
/// [`Professional`]: crate::domain::Professional
#[derive(Clone, Debug)]
pub struct Lead {
    /// ID of this [`Lead`].
    pub id: Id,

    /// [`Project`] this [`Lead`] is about.
    pub project: Project,

    /// [`Homeowner`] who submitted this [`Lead`].
    pub homeowner: Homeowner,

    /// Indicator whether this [`Lead`] is visible on the marketplace.
    pub is_published: bool,

    /// Marketplace [`Status`] of this [`Lead`].
    pub status: Status,

    /// Maximum number of [`Purchase`]s of this [`Lead`].
    pub max_sales: MaxSales,

    /// Price a single [`Purchase`] of this [`Lead`] costs.
    pub price: Money,

    /// [`Purchase`]s of this [`Lead`] in the order they were made.
    pub purchases: Vec<Purchase>,

    /// [`DateTime`] when this [`Lead`] was created.
    pub created_at: CreationDateTime,

    /// [`Version`] of this [`Lead`] it was read with.
    pub version: Version,
}

impl Lead {
    /// Returns the number of [`Purchase`]s made of this [`Lead`].
    #[must_use]
    pub fn sales_count(&self) -> usize {
        self.purchases.len()
    }

    /// Indicates whether this [`Lead`] is sold out.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    /// Returns the [`Purchase`] made by the provided buyer, if any.
    #[must_use]
    pub fn purchase_of(&self, buyer_id: professional::Id) -> Option<&Purchase> {
        self.purchases.iter().find(|p| p.buyer_id == buyer_id)
    }

    /// Checks whether the provided buyer may purchase this [`Lead`].
    ///
    /// # Errors
    ///
    /// With the [`Ineligibility`] reason if the buyer may not.
    pub fn check_purchase(
        &self,
        buyer_id: professional::Id,
    ) -> Result<(), Ineligibility> {
        if !self.is_published {
            return Err(Ineligibility::NotPublished);
        }
        if self.is_completed()
            || self.sales_count() >= usize::from(self.max_sales)
        {
            return Err(Ineligibility::SoldOut);
        }
        if self.purchase_of(buyer_id).is_some() {
            return Err(Ineligibility::AlreadyPurchased);
        }
        Ok(())
    }

    /// Records the provided [`Purchase`] of this [`Lead`], completing it once
    /// the [`MaxSales`] is reached.
    ///
    /// This [`Lead`] is left untouched if the [`Purchase`] is not allowed.
    ///
    /// # Errors
    ///
    /// With the [`Ineligibility`] reason if the buyer may not purchase this
    /// [`Lead`].
    pub fn record_purchase(
        &mut self,
        purchase: Purchase,
    ) -> Result<(), Ineligibility> {
        self.check_purchase(purchase.buyer_id)?;

        self.purchases.push(purchase);
        if self.sales_count() >= usize::from(self.max_sales) {
            self.status = Status::Completed;
        }
        Ok(())
    }

    /// Publishes this [`Lead`] on the marketplace with the provided
    /// [`MaxSales`] and price.
    ///
    /// Reaching the [`MaxSales`] with the already recorded [`Purchase`]s
    /// completes this [`Lead`].
    pub fn publish(&mut self, max_sales: MaxSales, price: Money) {
        self.is_published = true;
        self.max_sales = max_sales;
        self.price = price;
        self.status = if self.sales_count() >= usize::from(max_sales) {
            Status::Completed
        } else {
            Status::Active
        };
    }
}

/// ID of a [`Lead`].
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
    ///
    /// Newer [`Lead`]s have greater [`Id`]s.
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

/// Project a [`Lead`] is about.
#[derive(Clone, Debug)]
pub struct Project {
    /// [`ProjectType`] of this [`Project`].
    pub kind: ProjectType,

    /// [`Description`] of this [`Project`].
    pub description: Description,

    /// Budget the [`Homeowner`] is ready to spend, if stated.
    pub budget: Option<Money>,

    /// [`City`] this [`Project`] takes place in.
    pub city: City,

    /// [`PostalCode`] of the place this [`Project`] takes place in.
    pub postal_code: PostalCode,
}

/// Type of [`Project`], like `renovation` or `plomberie`.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct ProjectType(String);

impl ProjectType {
    /// Creates a new [`ProjectType`] if the given `kind` is valid.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Option<Self> {
        let kind = kind.into();
        (kind.trim() == kind && !kind.is_empty() && kind.len() <= 64)
            .then_some(Self(kind))
    }
}

/// Free-form description of a [`Project`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Description(String);

impl Description {
    /// Maximum number of characters in a [`Description`].
    pub const MAX_LEN: usize = 5000;

    /// Creates a new [`Description`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        (!text.trim().is_empty() && text.chars().count() <= Self::MAX_LEN)
            .then_some(Self(text))
    }
}

/// Homeowner contact details.
#[derive(Clone, Debug)]
pub struct Homeowner {
    /// [`Name`] of this [`Homeowner`].
    pub name: Name,

    /// [`Email`] of this [`Homeowner`].
    pub email: Email,

    /// [`Phone`] of this [`Homeowner`].
    pub phone: Option<Phone>,
}

define_kind! {
    #[doc = "Marketplace status of a [`Lead`]."]
    enum Status {
        #[doc = "[`Lead`] may be purchased."]
        Active = 1,

        #[doc = "[`Lead`] is sold out."]
        Completed = 2,
    }
}

/// Maximum number of [`Purchase`]s of a [`Lead`].
#[derive(Clone, Copy, Debug, Display, Eq, Into, PartialEq)]
#[into(u8, usize)]
pub struct MaxSales(u8);

impl MaxSales {
    /// Upper bound of a [`MaxSales`].
    pub const MAX: u8 = 10;

    /// Creates a new [`MaxSales`] if the given `count` is within
    /// `1..=`[`MaxSales::MAX`].
    #[must_use]
    pub fn new(count: u8) -> Option<Self> {
        (1..=Self::MAX).contains(&count).then_some(Self(count))
    }
}

impl Default for MaxSales {
    fn default() -> Self {
        Self(3)
    }
}

/// Version of a [`Lead`] incremented on every its write.
#[derive(Clone, Copy, Debug, Default, Display, Eq, From, Into, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Version(i64);

impl Version {
    /// Returns the [`Version`] following this one.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Purchase of a [`Lead`] by a [`Professional`].
///
/// [`Professional`]: crate::domain::Professional
#[derive(Clone, Debug)]
pub struct Purchase {
    /// ID of the [`Professional`] who made this [`Purchase`].
    ///
    /// [`Professional`]: crate::domain::Professional
    pub buyer_id: professional::Id,

    /// [`Name`] of the buyer.
    pub buyer_name: Name,

    /// Price paid for this [`Purchase`].
    pub price: Money,

    /// [`PaymentRef`] of this [`Purchase`].
    pub payment_ref: PaymentRef,

    /// [`DateTime`] when this [`Purchase`] was made.
    pub purchased_at: PurchaseDateTime,
}

/// Reference of the payment a [`Purchase`] was paid with.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct PaymentRef(String);

impl PaymentRef {
    /// Creates a new [`PaymentRef`] if the given `reference` is valid.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Option<Self> {
        let reference = reference.into();
        (reference.trim() == reference
            && !reference.is_empty()
            && reference.len() <= 255)
            .then_some(Self(reference))
    }
}

impl From<payment::IntentId> for PaymentRef {
    fn from(id: payment::IntentId) -> Self {
        Self(id.to_string())
    }
}

/// Reason a [`Lead`] cannot be purchased.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Ineligibility {
    /// [`Lead`] is not published on the marketplace.
    #[display("not published")]
    NotPublished,

    /// Buyer has already purchased the [`Lead`].
    #[display("already purchased")]
    AlreadyPurchased,

    /// [`Lead`] has reached its [`MaxSales`].
    #[display("sold out")]
    SoldOut,
}

/// [`DateTime`] when a [`Lead`] was created.
pub type CreationDateTime = DateTimeOf<(Lead, unit::Creation)>;

/// [`DateTime`] when a [`Purchase`] was made.
pub type PurchaseDateTime = DateTimeOf<(Purchase, unit::Occurrence)>;

#[cfg(test)]
mod spec {
    use common::{Currency, DateTime, Money};

    use crate::domain::{contact, professional};

    use super::{
        Description, Homeowner, Id, Ineligibility, Lead, MaxSales,
        PaymentRef, Project, ProjectType, Purchase, Status, Version,
    };

    fn price() -> Money {
        Money::from_minor_units(3900, Currency::Eur)
    }

    fn lead(max_sales: u8) -> Lead {
        Lead {
            id: Id::new(),
            project: Project {
                kind: ProjectType::new("renovation").unwrap(),
                description: Description::new("Rénovation cuisine").unwrap(),
                budget: None,
                city: contact::City::new("Lyon").unwrap(),
                postal_code: contact::PostalCode::new("69003").unwrap(),
            },
            homeowner: Homeowner {
                name: contact::Name::new("Jeanne Martin").unwrap(),
                email: contact::Email::new("jeanne@example.fr").unwrap(),
                phone: None,
            },
            is_published: true,
            status: Status::Active,
            max_sales: MaxSales::new(max_sales).unwrap(),
            price: price(),
            purchases: vec![],
            created_at: DateTime::now().coerce(),
            version: Version::default(),
        }
    }

    fn purchase(buyer_id: professional::Id) -> Purchase {
        Purchase {
            buyer_id,
            buyer_name: contact::Name::new("Artisan").unwrap(),
            price: price(),
            payment_ref: PaymentRef::new("pi_123").unwrap(),
            purchased_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn completes_on_last_sale() {
        let mut lead = lead(1);
        let (a, b) = (professional::Id::new(), professional::Id::new());

        lead.record_purchase(purchase(a)).unwrap();
        assert_eq!(lead.sales_count(), 1);
        assert!(lead.is_completed());

        assert_eq!(
            lead.record_purchase(purchase(b)),
            Err(Ineligibility::SoldOut),
        );
        assert_eq!(lead.sales_count(), 1);
    }

    #[test]
    fn rejects_duplicate_buyer() {
        let mut lead = lead(3);
        let buyer = professional::Id::new();

        lead.record_purchase(purchase(buyer)).unwrap();
        assert_eq!(
            lead.record_purchase(purchase(buyer)),
            Err(Ineligibility::AlreadyPurchased),
        );
        assert_eq!(lead.sales_count(), 1);
        assert!(!lead.is_completed());
    }

    #[test]
    fn rejects_unpublished() {
        let mut lead = lead(3);
        lead.is_published = false;

        assert_eq!(
            lead.check_purchase(professional::Id::new()),
            Err(Ineligibility::NotPublished),
        );
    }

    #[test]
    fn never_exceeds_max_sales() {
        let mut lead = lead(2);
        for _ in 0..5 {
            _ = lead.record_purchase(purchase(professional::Id::new()));
        }
        assert_eq!(lead.sales_count(), 2);
        assert!(lead.is_completed());
    }

    #[test]
    fn publish_reopens_when_limit_raised() {
        let mut lead = lead(1);
        lead.record_purchase(purchase(professional::Id::new())).unwrap();
        assert!(lead.is_completed());

        lead.publish(MaxSales::new(2).unwrap(), price());
        assert_eq!(lead.status, Status::Active);
        assert!(lead.check_purchase(professional::Id::new()).is_ok());
    }

    #[test]
    fn validates_max_sales() {
        assert!(MaxSales::new(0).is_none());
        assert!(MaxSales::new(11).is_none());
        assert_eq!(usize::from(MaxSales::new(3).unwrap()), 3);
    }
}
