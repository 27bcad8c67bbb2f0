//! Service contains the business logic of the lead marketplace.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod cache;
pub mod command;
pub mod domain;
pub mod infra;
mod notification;
pub mod query;
pub mod read;
pub mod task;

use std::{error::Error, num::NonZeroU8, sync::Arc, time::Duration};

use common::{
    operations::{By, Start},
    Money,
};
use derive_more::Debug;
use secrecy::SecretString;

#[cfg(doc)]
use crate::infra::{Database, Mailer, Payments};
use crate::{
    cache::Cache,
    domain::{lead, professional, Professional},
};

pub use self::{command::Command, query::Query, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Key authorizing administrative operations.
    #[debug(skip)]
    pub admin_key: SecretString,

    /// Price of a [`Lead`] purchase, unless specified on publishing.
    ///
    /// [`Lead`]: domain::Lead
    pub lead_price: Money,

    /// [`lead::MaxSales`] of a [`Lead`], unless specified on publishing.
    ///
    /// [`Lead`]: domain::Lead
    pub lead_max_sales: lead::MaxSales,

    /// Number of attempts to record a [`Lead`] purchase when it's concurrently
    /// modified.
    ///
    /// [`Lead`]: domain::Lead
    pub purchase_attempts: NonZeroU8,

    /// Time a [`Professional`] lookup is cached for while tracking
    /// interactions.
    pub professional_cache_ttl: Duration,

    /// [`task::ExpirePremiums`] configuration.
    pub expire_premiums: task::expire_premiums::Config,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db, Pay, Mail> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`Payments`] processor of this [`Service`].
    payments: Pay,

    /// [`Mailer`] of this [`Service`].
    mailer: Mail,

    /// Recently looked up [`Professional`]s.
    professionals: Arc<Cache<professional::Id, Professional>>,
}

impl<Db, Pay, Mail> Service<Db, Pay, Mail> {
    /// Creates a new [`Service`] with the provided parameters.
    pub fn new(
        config: Config,
        database: Db,
        payments: Pay,
        mailer: Mail,
    ) -> (Self, task::Background)
    where
        Self: Task<
                Start<
                    By<
                        task::ExpirePremiums<Self>,
                        task::expire_premiums::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Clone
            + 'static,
    {
        let professionals =
            Arc::new(Cache::new(config.professional_cache_ttl));
        let this = Service {
            config,
            database,
            payments,
            mailer,
            professionals,
        };

        let mut bg = task::Background::default();
        let svc = this.clone();
        bg.spawn("ExpirePremiums", async move {
            svc.execute(Start(By::new(svc.config().expire_premiums)))
                .await
        });

        (this, bg)
    }

    /// Returns [`Config`] of this [`Service`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns [`Payments`] processor of this [`Service`].
    #[must_use]
    pub fn payments(&self) -> &Pay {
        &self.payments
    }

    /// Returns [`Mailer`] of this [`Service`].
    #[must_use]
    pub fn mailer(&self) -> &Mail {
        &self.mailer
    }

    /// Returns the [`Cache`] of recently looked up [`Professional`]s.
    #[must_use]
    pub fn professionals(&self) -> &Cache<professional::Id, Professional> {
        &self.professionals
    }
}

#[cfg(test)]
mod spec {
    //! Shared fixtures for [`Service`] tests.

    use std::{num::NonZeroU8, time::Duration};

    use common::{Currency, DateTime, Money};
    use secrecy::SecretString;

    use crate::{
        domain::{contact, lead, professional, Lead, Professional},
        infra::{
            database::Memory,
            fake::{FakeMailer, FakePayments},
        },
        task, Config,
    };

    use super::Service;

    /// [`Service`] over the in-memory infrastructure.
    pub(crate) type TestService = Service<Memory, FakePayments, FakeMailer>;

    /// Admin key of a [`TestService`].
    pub(crate) const ADMIN_KEY: &str = "s3cr3t";

    /// Creates a new [`TestService`].
    pub(crate) fn service() -> TestService {
        let config = Config {
            admin_key: SecretString::from(ADMIN_KEY),
            lead_price: price(),
            lead_max_sales: lead::MaxSales::default(),
            purchase_attempts: NonZeroU8::new(3).unwrap(),
            professional_cache_ttl: Duration::from_secs(60),
            expire_premiums: task::expire_premiums::Config { interval: None },
        };
        let (service, _) = Service::new(
            config,
            Memory::new(),
            FakePayments::default(),
            FakeMailer::default(),
        );
        service
    }

    /// Default price of a [`Lead`].
    pub(crate) fn price() -> Money {
        Money::from_minor_units(3900, Currency::Eur)
    }

    /// Creates a new published [`Lead`] with the provided `max_sales`.
    pub(crate) fn published_lead(max_sales: u8) -> Lead {
        Lead {
            id: lead::Id::new(),
            project: lead::Project {
                kind: lead::ProjectType::new("renovation").unwrap(),
                description: lead::Description::new("Rénovation salle de bain")
                    .unwrap(),
                budget: Some(Money::from_minor_units(800_000, Currency::Eur)),
                city: contact::City::new("Lyon").unwrap(),
                postal_code: contact::PostalCode::new("69003").unwrap(),
            },
            homeowner: lead::Homeowner {
                name: contact::Name::new("Jeanne Martin").unwrap(),
                email: contact::Email::new("jeanne@example.fr").unwrap(),
                phone: contact::Phone::new("0612345678"),
            },
            is_published: true,
            status: lead::Status::Active,
            max_sales: lead::MaxSales::new(max_sales).unwrap(),
            price: price(),
            purchases: vec![],
            created_at: DateTime::now().coerce(),
            version: lead::Version::default(),
        }
    }

    /// Creates a new [`Professional`] without a premium.
    pub(crate) fn professional() -> Professional {
        Professional {
            id: professional::Id::new(),
            company_name: contact::Name::new("Dupont Plomberie").unwrap(),
            email: contact::Email::new("contact@dupont.fr").unwrap(),
            phone: None,
            city: contact::City::new("Lyon").unwrap(),
            premium: None,
            subscription: professional::SubscriptionStatus::Inactive,
            created_at: DateTime::now().coerce(),
        }
    }
}
