//! [`Command`] for publishing a [`Lead`] on the marketplace.

use common::{
    operations::{By, Select, Update},
    Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{lead, Lead},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for publishing a [`Lead`] on the marketplace.
///
/// Re-publishing an already published [`Lead`] updates its settings.
#[derive(Clone, Debug)]
pub struct PublishLead {
    /// ID of the [`Lead`] to publish.
    pub lead_id: lead::Id,

    /// [`lead::MaxSales`] to publish the [`Lead`] with.
    ///
    /// [`Config::lead_max_sales`] is used if [`None`].
    ///
    /// [`Config::lead_max_sales`]: crate::Config::lead_max_sales
    pub max_sales: Option<lead::MaxSales>,

    /// Price to publish the [`Lead`] with.
    ///
    /// [`Config::lead_price`] is used if [`None`].
    ///
    /// [`Config::lead_price`]: crate::Config::lead_price
    pub price: Option<Money>,
}

impl<Db, Pay, Mail> Command<PublishLead> for Service<Db, Pay, Mail>
where
    Db: Database<
            Select<By<Option<Lead>, lead::Id>>,
            Ok = Option<Lead>,
            Err = Traced<database::Error>,
        > + Database<Update<Lead>, Ok = bool, Err = Traced<database::Error>>,
{
    type Ok = Lead;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: PublishLead) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let PublishLead {
            lead_id,
            max_sales,
            price,
        } = cmd;

        let price = price.unwrap_or(self.config().lead_price);
        if !price.is_positive() {
            return Err(tracerr::new!(E::InvalidPrice(price)));
        }

        let mut lead = self
            .database()
            .execute(Select(By::new(lead_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::LeadNotExists(lead_id))
            .map_err(tracerr::wrap!())?;

        let max_sales = max_sales.unwrap_or(self.config().lead_max_sales);
        if usize::from(max_sales) < lead.sales_count() {
            return Err(tracerr::new!(E::MaxSalesBelowSales {
                lead_id,
                sales: lead.sales_count(),
            }));
        }

        lead.publish(max_sales, price);
        let updated = self
            .database()
            .execute(Update(lead.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !updated {
            return Err(tracerr::new!(E::Contention(lead_id)));
        }
        lead.version = lead.version.next();

        log::info!(
            "`Lead(id: {lead_id})` published with {} max sales at {}",
            u8::from(lead.max_sales),
            lead.price,
        );
        Ok(lead)
    }
}

/// Error of [`PublishLead`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Lead`] with the provided ID does not exist.
    #[display("`Lead(id: {_0})` does not exist")]
    LeadNotExists(#[error(not(source))] lead::Id),

    /// Price is not positive.
    #[display("`{_0}` is not a valid `Lead` price")]
    InvalidPrice(#[error(not(source))] Money),

    /// [`lead::MaxSales`] is lower than the already recorded sales.
    #[display("`Lead(id: {lead_id})` is already sold {sales} times")]
    MaxSalesBelowSales {
        /// ID of the [`Lead`].
        lead_id: lead::Id,

        /// Number of the already recorded sales.
        sales: usize,
    },

    /// [`Lead`] was concurrently modified.
    #[display("`Lead(id: {_0})` was concurrently modified")]
    Contention(#[error(not(source))] lead::Id),
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Insert, Select},
        Currency, DateTime, Money,
    };

    use crate::{
        domain::{contact, lead, professional, Lead},
        spec::{price, published_lead, service},
        Command as _,
    };

    use super::{ExecutionError, PublishLead};

    #[tokio::test]
    async fn publishes_with_defaults() {
        let svc = service();
        let mut lead = published_lead(1);
        lead.is_published = false;
        svc.database().execute(Insert(lead.clone())).await.unwrap();

        let published = svc
            .execute(PublishLead {
                lead_id: lead.id,
                max_sales: None,
                price: None,
            })
            .await
            .unwrap();

        assert!(published.is_published);
        assert_eq!(published.max_sales, svc.config().lead_max_sales);
        assert_eq!(published.price, svc.config().lead_price);
        assert_eq!(published.status, lead::Status::Active);
    }

    #[tokio::test]
    async fn rejects_non_positive_price() {
        let svc = service();
        let lead = published_lead(1);
        svc.database().execute(Insert(lead.clone())).await.unwrap();

        let err = svc
            .execute(PublishLead {
                lead_id: lead.id,
                max_sales: None,
                price: Some(Money::from_minor_units(0, Currency::Eur)),
            })
            .await
            .unwrap_err()
            .into_inner();

        assert!(matches!(err, ExecutionError::InvalidPrice(_)), "{err}");
    }

    #[tokio::test]
    async fn fails_on_unknown_lead() {
        let svc = service();

        let err = svc
            .execute(PublishLead {
                lead_id: lead::Id::new(),
                max_sales: None,
                price: None,
            })
            .await
            .unwrap_err()
            .into_inner();

        assert!(matches!(err, ExecutionError::LeadNotExists(_)), "{err}");
    }

    #[tokio::test]
    async fn keeps_max_sales_above_recorded_sales() {
        let svc = service();
        let mut lead = published_lead(3);
        for n in 0..2 {
            lead.purchases.push(lead::Purchase {
                buyer_id: professional::Id::new(),
                buyer_name: contact::Name::new("Dupont Plomberie").unwrap(),
                price: price(),
                payment_ref: lead::PaymentRef::new(format!("pi_{n}"))
                    .unwrap(),
                purchased_at: DateTime::now().coerce(),
            });
        }
        svc.database().execute(Insert(lead.clone())).await.unwrap();

        let err = svc
            .execute(PublishLead {
                lead_id: lead.id,
                max_sales: lead::MaxSales::new(1),
                price: None,
            })
            .await
            .unwrap_err()
            .into_inner();
        assert!(
            matches!(
                err,
                ExecutionError::MaxSalesBelowSales { sales: 2, .. },
            ),
            "{err}",
        );

        let stored = svc
            .database()
            .execute(Select(By::<Option<Lead>, _>::new(lead.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(u8::from(stored.max_sales), 3);
        assert_eq!(stored.status, lead::Status::Active);

        let published = svc
            .execute(PublishLead {
                lead_id: lead.id,
                max_sales: lead::MaxSales::new(2),
                price: None,
            })
            .await
            .unwrap();
        assert_eq!(published.sales_count(), 2);
        assert_eq!(published.status, lead::Status::Completed);
    }
}
