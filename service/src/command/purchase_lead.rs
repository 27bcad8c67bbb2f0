//! [`Command`] for recording a [`Lead`] purchase.

use common::{
    operations::{By, Select, Update},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{contact, lead, professional, Lead},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for recording a [`Lead`] purchase by a [`Professional`].
///
/// Recording the same [`lead::PaymentRef`] twice for the same buyer is a
/// no-op.
///
/// [`Professional`]: crate::domain::Professional
#[derive(Clone, Debug)]
pub struct PurchaseLead {
    /// ID of the [`Lead`] being purchased.
    pub lead_id: lead::Id,

    /// ID of the [`Professional`] purchasing the [`Lead`].
    ///
    /// [`Professional`]: crate::domain::Professional
    pub buyer_id: professional::Id,

    /// [`contact::Name`] of the buyer.
    pub buyer_name: contact::Name,

    /// Price paid for the [`Lead`].
    pub price: Money,

    /// [`lead::PaymentRef`] of the payment.
    pub payment_ref: lead::PaymentRef,
}

/// Result of [`PurchaseLead`] [`Command`] execution.
#[derive(Clone, Debug)]
pub struct Output {
    /// [`Lead`] after the purchase.
    pub lead: Lead,

    /// Indicator whether the purchase was recorded by this execution.
    ///
    /// `false` if it had been recorded before.
    pub recorded: bool,
}

impl<Db, Pay, Mail> Command<PurchaseLead> for Service<Db, Pay, Mail>
where
    Db: Database<
            Select<By<Option<Lead>, lead::Id>>,
            Ok = Option<Lead>,
            Err = Traced<database::Error>,
        > + Database<Update<Lead>, Ok = bool, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: PurchaseLead) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let PurchaseLead {
            lead_id,
            buyer_id,
            buyer_name,
            price,
            payment_ref,
        } = cmd;

        if !price.is_positive() {
            return Err(tracerr::new!(E::InvalidPrice(price)));
        }

        let attempts = self.config().purchase_attempts.get();
        for attempt in 1..=attempts {
            let mut lead = self
                .database()
                .execute(Select(By::new(lead_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::LeadNotExists(lead_id))
                .map_err(tracerr::wrap!())?;

            if lead
                .purchase_of(buyer_id)
                .is_some_and(|p| p.payment_ref == payment_ref)
            {
                return Ok(Output {
                    lead,
                    recorded: false,
                });
            }

            lead.record_purchase(lead::Purchase {
                buyer_id,
                buyer_name: buyer_name.clone(),
                price,
                payment_ref: payment_ref.clone(),
                purchased_at: DateTime::now().coerce(),
            })
            .map_err(E::Ineligible)
            .map_err(tracerr::wrap!())?;

            let updated = self
                .database()
                .execute(Update(lead.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if updated {
                lead.version = lead.version.next();
                log::info!(
                    "`Lead(id: {lead_id})` purchased by \
                     `Professional(id: {buyer_id})`, {}/{} sales",
                    lead.sales_count(),
                    lead.max_sales,
                );
                return Ok(Output {
                    lead,
                    recorded: true,
                });
            }

            log::debug!(
                "`Lead(id: {lead_id})` was concurrently modified \
                 (attempt {attempt}/{attempts})",
            );
        }

        Err(tracerr::new!(E::Contention(lead_id)))
    }
}

/// Error of [`PurchaseLead`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Lead`] with the provided ID does not exist.
    #[display("`Lead(id: {_0})` does not exist")]
    LeadNotExists(#[error(not(source))] lead::Id),

    /// Buyer may not purchase the [`Lead`].
    #[display("`Lead` cannot be purchased: {_0}")]
    Ineligible(#[error(not(source))] lead::Ineligibility),

    /// Price is not positive.
    #[display("`{_0}` is not a valid purchase price")]
    InvalidPrice(#[error(not(source))] Money),

    /// [`Lead`] kept being concurrently modified.
    #[display("`Lead(id: {_0})` was concurrently modified")]
    Contention(#[error(not(source))] lead::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Insert, Select};

    use crate::{
        domain::{contact, lead, professional, Lead},
        spec::{price, published_lead, service, TestService},
        Command as _,
    };

    use super::{ExecutionError, Output, PurchaseLead};

    fn purchase(lead: &Lead, buyer_id: professional::Id) -> PurchaseLead {
        PurchaseLead {
            lead_id: lead.id,
            buyer_id,
            buyer_name: contact::Name::new("Dupont Plomberie").unwrap(),
            price: price(),
            payment_ref: lead::PaymentRef::new(format!("pi_{buyer_id}"))
                .unwrap(),
        }
    }

    async fn stored(svc: &TestService, id: lead::Id) -> Lead {
        svc.database()
            .execute(Select(By::<Option<Lead>, _>::new(id)))
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn completes_lead_on_last_sale() {
        let svc = service();
        let lead = published_lead(1);
        svc.database().execute(Insert(lead.clone())).await.unwrap();
        let (a, b) = (professional::Id::new(), professional::Id::new());

        let Output { lead: after, recorded } =
            svc.execute(purchase(&lead, a)).await.unwrap();
        assert!(recorded);
        assert_eq!(after.sales_count(), 1);
        assert!(after.is_completed());

        let err = svc
            .execute(purchase(&lead, b))
            .await
            .unwrap_err()
            .into_inner();
        assert!(
            matches!(
                err,
                ExecutionError::Ineligible(lead::Ineligibility::SoldOut),
            ),
            "{err}",
        );

        let lead = stored(&svc, lead.id).await;
        assert_eq!(lead.sales_count(), 1);
        assert_eq!(lead.status, lead::Status::Completed);
    }

    #[tokio::test]
    async fn rejects_duplicate_buyer() {
        let svc = service();
        let lead = published_lead(3);
        svc.database().execute(Insert(lead.clone())).await.unwrap();
        let buyer = professional::Id::new();
        _ = svc.execute(purchase(&lead, buyer)).await.unwrap();

        let mut again = purchase(&lead, buyer);
        again.payment_ref = lead::PaymentRef::new("pi_other").unwrap();
        let err = svc.execute(again).await.unwrap_err().into_inner();

        assert!(
            matches!(
                err,
                ExecutionError::Ineligible(
                    lead::Ineligibility::AlreadyPurchased,
                ),
            ),
            "{err}",
        );
        assert_eq!(stored(&svc, lead.id).await.sales_count(), 1);
    }

    #[tokio::test]
    async fn same_payment_is_recorded_once() {
        let svc = service();
        let lead = published_lead(3);
        svc.database().execute(Insert(lead.clone())).await.unwrap();
        let buyer = professional::Id::new();

        let first = svc.execute(purchase(&lead, buyer)).await.unwrap();
        let second = svc.execute(purchase(&lead, buyer)).await.unwrap();

        assert!(first.recorded);
        assert!(!second.recorded);
        assert_eq!(second.lead.sales_count(), 1);
        assert_eq!(stored(&svc, lead.id).await.sales_count(), 1);
    }

    #[tokio::test]
    async fn rejects_unpublished_lead() {
        let svc = service();
        let mut lead = published_lead(3);
        lead.is_published = false;
        svc.database().execute(Insert(lead.clone())).await.unwrap();

        let err = svc
            .execute(purchase(&lead, professional::Id::new()))
            .await
            .unwrap_err()
            .into_inner();

        assert!(
            matches!(
                err,
                ExecutionError::Ineligible(lead::Ineligibility::NotPublished),
            ),
            "{err}",
        );
    }

    #[tokio::test]
    async fn concurrent_buyers_never_exceed_max_sales() {
        let svc = service();
        let lead = published_lead(2);
        svc.database().execute(Insert(lead.clone())).await.unwrap();

        let buyers =
            (0..5).map(|_| professional::Id::new()).collect::<Vec<_>>();
        let results = futures::future::join_all(
            buyers.iter().map(|&b| svc.execute(purchase(&lead, b))),
        )
        .await;

        let lead = stored(&svc, lead.id).await;
        assert_eq!(lead.sales_count(), 2);
        assert!(lead.is_completed());
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 2);
    }

    #[tokio::test]
    async fn fails_on_unknown_lead() {
        let svc = service();

        let err = svc
            .execute(purchase(&published_lead(1), professional::Id::new()))
            .await
            .unwrap_err()
            .into_inner();

        assert!(matches!(err, ExecutionError::LeadNotExists(_)), "{err}");
    }
}
