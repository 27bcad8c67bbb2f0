//! [`Query`] checking whether a [`Lead`] may be purchased.

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Professional;
use crate::{
    domain::{lead, professional, Lead},
    infra::{database, Database},
    Query, Service,
};

/// [`Query`] checking whether a [`Professional`] may purchase a [`Lead`].
///
/// Evaluates the same preconditions the purchase does, without writing
/// anything.
#[derive(Clone, Copy, Debug)]
pub struct CanPurchaseLead {
    /// ID of the [`Lead`] to check.
    pub lead_id: lead::Id,

    /// ID of the [`Professional`] willing to purchase the [`Lead`].
    pub buyer_id: professional::Id,
}

impl<Db, Pay, Mail> Query<CanPurchaseLead> for Service<Db, Pay, Mail>
where
    Db: Database<
        Select<By<Option<Lead>, lead::Id>>,
        Ok = Option<Lead>,
        Err = Traced<database::Error>,
    >,
{
    /// [`lead::Ineligibility`] reason, or [`None`] if the [`Lead`] may be
    /// purchased.
    type Ok = Option<lead::Ineligibility>;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        CanPurchaseLead { lead_id, buyer_id }: CanPurchaseLead,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let lead = self
            .database()
            .execute(Select(By::new(lead_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::LeadNotExists(lead_id))
            .map_err(tracerr::wrap!())?;

        Ok(lead.check_purchase(buyer_id).err())
    }
}

/// Error of [`CanPurchaseLead`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Lead`] with the provided ID does not exist.
    #[display("`Lead(id: {_0})` does not exist")]
    LeadNotExists(#[error(not(source))] lead::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::Insert;

    use crate::{
        command::PurchaseLead,
        domain::{contact, lead, professional},
        spec::{price, published_lead, service},
        Query as _,
    };

    use super::CanPurchaseLead;

    #[tokio::test]
    async fn reports_blocking_reason() {
        let svc = service();
        let lead = published_lead(2);
        svc.database().execute(Insert(lead.clone())).await.unwrap();
        let buyer = professional::Id::new();

        let check = CanPurchaseLead {
            lead_id: lead.id,
            buyer_id: buyer,
        };
        assert_eq!(svc.execute(check).await.unwrap(), None);

        _ = svc
            .execute(PurchaseLead {
                lead_id: lead.id,
                buyer_id: buyer,
                buyer_name: contact::Name::new("Dupont Plomberie").unwrap(),
                price: price(),
                payment_ref: lead::PaymentRef::new("pi_1").unwrap(),
            })
            .await
            .unwrap();

        assert_eq!(
            svc.execute(check).await.unwrap(),
            Some(lead::Ineligibility::AlreadyPurchased),
        );
    }
}
