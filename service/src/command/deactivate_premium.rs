//! [`Command`] for deactivating a [`Premium`] of a [`Professional`].

use common::operations::{By, Select, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::professional::Premium;
use crate::{
    domain::{professional, Professional},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for resetting a [`Premium`] of a [`Professional`] to inactive
/// defaults.
///
/// Deactivating an inactive [`Professional`] is a no-op.
#[derive(Clone, Copy, Debug, From)]
pub struct DeactivatePremium {
    /// ID of the [`Professional`] to deactivate the [`Premium`] of.
    pub professional_id: professional::Id,
}

impl<Db, Pay, Mail> Command<DeactivatePremium> for Service<Db, Pay, Mail>
where
    Db: Database<
            Select<By<Option<Professional>, professional::Id>>,
            Ok = Option<Professional>,
            Err = Traced<database::Error>,
        > + Database<
            Update<Professional>,
            Ok = (),
            Err = Traced<database::Error>,
        >,
{
    type Ok = Professional;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeactivatePremium,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeactivatePremium { professional_id } = cmd;

        let mut professional = self
            .database()
            .execute(Select(By::new(professional_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ProfessionalNotExists(professional_id))
            .map_err(tracerr::wrap!())?;
        if !professional.deactivate_premium() {
            return Ok(professional);
        }

        self.database()
            .execute(Update(professional.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        self.professionals().evict(&professional_id);

        log::info!(
            "premium deactivated for `Professional(id: {professional_id})`",
        );
        Ok(professional)
    }
}

/// Error of [`DeactivatePremium`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Professional`] with the provided ID does not exist.
    #[display("`Professional(id: {_0})` does not exist")]
    ProfessionalNotExists(#[error(not(source))] professional::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::Insert;

    use crate::{
        command::ActivatePremium,
        domain::professional::{premium, SubscriptionStatus},
        spec::{professional, service},
        Command as _,
    };

    use super::DeactivatePremium;

    #[tokio::test]
    async fn deactivates_idempotently() {
        let svc = service();
        let pro = professional();
        svc.database().execute(Insert(pro.clone())).await.unwrap();
        _ = svc
            .execute(ActivatePremium {
                professional_id: pro.id,
                plan: premium::Plan::Yearly,
                starts_at: premium::StartDateTime::now(),
                show_badge: true,
                banner_url: None,
            })
            .await
            .unwrap();

        for _ in 0..2 {
            let pro =
                svc.execute(DeactivatePremium::from(pro.id)).await.unwrap();

            assert!(pro.premium.is_none());
            assert_eq!(pro.subscription, SubscriptionStatus::Inactive);
        }
    }
}
