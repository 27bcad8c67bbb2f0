//! [`Command`] for activating a [`Premium`] of a [`Professional`].

use common::operations::{By, Select, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        professional::{self, premium, Premium},
        Professional,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for activating a [`Premium`] of a [`Professional`].
///
/// The current [`Premium`], if any, is replaced.
#[derive(Clone, Debug)]
pub struct ActivatePremium {
    /// ID of the [`Professional`] to activate the [`Premium`] for.
    pub professional_id: professional::Id,

    /// [`premium::Plan`] to activate.
    pub plan: premium::Plan,

    /// [`premium::StartDateTime`] of the [`Premium`].
    pub starts_at: premium::StartDateTime,

    /// Indicator whether the premium badge is shown on the profile.
    pub show_badge: bool,

    /// [`premium::BannerUrl`] of the profile banner, if any.
    pub banner_url: Option<premium::BannerUrl>,
}

impl<Db, Pay, Mail> Command<ActivatePremium> for Service<Db, Pay, Mail>
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
        cmd: ActivatePremium,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ActivatePremium {
            professional_id,
            plan,
            starts_at,
            show_badge,
            banner_url,
        } = cmd;

        let premium = Premium::new(plan, starts_at, show_badge, banner_url)
            .ok_or(E::PeriodOutOfRange(plan))
            .map_err(tracerr::wrap!())?;

        let mut professional = self
            .database()
            .execute(Select(By::new(professional_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ProfessionalNotExists(professional_id))
            .map_err(tracerr::wrap!())?;

        professional.activate_premium(premium);
        self.database()
            .execute(Update(professional.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        self.professionals().evict(&professional_id);

        log::info!(
            "`{plan}` premium activated for \
             `Professional(id: {professional_id})`",
        );
        Ok(professional)
    }
}

/// Error of [`ActivatePremium`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Professional`] with the provided ID does not exist.
    #[display("`Professional(id: {_0})` does not exist")]
    ProfessionalNotExists(#[error(not(source))] professional::Id),

    /// End of the [`Premium`] is out of the supported range.
    #[display("`{_0}` premium period is out of range")]
    PeriodOutOfRange(#[error(not(source))] premium::Plan),
}

#[cfg(test)]
mod spec {
    use common::operations::Insert;

    use crate::{
        domain::professional::{self, premium},
        spec::{professional, service},
        Command as _,
    };

    use super::{ActivatePremium, ExecutionError};

    #[tokio::test]
    async fn activates_monthly_premium() {
        let svc = service();
        let pro = professional();
        svc.database().execute(Insert(pro.clone())).await.unwrap();

        let activated = svc
            .execute(ActivatePremium {
                professional_id: pro.id,
                plan: premium::Plan::Monthly,
                starts_at: premium::StartDateTime::from_rfc3339(
                    "2024-01-31T10:00:00Z",
                )
                .unwrap(),
                show_badge: true,
                banner_url: premium::BannerUrl::new(
                    "https://cdn.example.fr/banner.png",
                ),
            })
            .await
            .unwrap();

        assert_eq!(
            activated.subscription,
            professional::SubscriptionStatus::Active,
        );
        let premium = activated.premium.unwrap();
        assert_eq!(
            premium.ends_at,
            Some(
                premium::EndDateTime::from_rfc3339("2024-02-29T10:00:00Z")
                    .unwrap(),
            ),
        );
        assert!(premium.show_badge);
    }

    #[tokio::test]
    async fn fails_on_unknown_professional() {
        let svc = service();

        let err = svc
            .execute(ActivatePremium {
                professional_id: professional::Id::new(),
                plan: premium::Plan::Lifetime,
                starts_at: premium::StartDateTime::now(),
                show_badge: false,
                banner_url: None,
            })
            .await
            .unwrap_err()
            .into_inner();

        assert!(
            matches!(err, ExecutionError::ProfessionalNotExists(_)),
            "{err}",
        );
    }
}
