//! [`Command`] for expiring ended [`Premium`]s.

use common::{
    operations::{By, Commit, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::professional::{Premium, SubscriptionStatus};
use crate::{
    domain::{professional, Professional},
    infra::{database, Database},
    read::professional::PremiumEndedBefore,
    Service,
};

use super::Command;

/// [`Command`] for resetting every [`Premium`] ended strictly before the
/// provided [`DateTime`] to inactive defaults with the
/// [`SubscriptionStatus::Expired`].
#[derive(Clone, Copy, Debug, From)]
pub struct ExpirePremiums {
    /// [`DateTime`] to expire [`Premium`]s at.
    pub at: DateTime,
}

impl<Db, Pay, Mail> Command<ExpirePremiums> for Service<Db, Pay, Mail>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Vec<Professional>, PremiumEndedBefore>>,
            Ok = Vec<Professional>,
            Err = Traced<database::Error>,
        > + Database<
            Update<Professional>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Vec<professional::Id>;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ExpirePremiums,
    ) -> Result<Self::Ok, Self::Err> {
        let ExpirePremiums { at } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))?;

        let ended = tx
            .execute(Select(By::new(PremiumEndedBefore(at))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))?;

        let mut expired = Vec::with_capacity(ended.len());
        for mut professional in ended {
            if !professional.expire_premium(at) {
                continue;
            }
            let id = professional.id;
            tx.execute(Update(professional))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))?;
            expired.push(id);
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))?;

        for id in &expired {
            self.professionals().evict(id);
        }
        if !expired.is_empty() {
            log::info!(
                "{} premium(s) expired at {}",
                expired.len(),
                at.to_rfc3339(),
            );
        }
        Ok(expired)
    }
}

/// Error of [`ExpirePremiums`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Insert, Select},
        DateTime,
    };

    use crate::{
        command::ActivatePremium,
        domain::{
            professional::{self, premium, SubscriptionStatus},
            Professional,
        },
        infra::database,
        spec::{professional, service, TestService},
        Command as _,
    };

    use super::{ExecutionError, ExpirePremiums};

    fn at(rfc3339: &str) -> ExpirePremiums {
        ExpirePremiums {
            at: DateTime::from_rfc3339(rfc3339).unwrap(),
        }
    }

    #[tokio::test]
    async fn expires_monthly_premium_after_its_end() {
        let svc = service();
        let pro = professional();
        svc.database().execute(Insert(pro.clone())).await.unwrap();
        _ = svc
            .execute(ActivatePremium {
                professional_id: pro.id,
                plan: premium::Plan::Monthly,
                starts_at: premium::StartDateTime::from_rfc3339(
                    "2024-01-15T00:00:00Z",
                )
                .unwrap(),
                show_badge: true,
                banner_url: None,
            })
            .await
            .unwrap();

        let expired = svc.execute(at("2024-02-15T00:00:00Z")).await.unwrap();
        assert!(expired.is_empty(), "expired at the very end");

        let expired = svc.execute(at("2024-02-16T00:00:00Z")).await.unwrap();
        assert_eq!(expired, [pro.id]);

        let expired = svc.execute(at("2024-02-16T00:00:00Z")).await.unwrap();
        assert!(expired.is_empty(), "expired twice");

        let pro = svc
            .database()
            .execute(Select(By::<Option<Professional>, _>::new(pro.id)))
            .await
            .unwrap()
            .unwrap();
        assert!(pro.premium.is_none());
        assert_eq!(pro.subscription, SubscriptionStatus::Expired);
    }

    #[tokio::test]
    async fn keeps_lifetime_premium() {
        let svc = service();
        let pro = professional();
        svc.database().execute(Insert(pro.clone())).await.unwrap();
        _ = svc
            .execute(ActivatePremium {
                professional_id: pro.id,
                plan: premium::Plan::Lifetime,
                starts_at: premium::StartDateTime::from_rfc3339(
                    "2000-01-01T00:00:00Z",
                )
                .unwrap(),
                show_badge: false,
                banner_url: None,
            })
            .await
            .unwrap();

        let expired = svc.execute(at("2100-01-01T00:00:00Z")).await.unwrap();

        assert_eq!(expired, Vec::<professional::Id>::new());
    }

    async fn with_monthly_premium(svc: &TestService) -> Professional {
        let pro = professional();
        svc.database().execute(Insert(pro.clone())).await.unwrap();
        svc.execute(ActivatePremium {
            professional_id: pro.id,
            plan: premium::Plan::Monthly,
            starts_at: premium::StartDateTime::from_rfc3339(
                "2024-01-15T00:00:00Z",
            )
            .unwrap(),
            show_badge: false,
            banner_url: None,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn keeps_every_premium_when_sweep_fails() {
        let svc = service();
        let first = with_monthly_premium(&svc).await;
        let second = with_monthly_premium(&svc).await;
        svc.database().fail_after(1);

        let err = svc
            .execute(at("2024-02-16T00:00:00Z"))
            .await
            .unwrap_err()
            .into_inner();
        assert!(
            matches!(err, ExecutionError::Db(database::Error::Unavailable)),
            "{err}",
        );

        for id in [first.id, second.id] {
            let pro = svc
                .database()
                .execute(Select(By::<Option<Professional>, _>::new(id)))
                .await
                .unwrap()
                .unwrap();
            assert!(pro.premium.is_some(), "`{id}` premium is reset");
            assert_eq!(pro.subscription, SubscriptionStatus::Active);
        }
    }
}
