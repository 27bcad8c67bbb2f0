//! [`ExpirePremiums`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::{
    operations::{By, Perform, Start},
    DateTime,
};
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::professional::Premium;
use crate::{
    command::{self, expire_premiums::ExecutionError},
    domain::professional,
    Command, Service,
};

use super::Task;

/// Configuration for [`ExpirePremiums`] [`Task`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    /// Interval between [`Premium`]s expiry sweeps.
    ///
    /// [`None`] disables the [`Task`], so the sweep runs only on demand.
    pub interval: Option<time::Duration>,
}

/// [`Task`] periodically expiring ended [`Premium`]s.
#[derive(Clone, Copy, Debug)]
pub struct ExpirePremiums<S> {
    /// [`Service`] instance.
    service: S,
}

impl<Db, Pay, Mail> Task<Start<By<ExpirePremiums<Self>, Config>>>
    for Service<Db, Pay, Mail>
where
    ExpirePremiums<Self>: Task<Perform<()>, Ok = usize, Err: Error>,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<ExpirePremiums<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Config { interval: period } = by.into_inner();
        let Some(period) = period else {
            log::debug!("`task::ExpirePremiums` is disabled");
            return Ok(());
        };
        let task = ExpirePremiums {
            service: self.clone(),
        };

        let mut interval = interval(period);
        loop {
            _ = interval.tick().await;
            match task.execute(Perform(())).await {
                Ok(0) => {}
                Ok(count) => {
                    log::info!("`task::ExpirePremiums` expired {count}");
                }
                Err(e) => log::error!("`task::ExpirePremiums` failed: {e}"),
            }
        }
    }
}

impl<Db, Pay, Mail> Task<Perform<()>> for ExpirePremiums<Service<Db, Pay, Mail>>
where
    Service<Db, Pay, Mail>: Command<
        command::ExpirePremiums,
        Ok = Vec<professional::Id>,
        Err = Traced<ExecutionError>,
    >,
{
    type Ok = usize;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        self.service
            .execute(command::ExpirePremiums { at: DateTime::now() })
            .await
            .map(|expired| expired.len())
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::operations::{By, Insert, Perform, Start};

    use crate::{
        command::ActivatePremium,
        domain::professional::premium,
        spec::{professional, service},
        Command as _,
    };

    use super::{Config, ExpirePremiums};

    #[tokio::test]
    async fn performs_sweep() {
        let svc = service();
        let pro = professional();
        svc.database().execute(Insert(pro.clone())).await.unwrap();
        _ = svc
            .execute(ActivatePremium {
                professional_id: pro.id,
                plan: premium::Plan::Monthly,
                starts_at: premium::StartDateTime::from_rfc3339(
                    "2020-01-01T00:00:00Z",
                )
                .unwrap(),
                show_badge: false,
                banner_url: None,
            })
            .await
            .unwrap();
        let task = ExpirePremiums {
            service: svc.clone(),
        };

        assert_eq!(task.execute(Perform(())).await.unwrap(), 1);
        assert_eq!(task.execute(Perform(())).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn disabled_without_interval() {
        let svc = service();

        let res = tokio::time::timeout(
            Duration::from_secs(1),
            svc.execute(Start(By::<ExpirePremiums<_>, _>::new(Config {
                interval: None,
            }))),
        )
        .await;

        assert!(matches!(res, Ok(Ok(()))));
    }
}
