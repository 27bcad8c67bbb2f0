//! [`Analytics`] definition.

use common::{
    operations::{By, Select},
    DateTime,
};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::{Interaction, Professional};
use crate::{
    domain::{
        interaction::{Counters, Month, Tally},
        professional,
    },
    infra::{database, Database},
    read::{self, interaction::MonthlyTally},
    Query, Service,
};

/// [`Query`] of [`Interaction`] analytics of a [`Professional`].
#[derive(Clone, Copy, Debug)]
pub struct Analytics {
    /// ID of the [`Professional`] to report on.
    pub professional_id: professional::Id,

    /// [`DateTime`] determining the current [`Month`].
    pub at: DateTime,
}

/// Output of the [`Analytics`] [`Query`].
///
/// Zero-valued if no [`Interaction`] was ever recorded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Output {
    /// Total [`Counters`].
    pub totals: Counters,

    /// Current [`Month`].
    pub month: Month,

    /// [`Tally`] of the current [`Month`].
    pub current_month: Tally,

    /// [`MonthlyTally`]s ordered by [`Month`], most recent first.
    pub months: Vec<MonthlyTally>,
}

impl<Db, Pay, Mail> Query<Analytics> for Service<Db, Pay, Mail>
where
    Db: Database<
        Select<By<read::interaction::Report, professional::Id>>,
        Ok = read::interaction::Report,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Output;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Analytics {
            professional_id,
            at,
        }: Analytics,
    ) -> Result<Self::Ok, Self::Err> {
        let read::interaction::Report { totals, months } = self
            .database()
            .execute(Select(By::new(professional_id)))
            .await
            .map_err(tracerr::wrap!())?;

        let month = Month::of(at);
        let current_month = months
            .iter()
            .find(|m| m.month == month)
            .map(|m| m.tally)
            .unwrap_or_default();

        Ok(Output {
            totals,
            month,
            current_month,
            months,
        })
    }
}
