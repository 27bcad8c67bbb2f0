//! [`Interaction`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        interaction::{Counters, Kind, Month, Tally},
        professional, FormSubmission, Interaction,
    },
    infra::{
        database::{
            self,
            postgres::{self, Connection},
            Postgres,
        },
        Database,
    },
    read,
};

/// Reads a [`Tally`] out of the `views`, `phone_clicks` and
/// `form_submissions` columns of the provided row.
fn tally_from_row(
    row: &Row,
    table: &'static str,
) -> Result<Tally, Traced<database::Error>> {
    let count = |column: &str| -> Result<u64, Traced<database::Error>> {
        u64::try_from(row.get::<_, i64>(column))
            .map_err(|_| tracerr::new!(postgres::Error::Malformed(table)))
            .map_err(tracerr::map_from)
    };
    Ok(Tally {
        views: count("views")?,
        phone_clicks: count("phone_clicks")?,
        form_submissions: count("form_submissions")?,
    })
}

/// Builds a [`read::interaction::MonthlyTally`] out of the provided
/// `interaction_monthly` row.
fn monthly_tally_from_row(
    row: &Row,
) -> Result<read::interaction::MonthlyTally, Traced<database::Error>> {
    let month = row
        .get::<_, &str>("month")
        .parse::<Month>()
        .map_err(|_| {
            tracerr::new!(postgres::Error::Malformed("interaction_monthly"))
        })
        .map_err(tracerr::map_from)?;
    Ok(read::interaction::MonthlyTally {
        month,
        tally: tally_from_row(row, "interaction_monthly")
            .map_err(tracerr::wrap!())?,
    })
}

/// Converts the provided [`Tally`] into increments of its columns.
fn increments(tally: Tally) -> [i64; 3] {
    [tally.views, tally.phone_clicks, tally.form_submissions]
        .map(|n| i64::try_from(n).unwrap_or(i64::MAX))
}

impl<C> Database<Insert<Interaction>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(interaction): Insert<Interaction>,
    ) -> Result<Self::Ok, Self::Err> {
        let Interaction {
            professional_id,
            kind,
            occurred_at,
        } = interaction;
        let month = interaction.month().to_string();
        let mut tally = Tally::default();
        tally.increment(kind);
        let [views, phone_clicks, form_submissions] = increments(tally);
        let viewed_at = (kind == Kind::View).then_some(occurred_at);

        // Both tallies are incremented atomically with a single statement.
        const SQL: &str = "\
            WITH counters AS ( \
                INSERT INTO interaction_counters (professional_id, \
                                                  views, phone_clicks, \
                                                  form_submissions, \
                                                  last_viewed_at, \
                                                  last_interaction_at) \
                VALUES ($1, $3, $4, $5, $6::TIMESTAMPTZ, $7) \
                ON CONFLICT (professional_id) DO UPDATE \
                SET views = interaction_counters.views \
                            + EXCLUDED.views, \
                    phone_clicks = interaction_counters.phone_clicks \
                                   + EXCLUDED.phone_clicks, \
                    form_submissions = interaction_counters.form_submissions \
                                       + EXCLUDED.form_submissions, \
                    last_viewed_at = GREATEST( \
                        interaction_counters.last_viewed_at, \
                        EXCLUDED.last_viewed_at), \
                    last_interaction_at = GREATEST( \
                        interaction_counters.last_interaction_at, \
                        EXCLUDED.last_interaction_at) \
            ) \
            INSERT INTO interaction_monthly (professional_id, month, \
                                             views, phone_clicks, \
                                             form_submissions) \
            VALUES ($1, $2, $3, $4, $5) \
            ON CONFLICT (professional_id, month) DO UPDATE \
            SET views = interaction_monthly.views + EXCLUDED.views, \
                phone_clicks = interaction_monthly.phone_clicks \
                               + EXCLUDED.phone_clicks, \
                form_submissions = interaction_monthly.form_submissions \
                                   + EXCLUDED.form_submissions";
        _ = self
            .exec(
                SQL,
                &[
                    &professional_id,
                    &month,
                    &views,
                    &phone_clicks,
                    &form_submissions,
                    &viewed_at,
                    &occurred_at,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?;
        Ok(())
    }
}

impl<C> Database<Insert<FormSubmission>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(form): Insert<FormSubmission>,
    ) -> Result<Self::Ok, Self::Err> {
        let FormSubmission {
            id,
            professional_id,
            name,
            email,
            phone,
            message,
            submitted_at,
        } = form;

        const SQL: &str = "\
            INSERT INTO form_submissions (id, professional_id, \
                                          name, email, phone, message, \
                                          submitted_at) \
            VALUES ($1, $2, \
                    $3, $4, $5, $6, \
                    $7)";
        _ = self
            .exec(
                SQL,
                &[
                    &id,
                    &professional_id,
                    &name,
                    &email,
                    &phone,
                    &message,
                    &submitted_at,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?;
        Ok(())
    }
}

impl<C> Database<Select<By<read::interaction::Report, professional::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::interaction::Report;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::interaction::Report, professional::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const TOTALS_SQL: &str = "\
            SELECT views, phone_clicks, form_submissions, \
                   last_viewed_at, last_interaction_at \
            FROM interaction_counters \
            WHERE professional_id = $1";
        let totals = match self
            .query_opt(TOTALS_SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
        {
            Some(row) => Counters {
                tally: tally_from_row(&row, "interaction_counters")
                    .map_err(tracerr::wrap!())?,
                last_viewed_at: row.get("last_viewed_at"),
                last_interaction_at: row.get("last_interaction_at"),
            },
            None => Counters::default(),
        };

        const MONTHS_SQL: &str = "\
            SELECT month, views, phone_clicks, form_submissions \
            FROM interaction_monthly \
            WHERE professional_id = $1 \
            ORDER BY month DESC";
        let months = self
            .query(MONTHS_SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(monthly_tally_from_row)
            .collect::<Result<_, _>>()
            .map_err(tracerr::wrap!())?;

        Ok(read::interaction::Report { totals, months })
    }
}
