//! [`Professional`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        professional::{self, premium, Premium},
        Professional,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Builds a [`Professional`] out of the provided `professionals` row.
fn professional_from_row(row: &Row) -> Professional {
    let plan = row.get::<_, Option<premium::Plan>>("premium_plan");
    let starts_at =
        row.get::<_, Option<premium::StartDateTime>>("premium_starts_at");
    let premium = plan.zip(starts_at).map(|(plan, starts_at)| Premium {
        plan,
        starts_at,
        ends_at: row.get("premium_ends_at"),
        show_badge: row.get("premium_show_badge"),
        banner_url: row.get("premium_banner_url"),
    });

    Professional {
        id: row.get("id"),
        company_name: row.get("company_name"),
        email: row.get("email"),
        phone: row.get("phone"),
        city: row.get("city"),
        premium,
        subscription: row.get("subscription"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Professional>, professional::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Professional>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Professional>, professional::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, company_name, email, phone, city, \
                   premium_plan, premium_starts_at, premium_ends_at, \
                   premium_show_badge, premium_banner_url, \
                   subscription, created_at \
            FROM professionals \
            WHERE id = $1";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(professional_from_row))
    }
}

impl<C>
    Database<
        Select<
            By<Vec<Professional>, read::professional::PremiumEndedBefore>,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Professional>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<Professional>, read::professional::PremiumEndedBefore>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::professional::PremiumEndedBefore(at) = by.into_inner();

        // Rows are locked until the sweeping transaction ends.
        const SQL: &str = "\
            SELECT id, company_name, email, phone, city, \
                   premium_plan, premium_starts_at, premium_ends_at, \
                   premium_show_badge, premium_banner_url, \
                   subscription, created_at \
            FROM professionals \
            WHERE premium_ends_at < $1 \
            FOR UPDATE SKIP LOCKED";
        Ok(self
            .query(SQL, &[&at])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(professional_from_row)
            .collect())
    }
}

impl<C> Database<Insert<Professional>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Update<Professional>,
        Ok = (),
        Err = Traced<database::Error>,
    >,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(professional): Insert<Professional>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(professional))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Professional>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(professional): Update<Professional>,
    ) -> Result<Self::Ok, Self::Err> {
        let Professional {
            id,
            company_name,
            email,
            phone,
            city,
            premium,
            subscription,
            created_at,
        } = professional;
        let show_badge = premium.as_ref().is_some_and(|p| p.show_badge);
        let (plan, starts_at, ends_at, banner_url) = match premium {
            Some(p) => {
                (Some(p.plan), Some(p.starts_at), p.ends_at, p.banner_url)
            }
            None => (None, None, None, None),
        };

        const SQL: &str = "\
            INSERT INTO professionals (id, company_name, email, phone, city, \
                                       premium_plan, premium_starts_at, \
                                       premium_ends_at, premium_show_badge, \
                                       premium_banner_url, \
                                       subscription, created_at) \
            VALUES ($1, $2, $3, $4, $5, \
                    $6, $7, \
                    $8, $9, \
                    $10, \
                    $11, $12) \
            ON CONFLICT (id) DO UPDATE \
            SET company_name = EXCLUDED.company_name, \
                email = EXCLUDED.email, \
                phone = EXCLUDED.phone, \
                city = EXCLUDED.city, \
                premium_plan = EXCLUDED.premium_plan, \
                premium_starts_at = EXCLUDED.premium_starts_at, \
                premium_ends_at = EXCLUDED.premium_ends_at, \
                premium_show_badge = EXCLUDED.premium_show_badge, \
                premium_banner_url = EXCLUDED.premium_banner_url, \
                subscription = EXCLUDED.subscription";
        _ = self
            .exec(
                SQL,
                &[
                    &id,
                    &company_name,
                    &email,
                    &phone,
                    &city,
                    &plan,
                    &starts_at,
                    &ends_at,
                    &show_badge,
                    &banner_url,
                    &subscription,
                    &created_at,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?;
        Ok(())
    }
}
