//! [`Lead`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Select, Update},
    pagination, Currency, Money,
};
use itertools::{multizip, Itertools as _};
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{contact, lead, professional, Lead},
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

/// Selects [`Lead`] rows along with their aggregated [`lead::Purchase`]s.
macro_rules! select_leads {
    () => {
        "\
        SELECT l.id, l.project_type, l.description, \
               l.budget, l.budget_currency, \
               l.city, l.postal_code, \
               l.homeowner_name, l.homeowner_email, l.homeowner_phone, \
               l.is_published, l.status, l.max_sales, \
               l.price, l.price_currency, \
               l.created_at, l.version, \
               p.buyer_ids, p.buyer_names, \
               p.prices, p.price_currencies, \
               p.payment_refs, p.purchased_ats \
        FROM leads AS l \
        CROSS JOIN LATERAL ( \
            SELECT COALESCE(array_agg(buyer_id ORDER BY purchased_at, \
                                               buyer_id), \
                            ARRAY[]::UUID[]) AS buyer_ids, \
                   COALESCE(array_agg(buyer_name ORDER BY purchased_at, \
                                                 buyer_id), \
                            ARRAY[]::VARCHAR[]) AS buyer_names, \
                   COALESCE(array_agg(price ORDER BY purchased_at, \
                                            buyer_id), \
                            ARRAY[]::NUMERIC[]) AS prices, \
                   COALESCE(array_agg(price_currency ORDER BY purchased_at, \
                                                     buyer_id), \
                            ARRAY[]::INT2[]) AS price_currencies, \
                   COALESCE(array_agg(payment_ref ORDER BY purchased_at, \
                                                  buyer_id), \
                            ARRAY[]::VARCHAR[]) AS payment_refs, \
                   COALESCE(array_agg(purchased_at ORDER BY purchased_at, \
                                                   buyer_id), \
                            ARRAY[]::TIMESTAMPTZ[]) AS purchased_ats \
            FROM lead_purchases \
            WHERE lead_id = l.id \
        ) AS p "
    };
}

/// Builds a [`Lead`] out of the provided row selected by `select_leads!()`.
fn lead_from_row(row: &Row) -> Result<Lead, Traced<database::Error>> {
    let max_sales = u8::try_from(row.get::<_, i16>("max_sales"))
        .ok()
        .and_then(lead::MaxSales::new)
        .ok_or_else(|| tracerr::new!(postgres::Error::Malformed("leads")))
        .map_err(tracerr::map_from)?;

    let purchases = multizip((
        row.get::<_, Vec<professional::Id>>("buyer_ids"),
        row.get::<_, Vec<contact::Name>>("buyer_names"),
        row.get::<_, Vec<Decimal>>("prices"),
        row.get::<_, Vec<Currency>>("price_currencies"),
        row.get::<_, Vec<lead::PaymentRef>>("payment_refs"),
        row.get::<_, Vec<lead::PurchaseDateTime>>("purchased_ats"),
    ))
    .map(
        |(buyer_id, buyer_name, amount, currency, payment_ref, purchased_at)| {
            lead::Purchase {
                buyer_id,
                buyer_name,
                price: Money { amount, currency },
                payment_ref,
                purchased_at,
            }
        },
    )
    .collect();

    Ok(Lead {
        id: row.get("id"),
        project: lead::Project {
            kind: row.get("project_type"),
            description: row.get("description"),
            budget: row
                .get::<_, Option<Decimal>>("budget")
                .zip(row.get::<_, Option<Currency>>("budget_currency"))
                .map(|(amount, currency)| Money { amount, currency }),
            city: row.get("city"),
            postal_code: row.get("postal_code"),
        },
        homeowner: lead::Homeowner {
            name: row.get("homeowner_name"),
            email: row.get("homeowner_email"),
            phone: row.get("homeowner_phone"),
        },
        is_published: row.get("is_published"),
        status: row.get("status"),
        max_sales,
        price: Money {
            amount: row.get("price"),
            currency: row.get("price_currency"),
        },
        purchases,
        created_at: row.get("created_at"),
        version: row.get("version"),
    })
}

/// [`lead::Purchase`]s split into columns to be passed as arrays.
#[derive(Debug)]
struct PurchaseColumns {
    /// [`lead::Purchase::buyer_id`]s.
    buyer_ids: Vec<professional::Id>,

    /// [`lead::Purchase::buyer_name`]s.
    buyer_names: Vec<contact::Name>,

    /// Amounts of [`lead::Purchase::price`]s.
    prices: Vec<Decimal>,

    /// Currencies of [`lead::Purchase::price`]s.
    currencies: Vec<Currency>,

    /// [`lead::Purchase::payment_ref`]s.
    payment_refs: Vec<lead::PaymentRef>,

    /// [`lead::Purchase::purchased_at`]s.
    purchased_ats: Vec<lead::PurchaseDateTime>,
}

impl From<Vec<lead::Purchase>> for PurchaseColumns {
    fn from(purchases: Vec<lead::Purchase>) -> Self {
        let (
            buyer_ids,
            buyer_names,
            prices,
            currencies,
            payment_refs,
            purchased_ats,
        ) = purchases
            .into_iter()
            .map(|p| {
                (
                    p.buyer_id,
                    p.buyer_name,
                    p.price.amount,
                    p.price.currency,
                    p.payment_ref,
                    p.purchased_at,
                )
            })
            .multiunzip();
        Self {
            buyer_ids,
            buyer_names,
            prices,
            currencies,
            payment_refs,
            purchased_ats,
        }
    }
}

impl<C> Database<Select<By<Option<Lead>, lead::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Lead>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Lead>, lead::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = concat!(select_leads!(), "WHERE l.id = $1");
        self.query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(lead_from_row)
            .transpose()
            .map_err(tracerr::wrap!())
    }
}

impl<C>
    Database<Select<By<read::lead::list::Page, read::lead::list::Selector>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::lead::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::lead::list::Page, read::lead::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let pagination::Selector {
            arguments,
            filter: read::lead::list::Filter { city },
        } = by.into_inner();
        let limit = i64::try_from(arguments.fetch_limit()).unwrap_or(i64::MAX);

        const SQL: &str = concat!(
            select_leads!(),
            "WHERE l.is_published \
                   AND l.status = $1 \
                   AND ($2::VARCHAR IS NULL OR l.city = $2) \
                   AND ($3::UUID IS NULL OR l.id < $3) \
             ORDER BY l.id DESC \
             LIMIT $4::INT8",
        );
        let leads = self
            .query(
                SQL,
                &[&lead::Status::Active, &city, &arguments.after, &limit],
            )
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(lead_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(tracerr::wrap!())?;

        Ok(read::lead::list::Page::new(
            &arguments,
            leads.into_iter().map(|l| (l.id, l)),
        ))
    }
}

impl<C> Database<Insert<Lead>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(lead): Insert<Lead>,
    ) -> Result<Self::Ok, Self::Err> {
        let Lead {
            id,
            project,
            homeowner,
            is_published,
            status,
            max_sales,
            price,
            purchases,
            created_at,
            version,
        } = lead;
        let max_sales = i16::from(u8::from(max_sales));
        let (budget, budget_currency) =
            project.budget.map(|b| (b.amount, b.currency)).unzip();
        let p = PurchaseColumns::from(purchases);

        const SQL: &str = "\
            WITH inserted AS ( \
                INSERT INTO leads (id, project_type, description, \
                                   budget, budget_currency, \
                                   city, postal_code, \
                                   homeowner_name, homeowner_email, \
                                   homeowner_phone, \
                                   is_published, status, max_sales, \
                                   price, price_currency, \
                                   created_at, version) \
                VALUES ($1, $2, $3, \
                        $4, $5, \
                        $6, $7, \
                        $8, $9, \
                        $10, \
                        $11, $12, $13, \
                        $14, $15, \
                        $16, $17) \
                RETURNING id \
            ) \
            INSERT INTO lead_purchases (lead_id, buyer_id, buyer_name, \
                                        price, price_currency, \
                                        payment_ref, purchased_at) \
            SELECT i.id, p.buyer_id, p.buyer_name, \
                   p.price, p.price_currency, \
                   p.payment_ref, p.purchased_at \
            FROM inserted AS i \
            CROSS JOIN unnest($18::UUID[], $19::VARCHAR[], \
                              $20::NUMERIC[], $21::INT2[], \
                              $22::VARCHAR[], $23::TIMESTAMPTZ[]) \
                    AS p(buyer_id, buyer_name, \
                         price, price_currency, \
                         payment_ref, purchased_at)";
        _ = self
            .exec(
                SQL,
                &[
                    &id,
                    &project.kind,
                    &project.description,
                    &budget,
                    &budget_currency,
                    &project.city,
                    &project.postal_code,
                    &homeowner.name,
                    &homeowner.email,
                    &homeowner.phone,
                    &is_published,
                    &status,
                    &max_sales,
                    &price.amount,
                    &price.currency,
                    &created_at,
                    &version,
                    &p.buyer_ids,
                    &p.buyer_names,
                    &p.prices,
                    &p.currencies,
                    &p.payment_refs,
                    &p.purchased_ats,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?;
        Ok(())
    }
}

impl<C> Database<Update<Lead>> for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(lead): Update<Lead>,
    ) -> Result<Self::Ok, Self::Err> {
        let max_sales = i16::from(u8::from(lead.max_sales));
        let p = PurchaseColumns::from(lead.purchases);

        // Purchases are never removed, so already stored ones are skipped.
        const SQL: &str = "\
            WITH updated AS ( \
                UPDATE leads \
                SET is_published = $3, \
                    status = $4, \
                    max_sales = $5, \
                    price = $6, \
                    price_currency = $7, \
                    version = version + 1 \
                WHERE id = $1 \
                      AND version = $2 \
                RETURNING id \
            ), purchases AS ( \
                INSERT INTO lead_purchases (lead_id, buyer_id, buyer_name, \
                                            price, price_currency, \
                                            payment_ref, purchased_at) \
                SELECT u.id, p.buyer_id, p.buyer_name, \
                       p.price, p.price_currency, \
                       p.payment_ref, p.purchased_at \
                FROM updated AS u \
                CROSS JOIN unnest($8::UUID[], $9::VARCHAR[], \
                                  $10::NUMERIC[], $11::INT2[], \
                                  $12::VARCHAR[], $13::TIMESTAMPTZ[]) \
                        AS p(buyer_id, buyer_name, \
                             price, price_currency, \
                             payment_ref, purchased_at) \
                ON CONFLICT (lead_id, buyer_id) DO NOTHING \
            ) \
            SELECT id FROM updated";
        Ok(self
            .query_opt(
                SQL,
                &[
                    &lead.id,
                    &lead.version,
                    &lead.is_published,
                    &lead.status,
                    &max_sales,
                    &lead.price.amount,
                    &lead.price.currency,
                    &p.buyer_ids,
                    &p.buyer_names,
                    &p.prices,
                    &p.currencies,
                    &p.payment_refs,
                    &p.purchased_ats,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?
            .is_some())
    }
}
