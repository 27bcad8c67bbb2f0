//! [`Command`] for creating a payment [`Intent`] of a [`Lead`] purchase.

use common::operations::{By, Insert, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        contact, lead,
        payment::{Intent, LeadPurchase, NewIntent},
        professional, Lead,
    },
    infra::{database, payment, Database, Payments},
    Service,
};

use super::Command;

/// [`Command`] for creating a payment [`Intent`] of a [`Lead`] purchase.
#[derive(Clone, Debug)]
pub struct CreateLeadPaymentIntent {
    /// ID of the [`Lead`] to be purchased.
    pub lead_id: lead::Id,

    /// ID of the [`Professional`] purchasing the [`Lead`].
    ///
    /// [`Professional`]: crate::domain::Professional
    pub buyer_id: professional::Id,

    /// [`contact::Name`] of the buyer.
    pub buyer_name: contact::Name,

    /// [`contact::Email`] the purchase confirmation is sent to.
    pub buyer_email: contact::Email,
}

/// Result of [`CreateLeadPaymentIntent`] [`Command`] execution.
#[derive(Clone, Debug)]
pub struct Output {
    /// Created payment [`Intent`].
    pub intent: Intent,

    /// [`Lead`] being paid for.
    pub lead: Lead,
}

impl<Db, Pay, Mail> Command<CreateLeadPaymentIntent>
    for Service<Db, Pay, Mail>
where
    Db: Database<
        Select<By<Option<Lead>, lead::Id>>,
        Ok = Option<Lead>,
        Err = Traced<database::Error>,
    >,
    Pay: Payments<
        Insert<NewIntent>,
        Ok = Intent,
        Err = Traced<payment::Error>,
    >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateLeadPaymentIntent,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateLeadPaymentIntent {
            lead_id,
            buyer_id,
            buyer_name,
            buyer_email,
        } = cmd;

        let lead = self
            .database()
            .execute(Select(By::new(lead_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::LeadNotExists(lead_id))
            .map_err(tracerr::wrap!())?;
        lead.check_purchase(buyer_id)
            .map_err(E::Ineligible)
            .map_err(tracerr::wrap!())?;

        let intent = self
            .payments()
            .execute(Insert(NewIntent {
                amount: lead.price,
                description: format!(
                    "Achat du projet {} à {}",
                    lead.project.kind, lead.project.city,
                ),
                purchase: LeadPurchase {
                    lead_id,
                    buyer_id,
                    buyer_name,
                    buyer_email,
                },
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!(
            "payment `{}` of `Lead(id: {lead_id})` created for \
             `Professional(id: {buyer_id})`",
            intent.id,
        );
        Ok(Output { intent, lead })
    }
}

/// Error of [`CreateLeadPaymentIntent`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Payments`] error.
    #[display("`Payments` operation failed: {_0}")]
    #[from]
    Payment(payment::Error),

    /// [`Lead`] with the provided ID does not exist.
    #[display("`Lead(id: {_0})` does not exist")]
    LeadNotExists(#[error(not(source))] lead::Id),

    /// Buyer may not purchase the [`Lead`].
    #[display("`Lead` cannot be purchased: {_0}")]
    Ineligible(#[error(not(source))] lead::Ineligibility),
}

#[cfg(test)]
mod spec {
    use common::operations::Insert;

    use crate::{
        domain::{contact, lead, payment::Purpose, professional, Lead},
        spec::{price, published_lead, service},
        Command as _,
    };

    use super::{CreateLeadPaymentIntent, ExecutionError};

    fn command(lead: &Lead) -> CreateLeadPaymentIntent {
        CreateLeadPaymentIntent {
            lead_id: lead.id,
            buyer_id: professional::Id::new(),
            buyer_name: contact::Name::new("Dupont Plomberie").unwrap(),
            buyer_email: contact::Email::new("contact@dupont.fr").unwrap(),
        }
    }

    #[tokio::test]
    async fn creates_intent_for_lead_price() {
        let svc = service();
        let lead = published_lead(2);
        svc.database().execute(Insert(lead.clone())).await.unwrap();
        let cmd = command(&lead);

        let out = svc.execute(cmd.clone()).await.unwrap();

        assert_eq!(out.intent.amount, price());
        assert_eq!(out.lead.id, lead.id);
        let Purpose::MarketplaceLead(purchase) = out.intent.purpose else {
            panic!("unexpected purpose: {:?}", out.intent.purpose);
        };
        assert_eq!(purchase.lead_id, lead.id);
        assert_eq!(purchase.buyer_id, cmd.buyer_id);
        assert_eq!(purchase.buyer_email, cmd.buyer_email);
    }

    #[tokio::test]
    async fn refuses_sold_out_lead() {
        let svc = service();
        let mut lead = published_lead(1);
        lead.status = lead::Status::Completed;
        svc.database().execute(Insert(lead.clone())).await.unwrap();

        let err = svc
            .execute(command(&lead))
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
    }
}
