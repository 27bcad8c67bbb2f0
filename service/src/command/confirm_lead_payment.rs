//! [`Command`] for confirming a paid [`Lead`] purchase.

use common::{
    operations::{By, Deliver, Select},
    Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    command::{purchase_lead, PurchaseLead},
    domain::{
        lead,
        payment::{Intent, IntentId, IntentStatus, Purpose},
        Lead,
    },
    infra::{mail, payment, Mailer, Payments},
    notification, Service,
};

use super::Command;

/// [`Command`] for confirming a paid [`Lead`] purchase.
///
/// Records the [`Lead`] purchase once its payment [`Intent`] has succeeded.
#[derive(Clone, Debug, From)]
pub struct ConfirmLeadPayment {
    /// ID of the paid [`Intent`].
    pub intent_id: IntentId,
}

/// Result of [`ConfirmLeadPayment`] [`Command`] execution.
#[derive(Clone, Debug)]
pub struct Output {
    /// Purchased [`Lead`].
    pub lead: Lead,

    /// Amount paid.
    pub amount: Money,
}

impl<Db, Pay, Mail> Command<ConfirmLeadPayment> for Service<Db, Pay, Mail>
where
    Self: Command<
        PurchaseLead,
        Ok = purchase_lead::Output,
        Err = Traced<purchase_lead::ExecutionError>,
    >,
    Pay: Payments<
        Select<By<Option<Intent>, IntentId>>,
        Ok = Option<Intent>,
        Err = Traced<payment::Error>,
    >,
    Mail: Mailer<Deliver<mail::Message>, Ok = (), Err = Traced<mail::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ConfirmLeadPayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ConfirmLeadPayment { intent_id } = cmd;

        let intent = self
            .payments()
            .execute(Select(By::new(intent_id.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::PaymentNotExists(intent_id.clone()))
            .map_err(tracerr::wrap!())?;
        if intent.status != IntentStatus::Succeeded {
            return Err(tracerr::new!(E::PaymentNotSucceeded(intent.status)));
        }
        let Purpose::MarketplaceLead(purchase) = intent.purpose else {
            return Err(tracerr::new!(E::InvalidPaymentKind(intent_id)));
        };

        let lead_id = purchase.lead_id;
        let out = self
            .execute(PurchaseLead {
                lead_id,
                buyer_id: purchase.buyer_id,
                buyer_name: purchase.buyer_name.clone(),
                price: intent.amount,
                payment_ref: intent_id.clone().into(),
            })
            .await
            .map_err(|e| {
                let source = e.into_inner();
                log::error!(
                    "payment `{intent_id}` succeeded, but purchase of \
                     `Lead(id: {lead_id})` failed and needs manual \
                     processing: {source}",
                );
                tracerr::new!(E::PaidButUnprocessed {
                    intent_id: intent_id.clone(),
                    lead_id,
                    source,
                })
            })?;

        if out.recorded {
            let msg = notification::lead_purchased(&out.lead, &purchase);
            if let Err(e) = self.mailer().execute(Deliver(msg)).await {
                log::warn!(
                    "failed to send purchase confirmation of \
                     `Lead(id: {lead_id})` to `{}`: {e}",
                    purchase.buyer_email,
                );
            }
        }

        Ok(Output {
            lead: out.lead,
            amount: intent.amount,
        })
    }
}

/// Error of [`ConfirmLeadPayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Payments`] error.
    #[display("`Payments` operation failed: {_0}")]
    #[from]
    Payment(payment::Error),

    /// Payment [`Intent`] with the provided ID does not exist.
    #[display("Payment `{_0}` does not exist")]
    PaymentNotExists(#[error(not(source))] IntentId),

    /// Payment [`Intent`] has not succeeded.
    #[display("Payment has not succeeded: `{_0}`")]
    PaymentNotSucceeded(#[error(not(source))] IntentStatus),

    /// Payment [`Intent`] is not a [`Lead`] purchase.
    #[display("Payment `{_0}` is not a `Lead` purchase")]
    InvalidPaymentKind(#[error(not(source))] IntentId),

    /// Payment succeeded, but the [`Lead`] purchase was not recorded.
    #[display(
        "Payment `{intent_id}` succeeded, but purchase of \
         `Lead(id: {lead_id})` failed: {source}"
    )]
    PaidButUnprocessed {
        /// ID of the succeeded [`Intent`].
        intent_id: IntentId,

        /// ID of the paid [`Lead`].
        lead_id: lead::Id,

        /// Reason of the purchase failure.
        source: purchase_lead::ExecutionError,
    },
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Insert, Select},
        Currency, Money,
    };
    use secrecy::SecretString;

    use crate::{
        command::{
            create_lead_payment_intent, purchase_lead, CreateLeadPaymentIntent,
        },
        domain::{
            contact, lead,
            payment::{Intent, IntentId, IntentStatus, Purpose},
            professional, Lead,
        },
        spec::{price, published_lead, service, TestService},
        Command as _,
    };

    use super::{ConfirmLeadPayment, ExecutionError};

    async fn paid_intent(
        svc: &TestService,
        lead: &Lead,
    ) -> create_lead_payment_intent::Output {
        let out = svc
            .execute(CreateLeadPaymentIntent {
                lead_id: lead.id,
                buyer_id: professional::Id::new(),
                buyer_name: contact::Name::new("Dupont Plomberie").unwrap(),
                buyer_email: contact::Email::new("contact@dupont.fr")
                    .unwrap(),
            })
            .await
            .unwrap();
        svc.payments()
            .set_status(&out.intent.id, IntentStatus::Succeeded);
        out
    }

    #[tokio::test]
    async fn records_purchase_and_notifies_buyer() {
        let svc = service();
        let lead = published_lead(1);
        svc.database().execute(Insert(lead.clone())).await.unwrap();
        let paid = paid_intent(&svc, &lead).await;

        let out = svc
            .execute(ConfirmLeadPayment {
                intent_id: paid.intent.id.clone(),
            })
            .await
            .unwrap();

        assert_eq!(out.amount, price());
        assert_eq!(out.lead.sales_count(), 1);
        assert!(out.lead.is_completed());
        let sent = svc.mailer().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to.to_string(), "contact@dupont.fr");
        assert!(sent[0].html.contains("Jeanne Martin"));
        assert!(sent[0].html.contains("0612345678"));
    }

    #[tokio::test]
    async fn reconfirming_is_idempotent() {
        let svc = service();
        let lead = published_lead(3);
        svc.database().execute(Insert(lead.clone())).await.unwrap();
        let paid = paid_intent(&svc, &lead).await;
        let cmd = ConfirmLeadPayment {
            intent_id: paid.intent.id.clone(),
        };

        _ = svc.execute(cmd.clone()).await.unwrap();
        let out = svc.execute(cmd).await.unwrap();

        assert_eq!(out.lead.sales_count(), 1);
        assert_eq!(svc.mailer().sent().len(), 1);
        let stored = svc
            .database()
            .execute(Select(By::<Option<Lead>, _>::new(lead.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.sales_count(), 1);
    }

    #[tokio::test]
    async fn requires_succeeded_payment() {
        let svc = service();
        let lead = published_lead(1);
        svc.database().execute(Insert(lead.clone())).await.unwrap();
        let created = svc
            .execute(CreateLeadPaymentIntent {
                lead_id: lead.id,
                buyer_id: professional::Id::new(),
                buyer_name: contact::Name::new("Dupont Plomberie").unwrap(),
                buyer_email: contact::Email::new("contact@dupont.fr")
                    .unwrap(),
            })
            .await
            .unwrap();

        let err = svc
            .execute(ConfirmLeadPayment {
                intent_id: created.intent.id,
            })
            .await
            .unwrap_err()
            .into_inner();

        assert!(
            matches!(
                err,
                ExecutionError::PaymentNotSucceeded(
                    IntentStatus::RequiresPaymentMethod,
                ),
            ),
            "{err}",
        );
        assert!(svc.mailer().sent().is_empty());
    }

    #[tokio::test]
    async fn fails_on_unknown_payment() {
        let svc = service();

        let err = svc
            .execute(ConfirmLeadPayment {
                intent_id: IntentId::new("pi_unknown").unwrap(),
            })
            .await
            .unwrap_err()
            .into_inner();

        assert!(matches!(err, ExecutionError::PaymentNotExists(_)), "{err}");
    }

    #[tokio::test]
    async fn rejects_foreign_payment() {
        let svc = service();
        let id = IntentId::new("pi_subscription").unwrap();
        svc.payments().put(Intent {
            id: id.clone(),
            client_secret: SecretString::from("secret"),
            amount: Money::from_minor_units(1000, Currency::Eur),
            status: IntentStatus::Succeeded,
            purpose: Purpose::Other("premium".into()),
        });

        let err = svc
            .execute(ConfirmLeadPayment { intent_id: id })
            .await
            .unwrap_err()
            .into_inner();

        assert!(
            matches!(err, ExecutionError::InvalidPaymentKind(_)),
            "{err}",
        );
    }

    #[tokio::test]
    async fn reports_paid_but_unprocessed_purchase() {
        let svc = service();
        let lead = published_lead(1);
        svc.database().execute(Insert(lead.clone())).await.unwrap();
        let first = paid_intent(&svc, &lead).await;
        let second = paid_intent(&svc, &lead).await;
        _ = svc
            .execute(ConfirmLeadPayment {
                intent_id: first.intent.id,
            })
            .await
            .unwrap();

        let err = svc
            .execute(ConfirmLeadPayment {
                intent_id: second.intent.id.clone(),
            })
            .await
            .unwrap_err()
            .into_inner();

        match err {
            ExecutionError::PaidButUnprocessed {
                intent_id,
                lead_id,
                source,
            } => {
                assert_eq!(intent_id, second.intent.id);
                assert_eq!(lead_id, lead.id);
                assert!(
                    matches!(
                        source,
                        purchase_lead::ExecutionError::Ineligible(
                            lead::Ineligibility::SoldOut,
                        ),
                    ),
                    "{source}",
                );
            }
            e => panic!("unexpected error: {e}"),
        }
    }
}
