//! Marketplace payment definitions.

use axum::extract::Json;
use axum_extra::extract::WithRejection;
use common::Currency;
use rust_decimal::Decimal;
use secrecy::ExposeSecret as _;
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{contact, lead, payment::IntentId, professional},
    Command as _,
};

use crate::{
    api::{self, LeadError},
    define_error, AsError, Context, Error,
};

/// Request body of [`create()`].
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    /// ID of the lead to pay for.
    pub lead_id: lead::Id,

    /// ID of the professional paying for the lead.
    pub buyer_id: professional::Id,

    /// Name of the professional paying for the lead.
    pub buyer_name: String,

    /// Email the purchase confirmation is sent to.
    pub buyer_email: String,
}

/// Response body of [`create()`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    /// Secret the client confirms the payment with.
    pub client_secret: String,

    /// ID of the created payment intent.
    pub payment_intent_id: String,

    /// Amount to be paid.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,

    /// Currency of the `amount`.
    pub currency: Currency,

    /// Type of the project of the lead.
    pub project_type: String,

    /// City of the project of the lead.
    pub city: String,
}

/// Creates a payment intent for purchasing a lead at its price.
///
/// # Errors
///
/// Possible error codes:
/// - `VALIDATION_ERROR` - some field is invalid or missing;
/// - `LEAD_NOT_FOUND` - lead doesn't exist;
/// - `LEAD_NOT_AVAILABLE` - lead is not published;
/// - `ALREADY_PURCHASED` - professional has purchased the lead already;
/// - `LIMIT_REACHED` - lead is sold out;
/// - `PAYMENT_PROVIDER_ERROR` - payment processor failed.
#[tracing::instrument(
    skip_all,
    fields(
        buyer.id = %req.buyer_id,
        lead.id = %req.lead_id,
        rest.name = "createLeadPayment",
    ),
)]
pub async fn create(
    ctx: Context,
    WithRejection(Json(req), _): WithRejection<Json<CreateRequest>, Error>,
) -> Result<Json<CreateResponse>, Error> {
    let CreateRequest {
        lead_id,
        buyer_id,
        buyer_name,
        buyer_email,
    } = req;

    let command::create_lead_payment_intent::Output { intent, lead } = ctx
        .service()
        .execute(command::CreateLeadPaymentIntent {
            lead_id,
            buyer_id,
            buyer_name: api::parse(
                "buyerName",
                buyer_name,
                contact::Name::new,
            )?,
            buyer_email: api::parse(
                "buyerEmail",
                buyer_email,
                contact::Email::new,
            )?,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(CreateResponse {
        client_secret: intent.client_secret.expose_secret().to_owned(),
        payment_intent_id: intent.id.to_string(),
        amount: intent.amount.amount,
        currency: intent.amount.currency,
        project_type: lead.project.kind.to_string(),
        city: lead.project.city.to_string(),
    }))
}

/// Request body of [`confirm()`].
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    /// ID of the succeeded payment intent.
    pub payment_intent_id: String,
}

/// Response body of [`confirm()`].
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    /// Always `true`.
    pub success: bool,

    /// ID of the purchased lead.
    pub lead_id: lead::Id,

    /// Amount paid.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,

    /// Currency of the `amount`.
    pub currency: Currency,
}

/// Records the lead purchase paid with the provided payment intent.
///
/// Confirming the same payment intent again succeeds without recording the
/// purchase twice.
///
/// # Errors
///
/// Possible error codes:
/// - `VALIDATION_ERROR` - `paymentIntentId` is invalid or missing;
/// - `PAYMENT_NOT_FOUND` - payment intent doesn't exist;
/// - `PAYMENT_NOT_SUCCEEDED` - payment intent hasn't succeeded;
/// - `INVALID_PAYMENT_TYPE` - payment intent is not a lead purchase;
/// - `PAYMENT_PROVIDER_ERROR` - payment processor failed;
/// - `PAYMENT_UNPROCESSED` - payment succeeded, but the purchase wasn't
///   recorded and needs manual processing.
#[tracing::instrument(
    skip_all,
    fields(
        payment_intent.id = %req.payment_intent_id,
        rest.name = "confirmLeadPayment",
    ),
)]
pub async fn confirm(
    ctx: Context,
    WithRejection(Json(req), _): WithRejection<Json<ConfirmRequest>, Error>,
) -> Result<Json<ConfirmResponse>, Error> {
    let ConfirmRequest { payment_intent_id } = req;

    let command::confirm_lead_payment::Output { lead, amount } = ctx
        .service()
        .execute(command::ConfirmLeadPayment {
            intent_id: api::parse(
                "paymentIntentId",
                payment_intent_id,
                IntentId::new,
            )?,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(ConfirmResponse {
        success: true,
        lead_id: lead.id,
        amount: amount.amount,
        currency: amount.currency,
    }))
}

define_error! {
    enum PaymentError {
        #[code = "PAYMENT_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Paiement introuvable"]
        NotExists,

        #[code = "PAYMENT_NOT_SUCCEEDED"]
        #[status = BAD_REQUEST]
        #[message = "Le paiement n'a pas abouti"]
        NotSucceeded,

        #[code = "INVALID_PAYMENT_TYPE"]
        #[status = BAD_REQUEST]
        #[message = "Ce paiement ne concerne pas un lead"]
        InvalidKind,

        #[code = "PAYMENT_UNPROCESSED"]
        #[status = INTERNAL_SERVER_ERROR]
        #[message = "Paiement reçu, mais l'achat n'a pas pu être \
                     enregistré. Notre équipe va le traiter manuellement"]
        Unprocessed,
    }
}

impl AsError for command::create_lead_payment_intent::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Payment(e) => e.try_as_error(),
            Self::LeadNotExists(_) => Some(LeadError::NotExists.into()),
            Self::Ineligible(i) => Some(LeadError::from(*i).into()),
        }
    }
}

impl AsError for command::confirm_lead_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Payment(e) => e.try_as_error(),
            Self::PaymentNotExists(_) => Some(PaymentError::NotExists.into()),
            Self::PaymentNotSucceeded(_) => {
                Some(PaymentError::NotSucceeded.into())
            }
            Self::InvalidPaymentKind(_) => {
                Some(PaymentError::InvalidKind.into())
            }
            Self::PaidButUnprocessed {
                intent_id,
                lead_id,
                source: _,
            } => Some(
                Error::from(PaymentError::Unprocessed)
                    .with_extension("needsManualProcessing", true)
                    .with_extension("paymentIntentId", intent_id.to_string())
                    .with_extension("leadId", lead_id.to_string()),
            ),
        }
    }
}

#[cfg(test)]
mod spec {
    use service::{
        command::{confirm_lead_payment::ExecutionError, purchase_lead},
        domain::{lead, payment::IntentId},
    };

    use crate::AsError as _;

    #[test]
    fn flags_unprocessed_payment() {
        let lead_id = lead::Id::new();
        let err = ExecutionError::PaidButUnprocessed {
            intent_id: IntentId::new("pi_123").unwrap(),
            lead_id,
            source: purchase_lead::ExecutionError::Contention(lead_id),
        }
        .as_error();

        assert_eq!(err.status_code, http::StatusCode::INTERNAL_SERVER_ERROR);

        let body = err.body();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "PAYMENT_UNPROCESSED");
        assert_eq!(body["needsManualProcessing"], true);
        assert_eq!(body["paymentIntentId"], "pi_123");
        assert_eq!(body["leadId"], lead_id.to_string());
    }
}
