//! [`Command`] definition.

pub mod activate_premium;
pub mod authorize_admin;
pub mod confirm_lead_payment;
pub mod create_lead;
pub mod create_lead_payment_intent;
pub mod create_professional;
pub mod deactivate_premium;
pub mod expire_premiums;
pub mod publish_lead;
pub mod purchase_lead;
pub mod track_interaction;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    activate_premium::ActivatePremium, authorize_admin::AuthorizeAdmin,
    confirm_lead_payment::ConfirmLeadPayment, create_lead::CreateLead,
    create_lead_payment_intent::CreateLeadPaymentIntent,
    create_professional::CreateProfessional,
    deactivate_premium::DeactivatePremium, expire_premiums::ExpirePremiums,
    publish_lead::PublishLead, purchase_lead::PurchaseLead,
    track_interaction::TrackInteraction,
};
