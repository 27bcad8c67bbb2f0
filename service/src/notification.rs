//! Email notifications sent by the [`Service`].
//!
//! [`Service`]: crate::Service

use crate::{
    domain::{payment::LeadPurchase, FormSubmission, Lead, Professional},
    infra::mail::Message,
};

/// Escapes the provided user input for embedding into HTML.
fn escape(s: impl AsRef<str>) -> String {
    s.as_ref()
        .chars()
        .fold(String::new(), |mut out, c| {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#39;"),
                c => out.push(c),
            }
            out
        })
}

/// Builds the [`Message`] confirming a [`Lead`] purchase to its buyer and
/// revealing the homeowner contact.
pub(crate) fn lead_purchased(lead: &Lead, buyer: &LeadPurchase) -> Message {
    let homeowner = &lead.homeowner;
    let phone = homeowner
        .phone
        .as_ref()
        .map_or_else(|| "non communiqué".to_owned(), escape);

    Message {
        to: buyer.buyer_email.clone(),
        subject: format!(
            "Votre achat du projet {} à {}",
            lead.project.kind, lead.project.city,
        ),
        html: format!(
            "<p>Bonjour {buyer},</p>\
             <p>Merci pour votre achat. Voici les coordonnées du porteur de \
             projet :</p>\
             <ul>\
             <li>Nom : {name}</li>\
             <li>Email : {email}</li>\
             <li>Téléphone : {phone}</li>\
             <li>Ville : {city} ({postal_code})</li>\
             </ul>\
             <p>Description du projet :</p>\
             <p>{description}</p>\
             <p>L'équipe Portail Habitat</p>",
            buyer = escape(&buyer.buyer_name),
            name = escape(&homeowner.name),
            email = escape(&homeowner.email),
            city = escape(&lead.project.city),
            postal_code = escape(&lead.project.postal_code),
            description = escape(&lead.project.description),
        ),
    }
}

/// Builds the [`Message`] notifying a [`Professional`] about a new
/// [`FormSubmission`].
pub(crate) fn form_submitted(
    professional: &Professional,
    form: &FormSubmission,
) -> Message {
    let phone = form
        .phone
        .as_ref()
        .map_or_else(|| "non communiqué".to_owned(), escape);
    let message = form
        .message
        .as_ref()
        .map_or_else(String::new, |m| format!("<p>{}</p>", escape(m)));

    Message {
        to: professional.email.clone(),
        subject: format!("Nouvelle demande de contact de {}", form.name),
        html: format!(
            "<p>Bonjour {company},</p>\
             <p>Vous avez reçu une nouvelle demande via votre profil \
             Portail Habitat :</p>\
             <ul>\
             <li>Nom : {name}</li>\
             <li>Email : {email}</li>\
             <li>Téléphone : {phone}</li>\
             </ul>\
             {message}\
             <p>L'équipe Portail Habitat</p>",
            company = escape(&professional.company_name),
            name = escape(&form.name),
            email = escape(&form.email),
        ),
    }
}
