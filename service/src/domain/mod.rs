//! Domain definitions.

pub mod contact;
pub mod interaction;
pub mod lead;
pub mod payment;
pub mod professional;

pub use self::{
    interaction::{FormSubmission, Interaction},
    lead::Lead,
    professional::Professional,
};
