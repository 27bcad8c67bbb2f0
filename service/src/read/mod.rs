//! Read entities definitions.

pub mod interaction;
pub mod lead;
pub mod professional;
