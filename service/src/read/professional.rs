//! [`Professional`]-related read definitions.

use common::DateTime;

#[cfg(doc)]
use crate::domain::{professional::Premium, Professional};

/// Selector of [`Professional`]s whose [`Premium`] ended strictly before the
/// provided [`DateTime`].
#[derive(Clone, Copy, Debug)]
pub struct PremiumEndedBefore(pub DateTime);
