//! [`Interaction`]-related read definitions.

use crate::domain::interaction::{Counters, Month, Tally};
#[cfg(doc)]
use crate::domain::{Interaction, Professional};

/// [`Interaction`] analytics of a [`Professional`].
///
/// Zero-valued if no [`Interaction`] was ever recorded.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Report {
    /// Total [`Counters`].
    pub totals: Counters,

    /// [`MonthlyTally`]s ordered by [`Month`], most recent first.
    pub months: Vec<MonthlyTally>,
}

/// [`Tally`] of [`Interaction`]s in a single [`Month`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MonthlyTally {
    /// [`Month`] of this [`MonthlyTally`].
    pub month: Month,

    /// [`Tally`] of this [`MonthlyTally`].
    pub tally: Tally,
}
