//! [`Interaction`] definitions.

pub mod form;

use std::{fmt, str::FromStr};

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};

use crate::domain::professional;
#[cfg(doc)]
use crate::domain::Professional;

pub use self::form::FormSubmission;

/// Visitor's interaction with a [`Professional`]'s profile.
#[derive(Clone, Copy, Debug)]
pub struct Interaction {
    /// ID of the [`Professional`] this [`Interaction`] is with.
    pub professional_id: professional::Id,

    /// [`Kind`] of this [`Interaction`].
    pub kind: Kind,

    /// [`DateTime`] when this [`Interaction`] happened.
    pub occurred_at: OccurrenceDateTime,
}

impl Interaction {
    /// Returns the calendar [`Month`] this [`Interaction`] is tallied in.
    #[must_use]
    pub fn month(&self) -> Month {
        Month::of(self.occurred_at)
    }
}

define_kind! {
    #[doc = "Kind of an [`Interaction`]."]
    enum Kind {
        #[doc = "Profile was viewed."]
        View = 1,

        #[doc = "Phone number was revealed or dialed."]
        PhoneClick = 2,

        #[doc = "Contact form was submitted."]
        FormSubmission = 3,
    }
}

/// Calendar month [`Interaction`]s are tallied by, formatted as `YYYY-MM`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Month {
    /// Year of this [`Month`].
    year: i32,

    /// Number of this [`Month`] in its year, starting from `1`.
    month: u8,
}

impl Month {
    /// Returns the [`Month`] the provided [`DateTime`] belongs to.
    #[must_use]
    pub fn of<Of: ?Sized>(at: DateTimeOf<Of>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s.split_once('-').ok_or("missing `-`")?;
        if year.len() != 4 || month.len() != 2 {
            return Err("expected `YYYY-MM` format");
        }
        let year = year.parse().map_err(|_| "invalid year")?;
        let month = month.parse().map_err(|_| "invalid month")?;
        if !(1..=12).contains(&month) {
            return Err("month out of range");
        }
        Ok(Self { year, month })
    }
}

/// Tallies of [`Interaction`]s of each [`Kind`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Tally {
    /// Number of [`Kind::View`]s.
    pub views: u64,

    /// Number of [`Kind::PhoneClick`]s.
    pub phone_clicks: u64,

    /// Number of [`Kind::FormSubmission`]s.
    pub form_submissions: u64,
}

impl Tally {
    /// Counts one more [`Interaction`] of the provided [`Kind`].
    pub fn increment(&mut self, kind: Kind) {
        let counter = match kind {
            Kind::View => &mut self.views,
            Kind::PhoneClick => &mut self.phone_clicks,
            Kind::FormSubmission => &mut self.form_submissions,
        };
        *counter = counter.saturating_add(1);
    }
}

/// Total [`Interaction`] counters of a [`Professional`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Counters {
    /// [`Tally`] of all the [`Interaction`]s.
    pub tally: Tally,

    /// [`DateTime`] of the last [`Kind::View`].
    pub last_viewed_at: Option<OccurrenceDateTime>,

    /// [`DateTime`] of the last [`Interaction`] of any [`Kind`].
    pub last_interaction_at: Option<OccurrenceDateTime>,
}

impl Counters {
    /// Records the provided [`Interaction`].
    pub fn record(&mut self, interaction: &Interaction) {
        self.tally.increment(interaction.kind);
        if interaction.kind == Kind::View {
            self.last_viewed_at = Some(interaction.occurred_at);
        }
        self.last_interaction_at = Some(interaction.occurred_at);
    }
}

/// [`DateTime`] when an [`Interaction`] happened.
pub type OccurrenceDateTime = DateTimeOf<(Interaction, unit::Occurrence)>;

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::domain::professional;

    use super::{Counters, Interaction, Kind, Month};

    fn at(s: &str) -> DateTime {
        DateTime::from_rfc3339(s).unwrap()
    }

    #[test]
    fn formats_month() {
        let month = Month::of(at("2024-03-31T23:59:59Z"));
        assert_eq!(month.to_string(), "2024-03");
        assert_eq!("2024-03".parse::<Month>(), Ok(month));
        assert!("2024-13".parse::<Month>().is_err());
        assert!("2024-3".parse::<Month>().is_err());
    }

    #[test]
    fn counts_every_interaction() {
        let professional_id = professional::Id::new();
        let mut counters = Counters::default();

        let view = Interaction {
            professional_id,
            kind: Kind::View,
            occurred_at: at("2024-03-01T10:00:00Z").coerce(),
        };
        counters.record(&view);
        counters.record(&view);

        let click = Interaction {
            professional_id,
            kind: Kind::PhoneClick,
            occurred_at: at("2024-03-02T10:00:00Z").coerce(),
        };
        counters.record(&click);

        assert_eq!(counters.tally.views, 2);
        assert_eq!(counters.tally.phone_clicks, 1);
        assert_eq!(counters.tally.form_submissions, 0);
        assert_eq!(counters.last_viewed_at, Some(view.occurred_at));
        assert_eq!(counters.last_interaction_at, Some(click.occurred_at));
    }
}
