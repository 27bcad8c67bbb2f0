//! [`Premium`] subscription definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

#[cfg(doc)]
use crate::domain::Professional;

/// Premium subscription of a [`Professional`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Premium {
    /// [`Plan`] of this [`Premium`].
    pub plan: Plan,

    /// [`DateTime`] when this [`Premium`] started.
    pub starts_at: StartDateTime,

    /// [`DateTime`] when this [`Premium`] ends.
    ///
    /// [`None`] for a [`Plan::Lifetime`] one.
    pub ends_at: Option<EndDateTime>,

    /// Indicator whether the premium badge is shown on the profile.
    pub show_badge: bool,

    /// [`BannerUrl`] of the profile banner, if any.
    pub banner_url: Option<BannerUrl>,
}

impl Premium {
    /// Creates a new [`Premium`] of the provided [`Plan`] starting at the
    /// provided [`DateTime`].
    ///
    /// The end is computed by calendar arithmetic: a day missing in the target
    /// month is clamped to its last day.
    ///
    /// [`None`] is returned if the end is out of the supported range.
    #[must_use]
    pub fn new(
        plan: Plan,
        starts_at: StartDateTime,
        show_badge: bool,
        banner_url: Option<BannerUrl>,
    ) -> Option<Self> {
        let ends_at = match plan {
            Plan::Monthly => Some(starts_at.checked_add_months(1)?.coerce()),
            Plan::Yearly => Some(starts_at.checked_add_years(1)?.coerce()),
            Plan::Lifetime => None,
        };
        Some(Self {
            plan,
            starts_at,
            ends_at,
            show_badge,
            banner_url,
        })
    }

    /// Indicates whether this [`Premium`] is expired at the provided
    /// [`DateTime`].
    #[must_use]
    pub fn is_expired_at<Of: ?Sized>(&self, at: DateTimeOf<Of>) -> bool {
        self.ends_at.is_some_and(|end| end < at.coerce())
    }
}

define_kind! {
    #[doc = "Plan of a [`Premium`]."]
    enum Plan {
        #[doc = "Lasts one calendar month."]
        Monthly = 1,

        #[doc = "Lasts one calendar year."]
        Yearly = 2,

        #[doc = "Never ends."]
        Lifetime = 3,
    }
}

/// URL of a profile banner media.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct BannerUrl(String);

impl BannerUrl {
    /// Creates a new [`BannerUrl`] if the given `url` is an absolute HTTP(S)
    /// one.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Option<Self> {
        let url = url.into();
        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))?;
        (!rest.is_empty()
            && !rest.starts_with('/')
            && !url.chars().any(char::is_whitespace)
            && url.len() <= 2048)
            .then_some(Self(url))
    }
}

/// [`DateTime`] when a [`Premium`] starts.
pub type StartDateTime = DateTimeOf<(Premium, unit::Start)>;

/// [`DateTime`] when a [`Premium`] ends.
pub type EndDateTime = DateTimeOf<(Premium, unit::Expiration)>;

#[cfg(test)]
mod spec {
    use common::DateTime;

    use super::{BannerUrl, Plan, Premium};

    fn at(s: &str) -> DateTime {
        DateTime::from_rfc3339(s).unwrap()
    }

    #[test]
    fn computes_end_by_plan() {
        let start = at("2024-01-15T10:00:00Z");

        let monthly = Premium::new(Plan::Monthly, start.coerce(), true, None)
            .unwrap();
        assert_eq!(
            monthly.ends_at.map(|end| end.coerce()),
            Some(at("2024-02-15T10:00:00Z")),
        );

        let yearly =
            Premium::new(Plan::Yearly, start.coerce(), true, None).unwrap();
        assert_eq!(
            yearly.ends_at.map(|end| end.coerce()),
            Some(at("2025-01-15T10:00:00Z")),
        );

        let lifetime =
            Premium::new(Plan::Lifetime, start.coerce(), true, None).unwrap();
        assert_eq!(lifetime.ends_at, None);
    }

    #[test]
    fn clamps_end_to_month_length() {
        let premium = Premium::new(
            Plan::Monthly,
            at("2024-01-31T00:00:00Z").coerce(),
            false,
            None,
        )
        .unwrap();
        assert_eq!(
            premium.ends_at.map(|end| end.coerce()),
            Some(at("2024-02-29T00:00:00Z")),
        );
    }

    #[test]
    fn expires_strictly_after_end() {
        let premium = Premium::new(
            Plan::Monthly,
            at("2024-01-15T00:00:00Z").coerce(),
            true,
            None,
        )
        .unwrap();

        assert!(!premium.is_expired_at(at("2024-02-15T00:00:00Z")));
        assert!(premium.is_expired_at(at("2024-02-16T00:00:00Z")));

        let lifetime = Premium::new(
            Plan::Lifetime,
            at("2024-01-15T00:00:00Z").coerce(),
            true,
            None,
        )
        .unwrap();
        assert!(!lifetime.is_expired_at(at("2124-01-01T00:00:00Z")));
    }

    #[test]
    fn validates_banner_url() {
        assert!(BannerUrl::new("https://cdn.example.fr/b.png").is_some());
        assert!(BannerUrl::new("http://cdn.example.fr/b.png").is_some());
        assert!(BannerUrl::new("ftp://cdn.example.fr/b.png").is_none());
        assert!(BannerUrl::new("https://").is_none());
        assert!(BannerUrl::new("https://cdn.example.fr/a b.png").is_none());
    }
}
