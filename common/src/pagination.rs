//! Abstractions for cursor-based pagination.

/// A page of a paginated list.
#[derive(Clone, Debug)]
pub struct Page<C, I> {
    /// [`Edge`]s on this [`Page`].
    pub edges: Vec<Edge<C, I>>,

    /// Indicator whether the list has more items after this [`Page`].
    pub has_more: bool,
}

impl<C, I> Page<C, I> {
    /// Creates a new [`Page`] out of the fetched `edges`.
    ///
    /// `edges` are expected to be fetched with the
    /// [`Arguments::fetch_limit()`], so the extra one signals that the list
    /// has more items and is cut off.
    #[must_use]
    pub fn new(
        args: &Arguments<C>,
        edges: impl IntoIterator<Item = impl Into<Edge<C, I>>>,
    ) -> Self {
        let mut edges = edges.into_iter().map(Into::into).collect::<Vec<_>>();
        let has_more = edges.len() > args.first;
        edges.truncate(args.first);
        Self { edges, has_more }
    }

    /// Returns the cursor to request the next [`Page`] with, if there is one.
    #[must_use]
    pub fn end_cursor(&self) -> Option<&C> {
        self.has_more
            .then(|| self.edges.last().map(|e| &e.cursor))
            .flatten()
    }
}

/// An edge on a [`Page`].
#[derive(Clone, Copy, Debug)]
pub struct Edge<C, I> {
    /// Cursor of this [`Edge`].
    pub cursor: C,

    /// Node of this [`Edge`].
    pub node: I,
}

impl<C, I> From<(C, I)> for Edge<C, I> {
    fn from((cursor, node): (C, I)) -> Self {
        Self { cursor, node }
    }
}

/// Forward pagination arguments.
#[derive(Clone, Copy, Debug)]
pub struct Arguments<C> {
    /// Number of items to return.
    pub first: usize,

    /// Cursor after which to return items.
    pub after: Option<C>,
}

impl<C> Arguments<C> {
    /// Maximum number of items a single [`Page`] may contain.
    pub const MAX_FIRST: usize = 100;

    /// Creates new [`Arguments`], falling back to the `default` page size.
    ///
    /// [`None`] is returned if the requested page size is zero or exceeds
    /// the [`Arguments::MAX_FIRST`].
    #[must_use]
    pub fn new(
        first: Option<usize>,
        after: Option<C>,
        default: usize,
    ) -> Option<Self> {
        let first = first.unwrap_or(default);
        (first > 0 && first <= Self::MAX_FIRST)
            .then_some(Self { first, after })
    }

    /// Returns the number of items to fetch to build a [`Page`] detecting
    /// whether there are more items.
    #[must_use]
    pub fn fetch_limit(&self) -> usize {
        self.first + 1
    }
}

/// Pagination selector.
#[derive(Clone, Copy, Debug)]
pub struct Selector<C, F> {
    /// Pagination [`Arguments`].
    pub arguments: Arguments<C>,

    /// Additional filter being applied to the result.
    pub filter: F,
}

/// Defines pagination types.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_pagination {
    ($cursor:ty, $node:ty, $filter:ty) => {
        #[doc = "Edge of a [`Page`]."]
        pub type Edge = $crate::pagination::Edge<$cursor, $node>;

        #[doc = "A [`Page`] of nodes."]
        pub type Page = $crate::pagination::Page<$cursor, $node>;

        #[doc = "Arguments for selecting a [`Page`]."]
        pub type Arguments = $crate::pagination::Arguments<$cursor>;

        #[doc = "[`Page`] selector."]
        pub type Selector = $crate::pagination::Selector<$cursor, $filter>;
    };
}
