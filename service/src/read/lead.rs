//! [`Lead`]-related read definitions.

#[cfg(doc)]
use crate::domain::Lead;

pub mod list {
    //! Marketplace [`Lead`] list definitions.

    use common::define_pagination;

    use crate::domain::{contact, lead, Lead};

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Page`].
    pub type Node = Lead;

    /// Cursor pointing to a specific [`Lead`] in a list.
    ///
    /// [`Lead`]s are listed newest first, so items after a [`Cursor`] have
    /// lesser [`lead::Id`]s.
    pub type Cursor = lead::Id;

    /// Filter for [`Selector`].
    ///
    /// Only published [`lead::Status::Active`] [`Lead`]s are ever listed.
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// [`contact::City`] to list [`Lead`]s in.
        pub city: Option<contact::City>,
    }

    /// Default number of [`Lead`]s on a [`Page`].
    pub const DEFAULT_PAGE_SIZE: usize = 20;
}
