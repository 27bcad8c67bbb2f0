//! Marker types.

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing a start of an entity validity period.
#[derive(Clone, Copy, Debug)]
pub struct Start;

/// Marker type describing an entity expiration.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;

/// Marker type describing an occurrence of an event.
#[derive(Clone, Copy, Debug)]
pub struct Occurrence;
