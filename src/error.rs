//! Failure kinds surfaced by insertion and text queries.

/// Errors returned by the build and text-query paths. Lookups on the binary
/// representation ([`crate::Tritrie::query`] and friends) cannot fail.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed address or mask text.
    #[error("unable to parse address {0:?}")]
    Parse(String),
    /// The mask lies outside `1..=WIDTH` for the address family.
    #[error("mask /{0} is out of range for this address family")]
    MaskOutOfRange(u32),
    /// Insertion was given a bare address without a mask.
    #[error("prefix has no mask")]
    MissingMask,
    /// Insertion masks must be non-decreasing; the caller has to sort.
    #[error("inserting mask /{mask} after mask /{last}")]
    InvalidOrder {
        /// The offending mask.
        mask: u8,
        /// The largest mask inserted so far.
        last: u8,
    },
    /// A text query carried a partial mask. Queries accept either a bare
    /// host address or a full-width mask.
    #[error("query with a partial mask /{0}")]
    InvalidQuery(u8),
}
