//! This crate provides a longest-prefix-match (LPM) lookup engine mapping
//! IP prefixes (IPv4 or IPv6 CIDR networks) to plain values, built for
//! query-heavy workloads: geo-IP classification, ACL evaluation, and other
//! routing-adjacent decisions where billions of lookups run against tens of
//! thousands to millions of prefixes.
//!
//! # Two phases
//!
//! Building and querying are served by two tightly-coupled structures:
//!
//! - [`Tritrie`]: a mutable multi-bit trie consuming `log2(FANOUT)` address
//!   bits per level. Prefixes are inserted in non-decreasing mask order;
//!   masks that do not align with the per-level bit count are materialized
//!   by replicating the payload over the matching child slots.
//! - [`Flatritrie`]: the immutable compiled form, built once from a
//!   finished `Tritrie`. Entries are laid out depth-first in large arena
//!   pages, which keeps the query walk inside contiguous memory and makes
//!   the structure freely shareable across threads.
//!
//! [`MultiTritrie`] is a build-phase variant that additionally aggregates,
//! at every node, the set of all values whose prefixes cover it, and
//! [`Flat4`] an IPv4 specialization of the frozen form with a manually
//! unrolled query loop.
//!
//! Queries return the value of the most specific covering prefix, or the
//! sentinel (`-1` by default) when nothing matches.
//!
//! # Example
//!
//! ```
//! use flatritrie::{Flatritrie, Tritrie};
//!
//! let mut trie = Tritrie::<u32>::new();
//! trie.add("10.0.0.0/8", 1).unwrap();
//! trie.add("10.255.0.0/16", 2).unwrap();
//!
//! let mut flat: Flatritrie<u32> = Flatritrie::new();
//! flat.build(&trie);
//! assert_eq!(flat.query_string("10.255.0.1").unwrap(), 2);
//! assert_eq!(flat.query_string("10.1.2.3").unwrap(), 1);
//! assert_eq!(flat.query_string("192.168.0.1").unwrap(), -1);
//! ```

mod addr;
mod arena;
mod error;
mod flat;
mod flat4;
mod fmt;
mod multi;
mod tritrie;
mod value;

#[cfg(test)]
mod fuzzing;

pub use addr::Addr;
pub use error::Error;
pub use flat::{Flatritrie, Stats};
pub use flat4::Flat4;
pub use multi::MultiTritrie;
pub use tritrie::Tritrie;
pub use value::Value;
