//! Immutable, flattened form of a [`Tritrie`], compiled once for the query
//! hot path.

use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::addr::parse_prefix;
use crate::arena::Arena;
use crate::tritrie::Node;
use crate::{Addr, Error, Tritrie, Value};

/// One flattened trie state: the value reached at this point plus one raw
/// child pointer per branch.
#[derive(Clone, Copy)]
pub(crate) struct Entry<V, const FANOUT: usize> {
    pub(crate) value: V,
    pub(crate) child: [Option<NonNull<Entry<V, FANOUT>>>; FANOUT],
}

impl<V: Copy, const FANOUT: usize> Entry<V, FANOUT> {
    pub(crate) fn new(sentinel: V) -> Self {
        Self {
            value: sentinel,
            child: [None; FANOUT],
        }
    }
}

/// Arena usage of a built [`Flatritrie`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// Number of allocated pages.
    pub pages: usize,
    /// Entries per page.
    pub page_size: usize,
    /// Entries used over all pages.
    pub entries_total: usize,
    /// Entries used on the last page.
    pub entries_in_last_page: usize,
}

/// A dictionary-like structure mapping IP addresses to values, frozen from
/// a [`Tritrie`]. Solves in software what TCAM memory solves in hardware.
///
/// - Finds the most detailed match (a `/32` trumps a `/16`).
/// - Immutable after being built; rebuilding starts from scratch.
/// - Optimized for querying: entries are laid out depth-first in large
///   arena pages, so the walk chases pointers within contiguous memory
///   instead of scattered heap nodes.
/// - Works with big networks (a `/8` in IPv4, a `/48` in IPv6) without
///   expanding them to host addresses.
///
/// Once built, a `Flatritrie` is safe to share across threads for
/// read-only querying.
pub struct Flatritrie<K, V = i32, const FANOUT: usize = 256, const PAGE_SIZE: usize = 10_000> {
    arena: Arena<Entry<V, FANOUT>, PAGE_SIZE>,
    pub(crate) root: Option<NonNull<Entry<V, FANOUT>>>,
    pub(crate) sentinel: V,
    _key: PhantomData<K>,
}

// Safety: after `build` returns, the arena memory is never written again;
// `query` only reads it, and the raw entry pointers never escape the
// structure. Sharing or sending it across threads therefore cannot
// introduce aliased writes. Mutation (`build`) requires `&mut self`, which
// the borrow checker keeps exclusive.
unsafe impl<K: Send, V: Send, const FANOUT: usize, const PAGE_SIZE: usize> Send
    for Flatritrie<K, V, FANOUT, PAGE_SIZE>
{
}
unsafe impl<K: Sync, V: Sync, const FANOUT: usize, const PAGE_SIZE: usize> Sync
    for Flatritrie<K, V, FANOUT, PAGE_SIZE>
{
}

impl<K, V, const FANOUT: usize, const PAGE_SIZE: usize> Default
    for Flatritrie<K, V, FANOUT, PAGE_SIZE>
where
    K: Addr,
    V: Value,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, const FANOUT: usize, const PAGE_SIZE: usize> Flatritrie<K, V, FANOUT, PAGE_SIZE>
where
    K: Addr,
    V: Value,
{
    /// Address bits consumed per step of the query walk.
    pub const BITS: u32 = {
        assert!(
            FANOUT.is_power_of_two() && FANOUT >= 2 && FANOUT <= 256,
            "FANOUT must be a power of two in 2..=256",
        );
        FANOUT.trailing_zeros()
    };

    /// Create an empty, un-built structure.
    pub fn new() -> Self {
        Self::with_sentinel(V::NO_MATCH)
    }

    /// Create an empty, un-built structure. The given sentinel is only a
    /// placeholder until [`Flatritrie::build`], which adopts the sentinel
    /// of its source.
    pub fn with_sentinel(sentinel: V) -> Self {
        Self {
            arena: Arena::new(),
            root: None,
            sentinel,
            _key: PhantomData,
        }
    }

    /// Compile `src` into arena pages, releasing any prior state. Entries
    /// are allocated in depth-first order, so the hot root subtree lands at
    /// low arena addresses; the very first allocation is the root.
    ///
    /// Pointers and references into a previous build are invalidated.
    pub fn build(&mut self, src: &Tritrie<K, V, FANOUT>) {
        self.arena.reset();
        self.root = None;
        self.sentinel = src.sentinel();
        let root = self.copy_node(src.root());
        self.root = Some(root);
    }

    fn copy_node(&mut self, node: &Node<V, FANOUT>) -> NonNull<Entry<V, FANOUT>> {
        let entry = self.arena.alloc(Entry::new(self.sentinel));
        // Safety: `entry` was just allocated from a page that is never
        // moved or freed while `self` lives, and nothing else points at it
        // yet; we hold `&mut self`, so no reader can be racing us.
        unsafe { (*entry.as_ptr()).value = node.value };
        for (i, child) in node.child.iter().enumerate() {
            if let Some(child) = child {
                let child_entry = self.copy_node(child);
                unsafe { (*entry.as_ptr()).child[i] = Some(child_entry) };
            }
        }
        entry
    }

    /// Longest-prefix-match lookup on the binary address.
    ///
    /// # Panics
    /// Querying a structure that was never [built](Flatritrie::build) is a
    /// programmer error and panics.
    #[inline]
    pub fn query(&self, mut ip: K) -> V {
        let root = self.root.expect("query on a Flatritrie that was never built");
        // Safety: entry pointers produced by `build` stay valid for the
        // life of the arena, and nothing mutates entries behind `&self`.
        let mut cur: &Entry<V, FANOUT> = unsafe { root.as_ref() };
        let mut matched = self.sentinel;
        for _ in 0..K::WIDTH.div_ceil(Self::BITS) {
            let tri = (ip >> (K::WIDTH - Self::BITS) as usize).as_index();
            cur = match cur.child[tri] {
                Some(next) => unsafe { next.as_ref() },
                None => return matched,
            };
            if cur.value != self.sentinel {
                matched = cur.value;
            }
            ip = ip << Self::BITS as usize;
        }
        matched
    }

    /// Parse a host address (bare, or with the full-width mask) and look it
    /// up.
    pub fn query_string(&self, addr: &str) -> Result<V, Error> {
        let (ip, mask) = parse_prefix::<K>(addr)?;
        match mask {
            Some(m) if u32::from(m) != K::WIDTH => Err(Error::InvalidQuery(m)),
            _ => Ok(self.query(ip)),
        }
    }

    /// Total entries used over all pages.
    pub fn size(&self) -> usize {
        self.arena.len()
    }

    /// Arena usage counters.
    pub fn stats(&self) -> Stats {
        Stats {
            pages: self.arena.pages(),
            page_size: PAGE_SIZE,
            entries_total: self.arena.len(),
            entries_in_last_page: self.arena.used_in_page(),
        }
    }
}
