//! Mutable multi-bit trie with longest-prefix-match queries.

use std::marker::PhantomData;

use ipnet::{Ipv4Net, Ipv6Net};
use log::warn;

use crate::addr::parse_prefix;
use crate::{Addr, Error, Value};

/// A trie node. `value` stays at the sentinel unless some inserted prefix
/// terminates here.
pub(crate) struct Node<V, const FANOUT: usize> {
    pub(crate) child: [Option<Box<Node<V, FANOUT>>>; FANOUT],
    pub(crate) value: V,
}

impl<V: Copy, const FANOUT: usize> Node<V, FANOUT> {
    pub(crate) fn new(sentinel: V) -> Self {
        Self {
            child: std::array::from_fn(|_| None),
            value: sentinel,
        }
    }
}

/// Multi-bit trie mapping IP prefixes to values, where every lookup performs
/// a longest-prefix match.
///
/// The trie consumes `log2(FANOUT)` address bits per level; a larger fanout
/// trades memory for a shorter walk. Prefix lengths that are not a multiple
/// of the per-level bit count are materialized by replicating the payload
/// over every child slot the partial key matches.
///
/// Insertion requires non-decreasing mask lengths (sort the input by mask);
/// violations are rejected with [`Error::InvalidOrder`]. The structure is
/// movable but deliberately not clonable, and it is the build-phase half of
/// the pair: freeze it into a [`crate::Flatritrie`] for query-heavy use.
pub struct Tritrie<K, V = i32, const FANOUT: usize = 256> {
    root: Node<V, FANOUT>,
    nodes_cnt: usize,
    /// Mask during insertion can only grow or stay the same.
    last_mask: u8,
    sentinel: V,
    _key: PhantomData<K>,
}

impl<K, V, const FANOUT: usize> Default for Tritrie<K, V, FANOUT>
where
    K: Addr,
    V: Value,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, const FANOUT: usize> Tritrie<K, V, FANOUT>
where
    K: Addr,
    V: Value,
{
    /// Address bits consumed per trie level.
    pub const BITS: u32 = {
        assert!(
            FANOUT.is_power_of_two() && FANOUT >= 2 && FANOUT <= 256,
            "FANOUT must be a power of two in 2..=256",
        );
        FANOUT.trailing_zeros()
    };

    /// Create an empty trie with the default sentinel ([`Value::NO_MATCH`]).
    pub fn new() -> Self {
        Self::with_sentinel(V::NO_MATCH)
    }

    /// Create an empty trie with a chosen sentinel. The sentinel must not be
    /// used as a payload.
    pub fn with_sentinel(sentinel: V) -> Self {
        Self {
            root: Node::new(sentinel),
            nodes_cnt: 0,
            last_mask: 0,
            sentinel,
            _key: PhantomData,
        }
    }

    /// The sentinel value this trie reports for "no match".
    pub fn sentinel(&self) -> V {
        self.sentinel
    }

    /// Insert a prefix given as `addr/mask` text.
    ///
    /// Masks must arrive in non-decreasing order. Re-inserting a prefix
    /// replaces its value and logs a warning.
    pub fn add(&mut self, prefix: &str, value: V) -> Result<(), Error> {
        let (ip, mask) = parse_prefix::<K>(prefix)?;
        let mask = mask.ok_or(Error::MissingMask)?;
        self.add_prefix(ip, mask, value)
    }

    /// Insert a prefix given as a numerical address and mask length.
    pub fn add_prefix(&mut self, ip: K, mask: u8, value: V) -> Result<(), Error> {
        if mask < 1 || u32::from(mask) > K::WIDTH {
            return Err(Error::MaskOutOfRange(mask.into()));
        }
        if mask < self.last_mask {
            return Err(Error::InvalidOrder {
                mask,
                last: self.last_mask,
            });
        }
        self.last_mask = mask;

        let addr = ip;
        let mut ip = ip;
        let mut mask_left = u32::from(mask);
        let mut cur = &mut self.root;

        while mask_left >= Self::BITS {
            // shave the most significant bits off
            let tri = (ip >> (K::WIDTH - Self::BITS) as usize).as_index();
            ip = ip << Self::BITS as usize;
            cur = Self::get_or_create(&mut cur.child[tri], &mut self.nodes_cnt, self.sentinel);
            mask_left -= Self::BITS;
        }

        if mask_left == 0 {
            if cur.value != self.sentinel {
                warn!(
                    "duplicate terminal for {}/{}, keeping the newer value",
                    addr.format_addr(),
                    mask
                );
            }
            cur.value = value;
        } else {
            // The mask is not aligned and splits the last trie level: the
            // partial key selects the top `mask_left` bits of the index, so
            // the payload lands on every child slot matching them.
            let key = (ip >> (K::WIDTH - Self::BITS) as usize).as_index();
            let level_mask = ((1usize << mask_left) - 1) << (Self::BITS - mask_left) as usize;
            for tri in 0..FANOUT {
                if (tri & level_mask) == (key & level_mask) {
                    let node =
                        Self::get_or_create(&mut cur.child[tri], &mut self.nodes_cnt, self.sentinel);
                    node.value = value;
                }
            }
        }
        Ok(())
    }

    /// Longest-prefix-match lookup on the binary address.
    #[inline]
    pub fn query(&self, mut ip: K) -> V {
        let mut cur = &self.root;
        let mut matched = self.sentinel;
        for _ in 0..K::WIDTH.div_ceil(Self::BITS) {
            let tri = (ip >> (K::WIDTH - Self::BITS) as usize).as_index();
            cur = match cur.child[tri].as_deref() {
                Some(next) => next,
                None => break,
            };
            if cur.value != self.sentinel {
                // keep going, a deeper node may refine the match
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

    /// Total number of allocated child nodes.
    pub fn size(&self) -> usize {
        self.nodes_cnt
    }

    pub(crate) fn root(&self) -> &Node<V, FANOUT> {
        &self.root
    }

    #[inline(always)]
    fn get_or_create<'a>(
        slot: &'a mut Option<Box<Node<V, FANOUT>>>,
        nodes_cnt: &mut usize,
        sentinel: V,
    ) -> &'a mut Node<V, FANOUT> {
        if slot.is_none() {
            *nodes_cnt += 1;
        }
        slot.get_or_insert_with(|| Box::new(Node::new(sentinel)))
    }
}

impl<V, const FANOUT: usize> Tritrie<u32, V, FANOUT>
where
    V: Value,
{
    /// Insert a typed IPv4 network.
    pub fn add_net(&mut self, net: Ipv4Net, value: V) -> Result<(), Error> {
        self.add_prefix(net.addr().into(), net.prefix_len(), value)
    }
}

impl<V, const FANOUT: usize> Tritrie<u128, V, FANOUT>
where
    V: Value,
{
    /// Insert a typed IPv6 network.
    pub fn add_net(&mut self, net: Ipv6Net, value: V) -> Result<(), Error> {
        self.add_prefix(net.addr().into(), net.prefix_len(), value)
    }
}
