//! Variant of the trie that aggregates, at every node, the set of all
//! values whose prefixes cover it.

use std::collections::BTreeSet;
use std::marker::PhantomData;

use ipnet::{Ipv4Net, Ipv6Net};
use log::warn;

use crate::addr::parse_prefix;
use crate::{Addr, Error, Value};

struct Node<V, const FANOUT: usize> {
    child: [Option<Box<Node<V, FANOUT>>>; FANOUT],
    /// Longest-prefix-match value, as in the plain trie.
    lpm_value: V,
    /// Accumulated values of every prefix covering this node.
    values: BTreeSet<V>,
}

impl<V: Copy + Ord, const FANOUT: usize> Node<V, FANOUT> {
    fn new(sentinel: V) -> Self {
        Self {
            child: std::array::from_fn(|_| None),
            lpm_value: sentinel,
            values: BTreeSet::new(),
        }
    }
}

/// Multi-bit trie that answers both the longest-prefix match and the full
/// set of covering values for an address.
///
/// Insertion follows the same rules as [`crate::Tritrie`] (masks sorted
/// non-decreasing, misaligned masks replicated over the matching child
/// slots), but each node additionally carries the union of the values of
/// all prefixes covering it, which [`MultiTritrie::query_all`] returns by
/// reference. The memory cost is substantially higher; use it where set
/// semantics rather than LPM are required.
pub struct MultiTritrie<K, V = i32, const FANOUT: usize = 256> {
    root: Node<V, FANOUT>,
    nodes_cnt: usize,
    last_mask: u8,
    sentinel: V,
    _key: PhantomData<K>,
}

impl<K, V, const FANOUT: usize> Default for MultiTritrie<K, V, FANOUT>
where
    K: Addr,
    V: Value + Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, const FANOUT: usize> MultiTritrie<K, V, FANOUT>
where
    K: Addr,
    V: Value + Ord,
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

    /// Create an empty trie with a chosen sentinel.
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
        // While diving deeper we carry the union of the values passed so
        // far; fresh nodes inherit it, existing nodes contribute theirs.
        let mut aggregated: BTreeSet<V> = self.root.values.clone();
        let mut cur = &mut self.root;

        while mask_left >= Self::BITS {
            let tri = (ip >> (K::WIDTH - Self::BITS) as usize).as_index();
            ip = ip << Self::BITS as usize;
            let (node, created) =
                Self::get_or_create(&mut cur.child[tri], &mut self.nodes_cnt, self.sentinel);
            if created {
                node.values.extend(aggregated.iter().copied());
            } else {
                aggregated.extend(node.values.iter().copied());
            }
            cur = node;
            mask_left -= Self::BITS;
        }

        // we reached the place for the new value
        aggregated.insert(value);

        if mask_left == 0 {
            if cur.lpm_value != self.sentinel {
                warn!(
                    "duplicate terminal for {}/{}, keeping the newer value",
                    addr.format_addr(),
                    mask
                );
            }
            cur.lpm_value = value;
            cur.values.extend(aggregated.iter().copied());
        } else {
            let key = (ip >> (K::WIDTH - Self::BITS) as usize).as_index();
            let level_mask = ((1usize << mask_left) - 1) << (Self::BITS - mask_left) as usize;
            for tri in 0..FANOUT {
                if (tri & level_mask) == (key & level_mask) {
                    let (node, _) =
                        Self::get_or_create(&mut cur.child[tri], &mut self.nodes_cnt, self.sentinel);
                    node.lpm_value = value;
                    node.values.extend(aggregated.iter().copied());
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
            if cur.lpm_value != self.sentinel {
                matched = cur.lpm_value;
            }
            ip = ip << Self::BITS as usize;
        }
        matched
    }

    /// All values whose prefixes cover `ip`: the set at the deepest
    /// reachable node. The reference stays valid for the life of the trie.
    pub fn query_all(&self, mut ip: K) -> &BTreeSet<V> {
        let mut cur = &self.root;
        for _ in 0..K::WIDTH.div_ceil(Self::BITS) {
            let tri = (ip >> (K::WIDTH - Self::BITS) as usize).as_index();
            cur = match cur.child[tri].as_deref() {
                Some(next) => next,
                None => break,
            };
            ip = ip << Self::BITS as usize;
        }
        &cur.values
    }

    /// Parse a host address and look up the longest-prefix match.
    pub fn query_string(&self, addr: &str) -> Result<V, Error> {
        let (ip, mask) = parse_prefix::<K>(addr)?;
        match mask {
            Some(m) if u32::from(m) != K::WIDTH => Err(Error::InvalidQuery(m)),
            _ => Ok(self.query(ip)),
        }
    }

    /// Parse a host address and return all covering values.
    pub fn query_all_string(&self, addr: &str) -> Result<&BTreeSet<V>, Error> {
        let (ip, mask) = parse_prefix::<K>(addr)?;
        match mask {
            Some(m) if u32::from(m) != K::WIDTH => Err(Error::InvalidQuery(m)),
            _ => Ok(self.query_all(ip)),
        }
    }

    /// Total number of allocated child nodes.
    pub fn size(&self) -> usize {
        self.nodes_cnt
    }

    #[inline(always)]
    fn get_or_create<'a>(
        slot: &'a mut Option<Box<Node<V, FANOUT>>>,
        nodes_cnt: &mut usize,
        sentinel: V,
    ) -> (&'a mut Node<V, FANOUT>, bool) {
        let created = slot.is_none();
        if created {
            *nodes_cnt += 1;
        }
        let node: &'a mut Node<V, FANOUT> =
            slot.get_or_insert_with(|| Box::new(Node::new(sentinel)));
        (node, created)
    }
}

impl<V, const FANOUT: usize> MultiTritrie<u32, V, FANOUT>
where
    V: Value + Ord,
{
    /// Insert a typed IPv4 network.
    pub fn add_net(&mut self, net: Ipv4Net, value: V) -> Result<(), Error> {
        self.add_prefix(net.addr().into(), net.prefix_len(), value)
    }
}

impl<V, const FANOUT: usize> MultiTritrie<u128, V, FANOUT>
where
    V: Value + Ord,
{
    /// Insert a typed IPv6 network.
    pub fn add_net(&mut self, net: Ipv6Net, value: V) -> Result<(), Error> {
        self.add_prefix(net.addr().into(), net.prefix_len(), value)
    }
}
