//! Formatting implementations for the tries and their diagnostics.

use std::fmt::{Debug, Display, Formatter, Result};

use crate::{Addr, Flat4, Flatritrie, MultiTritrie, Stats, Tritrie, Value};

impl<K, V, const FANOUT: usize> Debug for Tritrie<K, V, FANOUT>
where
    K: Addr,
    V: Value,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("Tritrie")
            .field("bits", &Self::BITS)
            .field("nodes", &self.size())
            .finish()
    }
}

impl<K, V, const FANOUT: usize> Debug for MultiTritrie<K, V, FANOUT>
where
    K: Addr,
    V: Value + Ord,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("MultiTritrie")
            .field("bits", &Self::BITS)
            .field("nodes", &self.size())
            .finish()
    }
}

impl<K, V, const FANOUT: usize, const PAGE_SIZE: usize> Debug
    for Flatritrie<K, V, FANOUT, PAGE_SIZE>
where
    K: Addr,
    V: Value,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("Flatritrie")
            .field("bits", &Self::BITS)
            .field("stats", &self.stats())
            .finish()
    }
}

impl<V, const PAGE_SIZE: usize> Debug for Flat4<V, PAGE_SIZE>
where
    V: Value,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("Flat4").field("stats", &self.stats()).finish()
    }
}

impl Display for Stats {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "Flatritrie debug stats:")?;
        writeln!(
            f,
            "  allocated pages = {} of size {}",
            self.pages, self.page_size
        )?;
        write!(
            f,
            "  entries total = {} on last page = {}",
            self.entries_total, self.entries_in_last_page
        )
    }
}
