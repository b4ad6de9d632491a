//! Description of the generic type `Addr`: the raw address integer of one
//! IP family, together with its text codec.

use std::fmt::Debug;
use std::net::{Ipv4Addr, Ipv6Addr};

use num_traits::{PrimInt, Unsigned};

use crate::Error;

/// Raw address of one IP family, held as an unsigned integer in host order:
/// bit `WIDTH - 1` is the first bit of the address, so a logical left shift
/// discards the most-significant address bit.
///
/// Implemented for `u32` (IPv4) and `u128` (IPv6).
pub trait Addr: PrimInt + Unsigned + Debug {
    /// Address width in bits.
    const WIDTH: u32;

    /// Parse the standard textual form of this family (dotted-quad for
    /// IPv4, colon-hex with `::` elision for IPv6).
    fn parse_addr(s: &str) -> Result<Self, Error>;

    /// Format the address in its standard textual form, for diagnostics.
    fn format_addr(&self) -> String;

    /// Reinterpret the low bits as an array index. Callers guarantee that
    /// the value fits in a `usize`.
    fn as_index(self) -> usize;
}

impl Addr for u32 {
    const WIDTH: u32 = 32;

    fn parse_addr(s: &str) -> Result<Self, Error> {
        let ip: Ipv4Addr = s.parse().map_err(|_| Error::Parse(s.to_string()))?;
        Ok(ip.into())
    }

    fn format_addr(&self) -> String {
        Ipv4Addr::from(*self).to_string()
    }

    #[inline(always)]
    fn as_index(self) -> usize {
        self as usize
    }
}

impl Addr for u128 {
    const WIDTH: u32 = 128;

    fn parse_addr(s: &str) -> Result<Self, Error> {
        let ip: Ipv6Addr = s.parse().map_err(|_| Error::Parse(s.to_string()))?;
        // `u128::from` reads the sixteen bytes big-endian, so bit 127 of the
        // integer is the first transmitted bit of the address.
        Ok(ip.into())
    }

    fn format_addr(&self) -> String {
        Ipv6Addr::from(*self).to_string()
    }

    #[inline(always)]
    fn as_index(self) -> usize {
        self as usize
    }
}

/// Decompose `addr` or `addr/mask` text into the numerical address and the
/// optional mask. A mask, when present, must lie in `1..=WIDTH`.
pub(crate) fn parse_prefix<K: Addr>(s: &str) -> Result<(K, Option<u8>), Error> {
    match s.split_once('/') {
        None => Ok((K::parse_addr(s)?, None)),
        Some((addr, mask)) => {
            let ip = K::parse_addr(addr)?;
            let mask: u32 = mask.parse().map_err(|_| Error::Parse(s.to_string()))?;
            if mask < 1 || mask > K::WIDTH {
                return Err(Error::MaskOutOfRange(mask));
            }
            Ok((ip, Some(mask as u8)))
        }
    }
}
