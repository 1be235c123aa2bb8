// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IPv4 prefix arithmetic.
//!
//! Everything here operates on native 32-bit values. A netmask is always a
//! contiguous run of leading ones, so a prefix is fully described by its
//! base address and the number of leading ones in its mask.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Convert a prefix length into the corresponding 32-bit mask.
pub fn mask_bits(length: u8) -> u32 {
    match length {
        0 => 0,
        l if l >= Prefix4::HOST_MASK => !0u32,
        l => (!0u32) << (32 - l),
    }
}

/// Return the prefix length of `netmask`, or an error if the mask is not a
/// contiguous run of leading ones.
pub fn netmask_length(netmask: Ipv4Addr) -> Result<u8, Error> {
    let bits = netmask.to_bits();
    let length = bits.leading_ones() as u8;
    if mask_bits(length) != bits {
        return Err(Error::InvalidNetmask(netmask));
    }
    Ok(length)
}

/// True iff `address` agrees with `network` on every bit set in `netmask`.
pub fn contains(
    network: Ipv4Addr,
    netmask: Ipv4Addr,
    address: Ipv4Addr,
) -> bool {
    let mask = netmask.to_bits();
    network.to_bits() & mask == address.to_bits() & mask
}

/// The number of leading bits `address` shares with `network` when it falls
/// inside `network`/`netmask`, or `None` when it does not.
pub fn match_length(
    network: Ipv4Addr,
    netmask: Ipv4Addr,
    address: Ipv4Addr,
) -> Option<u8> {
    contains(network, netmask, address)
        .then(|| netmask.to_bits().leading_ones() as u8)
}

/// Drop the last covered bit of `netmask`, doubling the address range it
/// covers. A /0 mask is returned unchanged.
pub fn widen(netmask: Ipv4Addr) -> Ipv4Addr {
    let bits = netmask.to_bits();
    Ipv4Addr::from_bits(bits & bits.wrapping_sub(1))
}

/// Cover one more leading bit with `netmask`. Inverse of [`widen`]. A /32
/// mask is returned unchanged.
pub fn narrow(netmask: Ipv4Addr) -> Ipv4Addr {
    Ipv4Addr::from_bits(!((!netmask.to_bits()) >> 1))
}

#[derive(
    Debug, Copy, Clone, Serialize, Deserialize, Eq, Hash, PartialEq,
)]
pub struct Prefix4 {
    pub value: Ipv4Addr,
    pub length: u8,
}

impl PartialOrd for Prefix4 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Prefix4 {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.value != other.value {
            return self.value.cmp(&other.value);
        }
        self.length.cmp(&other.length)
    }
}

impl Prefix4 {
    pub const HOST_MASK: u8 = 32;

    /// Create a new `Prefix4` from an IP address and prefix length.
    /// The newly created `Prefix4` will have its host bits zeroed upon
    /// creation, and lengths beyond 32 are clamped, e.g.
    /// ```
    /// use rdb::Prefix4;
    /// use std::net::Ipv4Addr;
    /// let p4 = Prefix4::new(Ipv4Addr::new(10, 0, 0, 10), 24);
    /// assert_eq!(p4.value, Ipv4Addr::new(10, 0, 0, 0));
    /// ```
    pub fn new(ip: Ipv4Addr, length: u8) -> Self {
        let mut new = Self {
            value: ip,
            length: length.min(Self::HOST_MASK),
        };
        new.unset_host_bits();
        new
    }

    /// Create a prefix from the dotted-quad network/netmask pair carried in
    /// route advertisements.
    pub fn from_netmask(
        network: Ipv4Addr,
        netmask: Ipv4Addr,
    ) -> Result<Self, Error> {
        Ok(Self::new(network, netmask_length(netmask)?))
    }

    pub fn netmask(&self) -> Ipv4Addr {
        Ipv4Addr::from_bits(mask_bits(self.length))
    }

    pub fn host_bits_are_unset(&self) -> bool {
        self.value.to_bits() & mask_bits(self.length) == self.value.to_bits()
    }

    pub fn unset_host_bits(&mut self) {
        self.value =
            Ipv4Addr::from_bits(self.value.to_bits() & mask_bits(self.length))
    }

    pub fn contains(&self, address: Ipv4Addr) -> bool {
        contains(self.value, self.netmask(), address)
    }

    pub fn match_length(&self, address: Ipv4Addr) -> Option<u8> {
        match_length(self.value, self.netmask(), address)
    }

    /// Check if this prefix is contained within another prefix.
    /// Returns true if this prefix is equal to or more specific than the other.
    pub fn within(&self, other: &Prefix4) -> bool {
        self.length >= other.length && other.contains(self.value)
    }

    /// The immediate parent prefix, one bit shorter. `None` for /0.
    pub fn widen(&self) -> Option<Prefix4> {
        (self.length > 0).then(|| Self::new(self.value, self.length - 1))
    }

    /// The low half of this prefix, one bit longer. `None` for /32.
    pub fn narrow(&self) -> Option<Prefix4> {
        (self.length < Self::HOST_MASK).then(|| Prefix4 {
            value: self.value,
            length: self.length + 1,
        })
    }

    /// The other half of this prefix's parent. `None` for /0.
    pub fn sibling(&self) -> Option<Prefix4> {
        (self.length > 0).then(|| Prefix4 {
            value: Ipv4Addr::from_bits(
                self.value.to_bits() ^ self.last_bit(),
            ),
            length: self.length,
        })
    }

    /// Two prefixes are siblings when they share a length and their base
    /// addresses differ only in the last covered bit.
    pub fn is_sibling(&self, other: &Prefix4) -> bool {
        self.sibling() == Some(*other)
    }

    /// True if this prefix is the half of its parent whose last covered bit
    /// is zero.
    pub fn is_low_half(&self) -> bool {
        self.length > 0 && self.value.to_bits() & self.last_bit() == 0
    }

    fn last_bit(&self) -> u32 {
        match self.length {
            0 => 0,
            l => 1u32 << (32 - l),
        }
    }
}

impl fmt::Display for Prefix4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.value, self.length)
    }
}

impl FromStr for Prefix4 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (value, length) = s
            .split_once('/')
            .ok_or_else(|| Error::MalformedPrefix(s.to_string()))?;

        let value: Ipv4Addr = value
            .parse()
            .map_err(|_| Error::MalformedPrefix(s.to_string()))?;
        let length: u8 = length
            .parse()
            .map_err(|_| Error::MalformedPrefix(s.to_string()))?;
        if length > Self::HOST_MASK {
            return Err(Error::InvalidPrefixLength(length));
        }

        Ok(Self::new(value, length))
    }
}
