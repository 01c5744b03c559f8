// Copyright (c) 2026 Mikko Tanner. All rights reserved.
// Licensed under the MIT License or the Apache License, Version 2.0.
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{strings::*, AllocError, IPV4_BITS};
use ipnet::{IpNet, Ipv4Net};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, net::Ipv4Addr, str::FromStr};

// Compiled once per program execution. Octets 0..=255 and prefix 0..=32,
// no leading zeros.
lazy_static! {
    static ref CIDR_RE: Regex = {
        let octet: &str = r"(25[0-5]|2[0-4][0-9]|1[0-9][0-9]|[1-9]?[0-9])";
        Regex::new(&format!(
            r"^{octet}\.{octet}\.{octet}\.{octet}/(3[0-2]|[12]?[0-9])$"
        ))
        .unwrap()
    };
}

/**
An IPv4 CIDR block: a network base address plus prefix length.

The base is always the canonical network address, i.e. all host bits
are cleared at construction time. `10.0.0.5/24` therefore becomes
`10.0.0.0/24`. Because of that, two ranges are always either nested or
disjoint, which the allocator relies on.

Ordering is by base address first, then by prefix length.
*/
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct AddressRange {
    base: u32,
    /// `0..=32`
    prefix: u8,
}

impl AddressRange {
    /// Create a new [AddressRange], masking `addr` down to its network base.
    pub fn new(addr: Ipv4Addr, prefix: u8) -> Result<Self, AllocError> {
        if prefix > IPV4_BITS {
            return Err(AllocError::InvalidCidrFormat(format!("{addr}{SLASH}{prefix}")));
        }
        Ok(Self::from_parts(u32::from(addr), prefix))
    }

    /// Caller guarantees `prefix <= 32`.
    #[inline]
    pub(crate) fn from_parts(addr: u32, prefix: u8) -> Self {
        debug_assert!(prefix <= IPV4_BITS);
        Self {
            base: addr & mask_u32(prefix),
            prefix,
        }
    }

    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.base)
    }

    /// Highest address covered by the range.
    pub fn broadcast(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.last())
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    #[inline]
    pub fn first(&self) -> u32 {
        self.base
    }

    #[inline]
    pub fn last(&self) -> u32 {
        self.base | !mask_u32(self.prefix)
    }

    /// Number of addresses covered. A /0 covers 2^32, hence [u64].
    #[inline]
    pub fn len(&self) -> u64 {
        1u64 << (IPV4_BITS - self.prefix)
    }

    /// Returns true if the range is a single host address (/32).
    pub fn is_host(&self) -> bool {
        self.prefix == IPV4_BITS
    }

    /// True if every address of `inner` lies within `self`.
    #[inline]
    pub fn contains(&self, inner: &AddressRange) -> bool {
        inner.first() >= self.first() && inner.last() <= self.last()
    }

    /// True if the two ranges share at least one address.
    #[inline]
    pub fn overlaps(&self, other: &AddressRange) -> bool {
        self.first() <= other.last() && other.first() <= self.last()
    }

    /**
    Returns an iterator over the blocks of size `prefix` that tile this
    range, in ascending address order.

    Fails with [AllocError::InvalidMaskSize] if `prefix` is shorter than
    this range's own prefix or longer than 32.
    */
    pub fn subnets(&self, prefix: u8) -> Result<SubnetIter, AllocError> {
        if prefix < self.prefix || prefix > IPV4_BITS {
            return Err(AllocError::InvalidMaskSize {
                mask: prefix,
                parent: *self,
            });
        }
        Ok(SubnetIter::new(*self, prefix))
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SLASH}{}", self.network(), self.prefix)
    }
}

impl FromStr for AddressRange {
    type Err = AllocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AllocError::InvalidCidrFormat(s.to_string());
        let caps = CIDR_RE.captures(s.trim()).ok_or_else(invalid)?;

        let mut octets: [u8; 4] = [0; 4];
        for (i, octet) in octets.iter_mut().enumerate() {
            *octet = caps[i + 1].parse::<u8>().map_err(|_| invalid())?;
        }
        let prefix: u8 = caps[5].parse::<u8>().map_err(|_| invalid())?;

        AddressRange::new(Ipv4Addr::from(octets), prefix)
    }
}

impl Serialize for AddressRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AddressRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s: String = String::deserialize(deserializer)?;
        s.parse::<AddressRange>().map_err(de::Error::custom)
    }
}

impl From<Ipv4Net> for AddressRange {
    fn from(net: Ipv4Net) -> Self {
        Self::from_parts(u32::from(net.network()), net.prefix_len())
    }
}

impl From<AddressRange> for Ipv4Net {
    fn from(range: AddressRange) -> Self {
        match Ipv4Net::new(range.network(), range.prefix) {
            Ok(net) => net,
            Err(_) => unreachable!("AddressRange prefix is always <= 32"),
        }
    }
}

impl TryFrom<IpNet> for AddressRange {
    type Error = AllocError;

    fn try_from(net: IpNet) -> Result<Self, Self::Error> {
        match net {
            IpNet::V4(v4) => Ok(v4.into()),
            IpNet::V6(v6) => Err(AllocError::InvalidCidrFormat(v6.to_string())),
        }
    }
}

/* ---------------------------------- */

/**
Iterator over equally sized sub-blocks of an [AddressRange].

Positions are tracked in [u64] so that walking up to the very end of
the address space (`255.255.255.255`) cannot overflow.
*/
pub struct SubnetIter {
    prefix: u8,
    next: u64,
    /// exclusive
    end: u64,
    step: u64,
}

impl SubnetIter {
    fn new(parent: AddressRange, prefix: u8) -> Self {
        SubnetIter {
            prefix,
            next: parent.first() as u64,
            end: parent.last() as u64 + 1,
            step: 1u64 << (IPV4_BITS - prefix),
        }
    }

    /// Number of blocks not yet yielded.
    pub fn remaining(&self) -> u64 {
        self.end.saturating_sub(self.next) / self.step
    }

    /**
    Skip every block that starts at or before `addr`. The next block
    yielded is the first aligned block after `addr`, if any.

    Never moves backwards.
    */
    pub fn skip_past(&mut self, addr: u32) {
        let target: u64 = addr as u64 + 1;
        if target > self.next {
            // round up to the next block boundary
            self.next = target.div_ceil(self.step) * self.step;
        }
    }
}

impl Iterator for SubnetIter {
    type Item = AddressRange;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }

        let block: AddressRange = AddressRange::from_parts(self.next as u32, self.prefix);
        self.next += self.step;

        Some(block)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rem: usize = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        (rem, Some(rem))
    }
}

/* ---------------------------------- */

/// Returns a u32 with `prefix` high bits set, remaining low bits zero.
#[inline]
pub(crate) fn mask_u32(prefix: u8) -> u32 {
    if prefix == 0 {
        return 0;
    }
    !0u32 << (IPV4_BITS - prefix.min(IPV4_BITS))
}

/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_NET: &str = "10.0.0.0/24";
    const TEST_HOST_BITS: &str = "10.0.0.5/24";
    const TEST_SLASH16: &str = "10.1.0.0/16";
    const TEST_WHOLE: &str = "0.0.0.0/0";
    const TEST_TOP: &str = "255.255.255.255/32";

    #[rustfmt::skip]
    const BAD_INPUTS: [&str; 12] = [
        "",
        "10.0.0.0",
        "10.0.0/24",
        "10.0.0.0/33",
        "10.0.0.256/24",
        "10.0.0.0/24/8",
        "10.0.0.01/24",
        "10.0.0.0/024",
        "a.b.c.d/8",
        "10.0.0.0/-1",
        "::/0",
        "2001:db8::/32",
    ];

    #[test]
    fn test_parse_canonical() {
        let range: AddressRange = TEST_NET.parse().unwrap();
        assert_eq!(range.network(), Ipv4Addr::new(10, 0, 0, 0));
        assert_eq!(range.prefix(), 24);
        assert_eq!(range.to_string(), TEST_NET);
    }

    #[test]
    fn test_parse_masks_host_bits() {
        let range: AddressRange = TEST_HOST_BITS.parse().unwrap();
        assert_eq!(range.to_string(), TEST_NET);
        // canonicalization is idempotent
        let again: AddressRange = range.to_string().parse().unwrap();
        assert_eq!(again, range);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let range: AddressRange = "  10.1.0.0/16\n".parse().unwrap();
        assert_eq!(range.to_string(), TEST_SLASH16);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in BAD_INPUTS {
            let res = input.parse::<AddressRange>();
            assert_eq!(
                res,
                Err(AllocError::InvalidCidrFormat(input.to_string())),
                "Failed: '{input}'"
            );
        }
    }

    #[test]
    fn test_bounds_of_address_space() {
        let whole: AddressRange = TEST_WHOLE.parse().unwrap();
        assert_eq!(whole.len(), 1u64 << 32);
        assert_eq!(whole.first(), 0);
        assert_eq!(whole.last(), u32::MAX);

        let top: AddressRange = TEST_TOP.parse().unwrap();
        assert!(top.is_host());
        assert_eq!(top.len(), 1);
        assert_eq!(top.broadcast(), Ipv4Addr::BROADCAST);
        assert!(whole.contains(&top));
    }

    #[test]
    fn test_new_rejects_long_prefix() {
        let res = AddressRange::new(Ipv4Addr::new(10, 0, 0, 0), 33);
        assert!(matches!(res, Err(AllocError::InvalidCidrFormat(_))));
    }

    #[test]
    fn test_contains_and_overlaps() {
        let outer: AddressRange = TEST_SLASH16.parse().unwrap();
        let inner: AddressRange = "10.1.42.0/24".parse().unwrap();
        let other: AddressRange = TEST_NET.parse().unwrap();

        assert!(outer.contains(&outer));
        assert!(outer.overlaps(&outer));
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(inner.overlaps(&outer));
        assert!(outer.overlaps(&inner));
        assert!(!outer.contains(&other));
        assert!(!outer.overlaps(&other));
    }

    #[test]
    fn test_siblings_are_disjoint() {
        let lo: AddressRange = "10.0.0.0/25".parse().unwrap();
        let hi: AddressRange = "10.0.0.128/25".parse().unwrap();
        assert!(!lo.overlaps(&hi));
        assert!(!hi.overlaps(&lo));
        assert!(!lo.contains(&hi));
        assert!(!hi.contains(&lo));
    }

    #[test]
    fn test_contains_agrees_with_ipnet() {
        let pairs: [(&str, &str); 4] = [
            (TEST_SLASH16, "10.1.255.0/24"),
            (TEST_SLASH16, "10.2.0.0/24"),
            (TEST_NET, TEST_SLASH16),
            (TEST_WHOLE, TEST_TOP),
        ];
        for (a, b) in pairs {
            let (ra, rb): (AddressRange, AddressRange) = (a.parse().unwrap(), b.parse().unwrap());
            let (na, nb): (Ipv4Net, Ipv4Net) = (a.parse().unwrap(), b.parse().unwrap());
            assert_eq!(ra.contains(&rb), na.contains(&nb), "Failed: {a} > {b}");
        }
    }

    #[test]
    fn test_ipnet_conversions() {
        let net: Ipv4Net = TEST_HOST_BITS.parse().unwrap();
        let range: AddressRange = net.into();
        assert_eq!(range.to_string(), TEST_NET);

        let back: Ipv4Net = range.into();
        assert_eq!(back.to_string(), TEST_NET);

        let v6: IpNet = "2001:db8::/32".parse().unwrap();
        assert!(AddressRange::try_from(v6).is_err());
    }

    #[test]
    fn test_subnets_in_order() {
        let parent: AddressRange = TEST_NET.parse().unwrap();
        let blocks: Vec<String> = parent.subnets(26).unwrap().map(|b| b.to_string()).collect();
        assert_eq!(
            blocks,
            vec!["10.0.0.0/26", "10.0.0.64/26", "10.0.0.128/26", "10.0.0.192/26"]
        );
        assert_eq!(parent.subnets(24).unwrap().count(), 1);
    }

    #[test]
    fn test_subnets_rejects_bigger_mask() {
        let parent: AddressRange = TEST_NET.parse().unwrap();
        assert_eq!(
            parent.subnets(16).err(),
            Some(AllocError::InvalidMaskSize { mask: 16, parent })
        );
        assert!(parent.subnets(33).is_err());
    }

    #[test]
    fn test_subnets_end_of_address_space() {
        let parent: AddressRange = "255.255.255.0/24".parse().unwrap();
        let mut iter: SubnetIter = parent.subnets(32).unwrap();
        assert_eq!(iter.remaining(), 256);
        iter.skip_past(u32::MAX - 1);
        assert_eq!(iter.next().map(|b| b.to_string()), Some(TEST_TOP.to_string()));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_skip_past_aligns_up() {
        let parent: AddressRange = TEST_SLASH16.parse().unwrap();
        let mut iter: SubnetIter = parent.subnets(24).unwrap();
        iter.next();
        // last address of 10.1.4.0/22
        iter.skip_past(u32::from(Ipv4Addr::new(10, 1, 7, 255)));
        assert_eq!(iter.next().unwrap().to_string(), "10.1.8.0/24");
        // going backwards is a no-op
        iter.skip_past(u32::from(Ipv4Addr::new(10, 1, 0, 0)));
        assert_eq!(iter.next().unwrap().to_string(), "10.1.9.0/24");
    }

    #[test]
    fn test_ordering_by_address() {
        let mut ranges: Vec<AddressRange> = ["10.2.0.0/16", TEST_NET, TEST_SLASH16, "10.0.0.0/8"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        ranges.sort();
        let strs: Vec<String> = ranges.iter().map(|r| r.to_string()).collect();
        assert_eq!(strs, vec!["10.0.0.0/8", TEST_NET, TEST_SLASH16, "10.2.0.0/16"]);
    }

    #[test]
    fn test_serde_as_string() {
        let range: AddressRange = TEST_NET.parse().unwrap();
        assert_eq!(serde_json::to_string(&range).unwrap(), format!("\"{TEST_NET}\""));

        let parsed: AddressRange = serde_json::from_str("\"10.0.0.5/24\"").unwrap();
        assert_eq!(parsed, range);
        assert!(serde_json::from_str::<AddressRange>("\"10.0.0.0/99\"").is_err());
    }
}
