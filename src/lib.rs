// Copyright (c) 2026 Mikko Tanner. All rights reserved.
// Licensed under the MIT License or the Apache License, Version 2.0.
// SPDX-License-Identifier: MIT OR Apache-2.0

/*!
First-fit allocation of free IPv4 CIDR blocks.

Given one or more parent ranges and a list of already used ranges, find
the lowest-addressed block of a requested prefix length that collides
with nothing in use. Every call is pure and deterministic: the same
inputs always give the same block.

```
use available_cidr::{find_in_parents, AddressRange};

let parents: Vec<AddressRange> = vec!["10.1.0.0/16".parse().unwrap()];
let used: Vec<AddressRange> = vec!["10.1.0.0/24".parse().unwrap()];
let found = find_in_parents(&parents, 24, &used).unwrap();
assert_eq!(found.to_string(), "10.1.1.0/24");
```
*/

mod allocator;
mod cidr;
mod config;
mod request;
mod strings;

use std::{error, fmt};
use strings::*;

pub use allocator::{contained_in, find_available_cidr, find_in_parents, Allocator};
pub use cidr::{AddressRange, SubnetIter};
pub use config::AllocatorConfig;
pub use request::AvailableCidrRequest;

pub(crate) const IPV4_BITS: u8 = 32;
/// Default upper bound for the number of candidate blocks in one parent.
pub(crate) const MAX_CANDIDATES: u64 = 1 << 24;

#[rustfmt::skip]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AllocError {
    /// text is not dotted-quad IPv4 CIDR notation
    InvalidCidrFormat(String),
    /// requested block is larger than its parent, or the mask exceeds 32
    InvalidMaskSize { mask: u8, parent: AddressRange },
    /// every candidate of the given mask collides with a used range
    NoAvailableCidr(u8),
    SearchTooLarge { candidates: u64, max: u64 },
    NoParents,
    InvalidParentCidr(String),
    InvalidUsedCidr(String),
}

impl AllocError {
    /// Whether the next parent range may still be tried after this error.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, AllocError::NoAvailableCidr(_))
    }
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocError::InvalidCidrFormat(cidr) => {
                write!(f, "{ERR_CIDR_FMT}: '{cidr}'")
            }
            AllocError::InvalidMaskSize { mask, parent } => {
                write!(f, "{ERR_MASK_SIZE}: /{mask} within {parent}")
            }
            AllocError::NoAvailableCidr(mask) => {
                write!(f, "{ERR_NO_AVAIL} /{mask}")
            }
            AllocError::SearchTooLarge { candidates, max } => {
                write!(f, "{ERR_TOO_LARGE}: {candidates} (max {max})")
            }
            AllocError::NoParents => {
                write!(f, "{ERR_NO_PARENTS}")
            }
            AllocError::InvalidParentCidr(cidr) => {
                write!(f, "{ERR_PARENT}: {ERR_CIDR_FMT}: '{cidr}'")
            }
            AllocError::InvalidUsedCidr(cidr) => {
                write!(f, "{ERR_USED}: {ERR_CIDR_FMT}: '{cidr}'")
            }
        }
    }
}

impl error::Error for AllocError {}

/* -------------------------------------------------------------------------- */
