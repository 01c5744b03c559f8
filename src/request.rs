// Copyright (c) 2026 Mikko Tanner. All rights reserved.
// Licensed under the MIT License or the Apache License, Version 2.0.
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{allocator::Allocator, cidr::AddressRange, AllocError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/**
An allocation request as received from configuration: CIDR strings
plus the desired mask.

Resolving the same request always yields the same block, so the caller
can persist `result.to_string()` as a stable identifier and need not
resolve again on later runs.
*/
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct AvailableCidrRequest {
    /// Ranges to search, tried in order. At least one is required.
    pub parent_cidrs: Vec<String>,
    /// Ranges already taken, anywhere within the parents.
    #[serde(default)]
    pub used_cidrs: Vec<String>,
    /// Prefix length of the block to find.
    pub mask: u8,
}

impl AvailableCidrRequest {
    pub fn new(parent_cidrs: &[impl AsRef<str>], used_cidrs: &[impl AsRef<str>], mask: u8) -> Self {
        Self {
            parent_cidrs: parent_cidrs.iter().map(|s| s.as_ref().to_string()).collect(),
            used_cidrs: used_cidrs.iter().map(|s| s.as_ref().to_string()).collect(),
            mask,
        }
    }

    /**
    Parse all CIDR strings and search the parents in order.

    ### Errors
    - [AllocError::InvalidUsedCidr] / [AllocError::InvalidParentCidr] for
      the first string that fails to parse (used ranges are checked first)
    - anything [Allocator::find_in_parents] returns
    */
    pub fn resolve(&self, alloc: &Allocator) -> Result<AddressRange, AllocError> {
        let used: Vec<AddressRange> = parse_all(&self.used_cidrs, AllocError::InvalidUsedCidr)?;
        let parents: Vec<AddressRange> =
            parse_all(&self.parent_cidrs, AllocError::InvalidParentCidr)?;

        let found: AddressRange = alloc.find_in_parents(&parents, self.mask, &used)?;
        debug!(result = %found, "resolved available CIDR request");
        Ok(found)
    }
}

fn parse_all(
    input: &[String],
    on_err: fn(String) -> AllocError,
) -> Result<Vec<AddressRange>, AllocError> {
    input
        .iter()
        .map(|s| s.parse::<AddressRange>().map_err(|_| on_err(s.clone())))
        .collect()
}

/* -------------------------------------------------------------------------- */
