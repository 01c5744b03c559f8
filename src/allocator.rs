// Copyright (c) 2026 Mikko Tanner. All rights reserved.
// Licensed under the MIT License or the Apache License, Version 2.0.
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    cidr::{AddressRange, SubnetIter},
    config::AllocatorConfig,
    AllocError,
};
use tracing::{debug, trace};

/**
First-fit search for free CIDR blocks.

An [Allocator] holds no state besides its configuration; every call
works on its own copies of the inputs and never mutates them, so one
instance can be shared freely between threads.
*/
#[derive(Clone, Debug, Default)]
pub struct Allocator {
    cfg: AllocatorConfig,
}

impl Allocator {
    pub fn new(cfg: AllocatorConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &AllocatorConfig {
        &self.cfg
    }

    /**
    Find the lowest-addressed block of size `mask` within `parent` that
    does not overlap any range in `used`.

    Every range in `used` is expected to lie within `parent` (see
    [contained_in]); this is not re-validated here.

    ### Errors
    - [AllocError::InvalidMaskSize] if `mask` is shorter than the parent's
      prefix or longer than 32
    - [AllocError::SearchTooLarge] if the parent holds more candidate blocks
      than the configured maximum
    - [AllocError::NoAvailableCidr] if every candidate is taken
    */
    pub fn find(
        &self,
        parent: AddressRange,
        mask: u8,
        used: &[AddressRange],
    ) -> Result<AddressRange, AllocError> {
        let mut candidates: SubnetIter = parent.subnets(mask)?;

        let total: u64 = candidates.remaining();
        if total > self.cfg.max_candidates {
            return Err(AllocError::SearchTooLarge {
                candidates: total,
                max: self.cfg.max_candidates,
            });
        }

        trace!(%parent, mask, used = used.len(), "searching for an available CIDR");

        while let Some(candidate) = candidates.next() {
            debug_assert!(parent.contains(&candidate));

            /*
            CIDR blocks are either nested or disjoint, so every candidate
            starting inside a colliding used range collides with it too.
            Jump straight past the furthest-reaching collision instead of
            testing those candidates one by one.
            */
            let blocked: Option<u32> = used
                .iter()
                .filter(|u| u.overlaps(&candidate))
                .map(|u| u.last())
                .max();

            match blocked {
                None => {
                    debug!(%parent, %candidate, "found an available CIDR");
                    return Ok(candidate);
                }
                Some(last) => {
                    trace!(%candidate, "candidate already in use");
                    candidates.skip_past(last);
                }
            }
        }

        Err(AllocError::NoAvailableCidr(mask))
    }

    /**
    Try each parent in list order and return the first available block
    of size `mask`.

    For every parent only the used ranges fully contained in it are
    considered. Ranges that merely overlap a parent, or belong to another
    parent altogether, are ignored for that parent.

    Exhausting a parent moves on to the next one; any other error aborts
    the whole search.
    */
    pub fn find_in_parents(
        &self,
        parents: &[AddressRange],
        mask: u8,
        used: &[AddressRange],
    ) -> Result<AddressRange, AllocError> {
        if parents.is_empty() {
            return Err(AllocError::NoParents);
        }

        for parent in parents {
            let contained: Vec<AddressRange> = contained_in(parent, used);
            match self.find(*parent, mask, &contained) {
                Ok(found) => return Ok(found),
                Err(e) if e.is_exhausted() => {
                    debug!(%parent, mask, "parent exhausted, trying the next one");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AllocError::NoAvailableCidr(mask))
    }
}

/// Copy out the ranges of `used` that lie entirely within `parent`.
pub fn contained_in(parent: &AddressRange, used: &[AddressRange]) -> Vec<AddressRange> {
    used.iter().filter(|u| parent.contains(u)).copied().collect()
}

/// [Allocator::find] with the default configuration.
pub fn find_available_cidr(
    parent: AddressRange,
    mask: u8,
    used: &[AddressRange],
) -> Result<AddressRange, AllocError> {
    Allocator::default().find(parent, mask, used)
}

/// [Allocator::find_in_parents] with the default configuration.
pub fn find_in_parents(
    parents: &[AddressRange],
    mask: u8,
    used: &[AddressRange],
) -> Result<AddressRange, AllocError> {
    Allocator::default().find_in_parents(parents, mask, used)
}

/* -------------------------------------------------------------------------- */
