// Copyright (c) 2026 Mikko Tanner. All rights reserved.
// Licensed under the MIT License or the Apache License, Version 2.0.
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::MAX_CANDIDATES;
use serde::{Deserialize, Serialize};

/**
Tunables for an [Allocator](crate::Allocator).

Missing fields fall back to their defaults when deserializing, so an
empty table/object is a valid configuration.
*/
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Refuse to search a parent that would contain more candidate
    /// blocks than this. The default allows a /8 searched for /32s.
    pub max_candidates: u64,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            max_candidates: MAX_CANDIDATES,
        }
    }
}

impl AllocatorConfig {
    pub fn with_max_candidates(mut self, max: u64) -> Self {
        self.max_candidates = max;
        self
    }
}
