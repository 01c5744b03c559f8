// Copyright (c) 2026 Mikko Tanner. All rights reserved.
// Licensed under the MIT License or the Apache License, Version 2.0.
// SPDX-License-Identifier: MIT OR Apache-2.0

pub(crate) static SLASH: &str = "/";

// lib.rs
pub(crate) static ERR_CIDR_FMT: &str = "invalid IPv4 CIDR notation";
pub(crate) static ERR_MASK_SIZE: &str = "invalid mask size";
pub(crate) static ERR_NO_AVAIL: &str = "no available CIDR of size";
pub(crate) static ERR_TOO_LARGE: &str = "search too large - candidate blocks";
pub(crate) static ERR_NO_PARENTS: &str = "at least one parent CIDR is required";
pub(crate) static ERR_PARENT: &str = "error parsing parent_cidrs";
pub(crate) static ERR_USED: &str = "error parsing used_cidrs";
