// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod config;
pub mod constants;
pub mod error;
pub mod eviction;
pub mod kubernetes;
pub mod server;
pub mod tracking;

#[cfg(test)]
pub mod test_utils;
