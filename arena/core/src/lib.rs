// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Guardrails Arena core.
//!
//! Drives two anonymized, independently guarded chatbot lanes side by side,
//! emits joint history snapshots after every poll pass, and records the
//! finished round (and the user's vote) in an external conversation store.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
