//! Common test utilities for torrent-tidy
//!
//! This module provides shared testing infrastructure including:
//! - Torrent fixtures for index and rule tests
//! - A temporary download tree with real files, folders and hardlinks
//!
//! # Usage
//!
//! ```rust
//! use crate::common::test_helpers::*;
//! ```

#![allow(dead_code)]

pub mod fixtures;
pub mod test_helpers;
