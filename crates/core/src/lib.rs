//! Storefront Core - Shared domain types.
//!
//! This crate provides the types shared by every storefront component:
//! - `storefront` - Cart store, purchase flow, catalog and identity plumbing
//! - `cli` - Terminal front end (`shop`)
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices and emails, plus the
//!   product, identity and purchase record shapes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
