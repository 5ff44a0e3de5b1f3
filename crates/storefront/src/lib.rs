//! Storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused by any front end.
//!
//! # Modules
//!
//! - [`cart`] - Cart store mirrored into durable storage
//! - [`purchase`] - Confirm, record and settle a purchase
//! - [`catalog`] - Bundled product list and listing filters
//! - [`auth`] - Signed-in session, subscriptions, Firebase Authentication
//! - [`account`] - Sign-in/sign-out with user notices
//! - [`firestore`] - Remote purchase record store
//! - [`storage`] - Durable key-value backends
//! - [`notice`] - User-facing messages and confirmation prompts
//! - [`state`] - Wiring of the collaborators for front ends

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod firestore;
pub mod notice;
pub mod purchase;
pub mod state;
pub mod storage;
