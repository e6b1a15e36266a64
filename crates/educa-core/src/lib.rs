//! Core types and policy for the Educa course manager.
//!
//! This crate has no HTTP or database dependencies. It holds
//! the domain types, the permission gate, the ownership filter and stamper,
//! course form cleaning, and the storage traits that backends implement.

// Store implementations use native `async fn` against `impl Future + Send`
// trait signatures.
#![allow(async_fn_in_trait)]

pub mod course;
pub mod error;
pub mod form;
pub mod gate;
pub mod ownership;
pub mod permission;
pub mod principal;
pub mod store;
pub mod subject;

pub use error::{Error, Result};
