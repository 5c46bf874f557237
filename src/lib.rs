// src/lib.rs

//! Stockwatch Library
//!
//! Watches product pages of online retailers and announces when the set of
//! in-stock products of a source changes.

pub mod error;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(test)]
pub mod test_helpers;
