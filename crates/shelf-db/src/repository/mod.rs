//! # Repositories
//!
//! One repository per table. Each holds a clone of the pool, so handing one
//! out is cheap.
//!
//! - [`offline`] - key-value records for the `cart`, `books` and
//!   `categories` stores

pub mod offline;
