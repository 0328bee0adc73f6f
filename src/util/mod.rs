//! Utility types and functions for shadetree.
//!
//! This module contains fundamental types used throughout the library:
//! - [`Error`] / [`Result`] - Error handling
//! - [`clean_name`] - Sanitization of tree names into graph identifiers

mod error;
mod name;

pub use error::*;
pub use name::*;
