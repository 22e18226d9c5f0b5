//! Foundation types for the tinker debug console.
//!
//! This crate contains the platform-agnostic types shared by every tinker
//! crate: the error type, colors, input events and console configuration.

pub mod color;
pub mod config;
pub mod error;
pub mod input;
