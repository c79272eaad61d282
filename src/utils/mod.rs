//! # Utilities

pub mod labels;
