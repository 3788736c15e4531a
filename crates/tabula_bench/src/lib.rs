//! Benchmark helpers for Tabula.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod utils;
