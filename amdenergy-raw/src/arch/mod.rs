//! Family-specific register definitions
//!
//! Register addresses, layouts and counter widths differ between processor
//! families. Each family lives in its own module behind a cargo feature.
//!
//! ## Supported Families
//!
//! - **Zen / Zen 2** (`zen` feature) - AMD family 17h (EPYC 7001/7002, Ryzen 1000-4000)

#[cfg(feature = "zen")]
pub mod zen;
