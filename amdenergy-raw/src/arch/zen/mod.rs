//! AMD family 17h (Zen, Zen+, Zen 2) register definitions
//!
//! ## References
//!
//! - Processor Programming Reference (PPR) for AMD Family 17h Model 31h
//! - Open-Source Register Reference for AMD Family 17h Processors

pub mod rapl;

/// CPU vendor string returned by CPUID leaf 0
pub const VENDOR_ID: &str = "AuthenticAMD";

/// Display family (base + extended) these definitions apply to
pub const FAMILY: u32 = 0x17;
