//! Typed views over raw 64-bit register values

/// Trait for register layouts that can be converted to/from raw MSR values
///
/// # Example
///
/// ```
/// use amdenergy_raw::RegisterLayout;
///
/// #[derive(Debug, Default)]
/// struct Status {
///     enabled: bool,
///     level: u8,
/// }
///
/// impl RegisterLayout for Status {
///     fn to_msr_value(&self) -> u64 {
///         (self.enabled as u64) | ((self.level as u64) << 8)
///     }
///
///     fn from_msr_value(value: u64) -> Self {
///         Self {
///             enabled: (value & 1) != 0,
///             level: ((value >> 8) & 0xFF) as u8,
///         }
///     }
/// }
///
/// let status = Status::from_msr_value(0x0301);
/// assert!(status.enabled);
/// assert_eq!(status.level, 3);
/// ```
pub trait RegisterLayout: Sized {
    /// Convert this register layout to a raw MSR value
    fn to_msr_value(&self) -> u64;

    /// Parse a raw MSR value into this register layout
    fn from_msr_value(value: u64) -> Self;

    /// Validate that the field values fit their bit widths
    fn validate(&self) -> Result<(), &'static str> {
        Ok(())
    }
}
