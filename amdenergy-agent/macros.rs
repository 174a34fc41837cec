//! Declarative macros for the small named enums used across the crate

/// Define an enum with automatic `name()` and `all()` implementations
///
/// # Example
/// ```
/// use amdenergy::metric_enum;
///
/// metric_enum! {
///     pub enum Granularity {
///         Thread => "THREAD",
///         System => "SYSTEM",
///     }
/// }
///
/// assert_eq!(Granularity::System.name(), "SYSTEM");
/// assert_eq!(Granularity::all().len(), 2);
/// ```
///
/// Expands to:
/// - An enum with Debug, Clone, Copy, PartialEq, Eq, Hash derives
/// - A `name(&self) -> &'static str` method
/// - An `all() -> Vec<Self>` method
#[macro_export]
macro_rules! metric_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident => $str:literal),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant,)*
        }

        impl $name {
            pub fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => $str,)*
                }
            }

            pub fn all() -> Vec<$name> {
                vec![$($name::$variant,)*]
            }
        }
    };
}

/// Define an enum with name() and all() methods, plus custom data per variant
///
/// # Example
/// ```
/// use amdenergy::enum_with_data;
///
/// enum_with_data! {
///     pub enum Register: u64 {
///         Units => ("UNITS", 0xC001_0299),
///         Package => ("PACKAGE", 0xC001_029B),
///     }
///     impl address -> u64
/// }
///
/// assert_eq!(Register::Package.name(), "PACKAGE");
/// assert_eq!(Register::Units.address(), 0xC001_0299);
/// ```
#[macro_export]
macro_rules! enum_with_data {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident: $data_type:ty {
            $($variant:ident => ($str:literal, $data:expr)),* $(,)?
        }
        impl $method:ident -> $return_type:ty
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant,)*
        }

        impl $name {
            pub fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => $str,)*
                }
            }

            pub fn $method(&self) -> $return_type {
                match self {
                    $($name::$variant => $data,)*
                }
            }

            pub fn all() -> Vec<$name> {
                vec![$($name::$variant,)*]
            }
        }
    };
}
