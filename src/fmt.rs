//! Logging shim over `defmt` and `log`.
//!
//! `defmt-03` wins when both features are enabled. Host test builds never
//! route through `defmt` since there is no global logger to link against.
#![macro_use]
#![allow(unused_macros)]

macro_rules! trace {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(all(feature = "defmt-03", not(test)))]
            ::defmt::trace!($s $(, $x)*);
            #[cfg(all(feature = "log", any(not(feature = "defmt-03"), test)))]
            ::log::trace!($s $(, $x)*);
            #[cfg(not(any(all(feature = "defmt-03", not(test)), feature = "log")))]
            let _ = ($( & $x ),*);
        }
    };
}

macro_rules! debug {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(all(feature = "defmt-03", not(test)))]
            ::defmt::debug!($s $(, $x)*);
            #[cfg(all(feature = "log", any(not(feature = "defmt-03"), test)))]
            ::log::debug!($s $(, $x)*);
            #[cfg(not(any(all(feature = "defmt-03", not(test)), feature = "log")))]
            let _ = ($( & $x ),*);
        }
    };
}

macro_rules! info {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(all(feature = "defmt-03", not(test)))]
            ::defmt::info!($s $(, $x)*);
            #[cfg(all(feature = "log", any(not(feature = "defmt-03"), test)))]
            ::log::info!($s $(, $x)*);
            #[cfg(not(any(all(feature = "defmt-03", not(test)), feature = "log")))]
            let _ = ($( & $x ),*);
        }
    };
}

macro_rules! warn {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(all(feature = "defmt-03", not(test)))]
            ::defmt::warn!($s $(, $x)*);
            #[cfg(all(feature = "log", any(not(feature = "defmt-03"), test)))]
            ::log::warn!($s $(, $x)*);
            #[cfg(not(any(all(feature = "defmt-03", not(test)), feature = "log")))]
            let _ = ($( & $x ),*);
        }
    };
}
