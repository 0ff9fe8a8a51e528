//! Dispatch through directly linked loader symbols.

/// Calls the loader's exported core commands directly.
///
/// Zero-sized: no table and no resolution step. A missing symbol is a link
/// error. Extension commands are not exported by loaders and are only
/// reachable through [`super::DispatchLoaderDynamic`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchLoaderStatic;

const _: () = assert!(size_of::<DispatchLoaderStatic>() == 0);

/// The default dispatcher for core commands.
#[cfg(not(feature = "no-default-dispatch"))]
pub static DEFAULT_CORE_DISPATCHER: DispatchLoaderStatic = DispatchLoaderStatic;

/// The default dispatcher, for call sites that do not thread their own.
#[cfg(not(feature = "no-default-dispatch"))]
#[must_use]
pub fn default_core_dispatcher() -> &'static DispatchLoaderStatic {
    &DEFAULT_CORE_DISPATCHER
}
