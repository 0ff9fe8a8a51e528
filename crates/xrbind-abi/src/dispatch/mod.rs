//! Command dispatch.
//!
//! [`Dispatch`] has one raw entry point per core command and
//! [`ExtensionDispatch`] adds the extension commands. Handle methods take the
//! dispatcher as an explicit argument; there is no global dispatcher.
//!
//! Two loaders implement the traits:
//!
//! - [`DispatchLoaderDynamic`] resolves each command through the loader's
//!   `xrGetInstanceProcAddr` and caches the pointer (any [`CommandResolver`]
//!   gets both traits through a blanket impl).
//! - `DispatchLoaderStatic` (feature `static-loader`) calls directly linked
//!   loader symbols.

use std::ffi::c_char;
use std::sync::atomic::{AtomicU64, Ordering};

use xrbind_core::{Command, ResultCode};

use crate::sys::{self, ReferenceSpaceType, SystemId, Time, VoidFunction};

mod dynamic;
mod library;
#[cfg(feature = "static-loader")]
mod static_loader;

pub use dynamic::{DispatchLoaderDynamic, DispatchTable, ReadOnlyDispatch};
pub use library::{DEFAULT_LOADER_NAME, LibraryDispatch, LoaderLibrary, LoaderLibraryError};
#[cfg(feature = "static-loader")]
pub use static_loader::DispatchLoaderStatic;
#[cfg(all(feature = "static-loader", not(feature = "no-default-dispatch")))]
pub use static_loader::{DEFAULT_CORE_DISPATCHER, default_core_dispatcher};

/// Maps a command to its function pointer.
///
/// # Safety
///
/// A returned pointer must be the loader's entry point for exactly that
/// command, so it can be called with the command's C signature.
pub unsafe trait CommandResolver {
    /// The command's pointer, or the result code explaining why there is none.
    fn resolve(&self, command: Command) -> Result<VoidFunction, ResultCode>;
}

macro_rules! declare_commands {
    (
        core {$(
            $(#[$cmeta:meta])*
            fn $cfn:ident($($carg:ident: $cty:ty),* $(,)?) => $ccmd:ident, $cpfn:ident, $csym:ident;
        )*}
        extension {$(
            $(#[$emeta:meta])*
            fn $efn:ident($($earg:ident: $ety:ty),* $(,)?) => $ecmd:ident, $epfn:ident;
        )*}
    ) => {
        $(
            #[allow(non_camel_case_types)]
            #[doc = concat!("C signature of `", stringify!($csym), "`.")]
            pub type $cpfn = unsafe extern "system" fn($($cty),*) -> ResultCode;
        )*
        $(
            #[allow(non_camel_case_types)]
            pub type $epfn = unsafe extern "system" fn($($ety),*) -> ResultCode;
        )*

        /// Raw entry points of the core commands.
        ///
        /// # Safety
        ///
        /// Every method forwards its arguments unchanged to the C command, so
        /// callers uphold that command's C contract (valid handles, live and
        /// correctly tagged structs, writable output pointers).
        pub trait Dispatch {
            $(
                $(#[$cmeta])*
                unsafe fn $cfn(&self, $($carg: $cty),*) -> ResultCode;
            )*
        }

        /// Raw entry points of the extension commands.
        ///
        /// Calls fail with the resolver's code when the extension was not
        /// enabled on the instance.
        pub trait ExtensionDispatch: Dispatch {
            $(
                $(#[$emeta])*
                unsafe fn $efn(&self, $($earg: $ety),*) -> ResultCode;
            )*
        }

        impl<R: CommandResolver + ?Sized> Dispatch for R {
            $(
                #[inline]
                unsafe fn $cfn(&self, $($carg: $cty),*) -> ResultCode {
                    match self.resolve(Command::$ccmd) {
                        // SAFETY: `CommandResolver` hands out the entry point
                        // of this command only; argument validity is the
                        // caller's contract.
                        Ok(pfn) => unsafe {
                            std::mem::transmute::<VoidFunction, $cpfn>(pfn)($($carg),*)
                        },
                        Err(code) => code,
                    }
                }
            )*
        }

        impl<R: CommandResolver + ?Sized> ExtensionDispatch for R {
            $(
                #[inline]
                unsafe fn $efn(&self, $($earg: $ety),*) -> ResultCode {
                    match self.resolve(Command::$ecmd) {
                        // SAFETY: as for the core commands.
                        Ok(pfn) => unsafe {
                            std::mem::transmute::<VoidFunction, $epfn>(pfn)($($earg),*)
                        },
                        Err(code) => code,
                    }
                }
            )*
        }

        #[cfg(feature = "static-loader")]
        #[allow(non_snake_case)]
        mod linked {
            use super::*;

            #[link(name = "openxr_loader")]
            unsafe extern "system" {
                $( pub fn $csym($($carg: $cty),*) -> ResultCode; )*
            }
        }

        #[cfg(feature = "static-loader")]
        impl Dispatch for static_loader::DispatchLoaderStatic {
            $(
                #[inline]
                unsafe fn $cfn(&self, $($carg: $cty),*) -> ResultCode {
                    // SAFETY: caller contract of `Dispatch`.
                    unsafe { linked::$csym($($carg),*) }
                }
            )*
        }
    };
}

declare_commands! {
    core {
        fn create_instance(
            create_info: *const sys::InstanceCreateInfo,
            instance: *mut sys::Instance,
        ) => CreateInstance, PFN_xrCreateInstance, xrCreateInstance;
        fn destroy_instance(instance: sys::Instance)
            => DestroyInstance, PFN_xrDestroyInstance, xrDestroyInstance;
        /// `buffer` must hold `MAX_RESULT_STRING_SIZE` bytes.
        fn result_to_string(instance: sys::Instance, value: ResultCode, buffer: *mut c_char)
            => ResultToString, PFN_xrResultToString, xrResultToString;
        fn get_instance_properties(
            instance: sys::Instance,
            instance_properties: *mut sys::InstanceProperties,
        ) => GetInstanceProperties, PFN_xrGetInstanceProperties, xrGetInstanceProperties;
        fn get_system(
            instance: sys::Instance,
            get_info: *const sys::SystemGetInfo,
            system_id: *mut SystemId,
        ) => GetSystem, PFN_xrGetSystem, xrGetSystem;
        fn get_system_properties(
            instance: sys::Instance,
            system_id: SystemId,
            properties: *mut sys::SystemProperties,
        ) => GetSystemProperties, PFN_xrGetSystemProperties, xrGetSystemProperties;
        fn create_session(
            instance: sys::Instance,
            create_info: *const sys::SessionCreateInfo,
            session: *mut sys::Session,
        ) => CreateSession, PFN_xrCreateSession, xrCreateSession;
        fn destroy_session(session: sys::Session)
            => DestroySession, PFN_xrDestroySession, xrDestroySession;
        fn begin_session(session: sys::Session, begin_info: *const sys::SessionBeginInfo)
            => BeginSession, PFN_xrBeginSession, xrBeginSession;
        fn end_session(session: sys::Session)
            => EndSession, PFN_xrEndSession, xrEndSession;
        fn request_exit_session(session: sys::Session)
            => RequestExitSession, PFN_xrRequestExitSession, xrRequestExitSession;
        /// Two-call idiom: a zero capacity queries the count only.
        fn enumerate_reference_spaces(
            session: sys::Session,
            space_capacity_input: u32,
            space_count_output: *mut u32,
            spaces: *mut ReferenceSpaceType,
        ) => EnumerateReferenceSpaces, PFN_xrEnumerateReferenceSpaces, xrEnumerateReferenceSpaces;
        fn create_reference_space(
            session: sys::Session,
            create_info: *const sys::ReferenceSpaceCreateInfo,
            space: *mut sys::Space,
        ) => CreateReferenceSpace, PFN_xrCreateReferenceSpace, xrCreateReferenceSpace;
        fn destroy_space(space: sys::Space)
            => DestroySpace, PFN_xrDestroySpace, xrDestroySpace;
        fn locate_space(
            space: sys::Space,
            base_space: sys::Space,
            time: Time,
            location: *mut sys::SpaceLocation,
        ) => LocateSpace, PFN_xrLocateSpace, xrLocateSpace;
    }
    extension {
        fn create_hand_tracker_ext(
            session: sys::Session,
            create_info: *const sys::HandTrackerCreateInfoEXT,
            hand_tracker: *mut sys::HandTrackerEXT,
        ) => CreateHandTrackerEXT, PFN_xrCreateHandTrackerEXT;
        fn destroy_hand_tracker_ext(hand_tracker: sys::HandTrackerEXT)
            => DestroyHandTrackerEXT, PFN_xrDestroyHandTrackerEXT;
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Resolution counters of a dynamic loader.
#[derive(Debug, Default)]
pub struct LoaderStats {
    resolutions: AtomicU64,
    failures: AtomicU64,
    hits: AtomicU64,
}

/// Point-in-time copy of [`LoaderStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoaderStatsSnapshot {
    /// Resolver callback invocations.
    pub resolutions: u64,
    /// Lookups that produced no pointer.
    pub failures: u64,
    /// Lookups served from the table.
    pub hits: u64,
}

impl LoaderStats {
    pub(crate) fn record_resolution(&self, resolved: bool) {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        if !resolved {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> LoaderStatsSnapshot {
        LoaderStatsSnapshot {
            resolutions: self.resolutions.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn copy(&self) -> Self {
        let s = self.snapshot();
        Self {
            resolutions: AtomicU64::new(s.resolutions),
            failures: AtomicU64::new(s.failures),
            hits: AtomicU64::new(s.hits),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nothing;

    // SAFETY: never hands out a pointer.
    unsafe impl CommandResolver for Nothing {
        fn resolve(&self, _: Command) -> Result<VoidFunction, ResultCode> {
            Err(ResultCode::ERROR_FUNCTION_UNSUPPORTED)
        }
    }

    #[test]
    fn unresolved_command_short_circuits_with_resolver_code() {
        let d = Nothing;
        // SAFETY: the call never reaches a function pointer.
        let code = unsafe { d.end_session(sys::Session::from_raw(1)) };
        assert_eq!(code, ResultCode::ERROR_FUNCTION_UNSUPPORTED);
        // SAFETY: as above.
        let code = unsafe { d.destroy_hand_tracker_ext(sys::HandTrackerEXT::NULL) };
        assert_eq!(code, ResultCode::ERROR_FUNCTION_UNSUPPORTED);
    }

    #[test]
    fn stats_count_by_outcome() {
        let stats = LoaderStats::default();
        stats.record_resolution(true);
        stats.record_resolution(false);
        stats.record_hit();
        stats.record_miss();
        assert_eq!(
            stats.snapshot(),
            LoaderStatsSnapshot {
                resolutions: 2,
                failures: 2,
                hits: 1,
            }
        );
        assert_eq!(stats.copy().snapshot(), stats.snapshot());
    }

    #[test]
    fn pfn_types_are_pointer_sized() {
        assert_eq!(size_of::<PFN_xrLocateSpace>(), size_of::<VoidFunction>());
        assert_eq!(size_of::<Option<PFN_xrCreateHandTrackerEXT>>(), size_of::<usize>());
    }
}
