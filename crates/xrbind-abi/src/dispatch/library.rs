//! Loading the loader library at runtime.
//!
//! Opens a loader shared library and looks up `xrGetInstanceProcAddr`, the
//! one entry point a [`DispatchLoaderDynamic`] needs. Dispatchers built from
//! a [`LoaderLibrary`] borrow it, so the library cannot be closed while one
//! is still around.

use std::marker::PhantomData;
use std::ops::Deref;

use libloading::{Library, Symbol};
use xrbind_core::{Command, ResultCode};

use super::{CommandResolver, DispatchLoaderDynamic};
use crate::sys::{self, GetInstanceProcAddr, VoidFunction};

/// File name of the system loader.
#[cfg(target_os = "windows")]
pub const DEFAULT_LOADER_NAME: &str = "openxr_loader.dll";
#[cfg(target_os = "macos")]
pub const DEFAULT_LOADER_NAME: &str = "libopenxr_loader.dylib";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const DEFAULT_LOADER_NAME: &str = "libopenxr_loader.so.1";

const ENTRY_POINT: &[u8] = b"xrGetInstanceProcAddr\0";

#[derive(Debug, thiserror::Error)]
pub enum LoaderLibraryError {
    #[error("failed to open loader library: {0}")]
    Open(#[from] libloading::Error),
    #[error("loader library {path} does not export xrGetInstanceProcAddr")]
    MissingEntryPoint {
        path: String,
        #[source]
        source: libloading::Error,
    },
}

/// An open loader library. Closed on drop.
#[derive(Debug)]
pub struct LoaderLibrary {
    library: Library,
    get_instance_proc_addr: GetInstanceProcAddr,
    path: String,
}

impl LoaderLibrary {
    /// Open the library at `path` (or by file name) and find its resolver.
    ///
    /// # Safety
    ///
    /// Opening a library runs its initializers; `path` must name a genuine
    /// loader whose `xrGetInstanceProcAddr` has the standard signature.
    pub unsafe fn open(path: &str) -> Result<Self, LoaderLibraryError> {
        // SAFETY: initializer safety is the caller's contract.
        let library = unsafe { Library::new(path) }?;
        let get_instance_proc_addr = {
            // SAFETY: the symbol type is the standard resolver signature per
            // the caller's contract.
            let symbol: Symbol<'_, GetInstanceProcAddr> = unsafe { library.get(ENTRY_POINT) }
                .map_err(|source| LoaderLibraryError::MissingEntryPoint {
                    path: path.to_owned(),
                    source,
                })?;
            *symbol
        };

        Ok(Self {
            library,
            get_instance_proc_addr,
            path: path.to_owned(),
        })
    }

    /// Open [`DEFAULT_LOADER_NAME`] through the normal library search path.
    ///
    /// # Safety
    ///
    /// As for [`LoaderLibrary::open`].
    pub unsafe fn open_default() -> Result<Self, LoaderLibraryError> {
        // SAFETY: forwarded caller contract.
        unsafe { Self::open(DEFAULT_LOADER_NAME) }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The raw resolver. Only valid while `self` is open.
    #[must_use]
    pub fn get_instance_proc_addr(&self) -> GetInstanceProcAddr {
        self.get_instance_proc_addr
    }

    /// A lazily populated dispatcher resolving through this library.
    #[must_use]
    pub fn dispatch(&self, instance: sys::Instance) -> LibraryDispatch<'_> {
        // SAFETY: the resolver is the library's own, and the borrow keeps the
        // library open for the dispatcher's lifetime.
        let loader = unsafe { DispatchLoaderDynamic::new(instance, self.get_instance_proc_addr) };
        LibraryDispatch {
            loader,
            _library: PhantomData,
        }
    }

    pub fn close(self) -> Result<(), LoaderLibraryError> {
        Ok(self.library.close()?)
    }
}

/// A [`DispatchLoaderDynamic`] bound to the [`LoaderLibrary`] it resolves
/// through.
#[derive(Debug)]
pub struct LibraryDispatch<'lib> {
    loader: DispatchLoaderDynamic,
    _library: PhantomData<&'lib LoaderLibrary>,
}

impl Deref for LibraryDispatch<'_> {
    type Target = DispatchLoaderDynamic;

    fn deref(&self) -> &DispatchLoaderDynamic {
        &self.loader
    }
}

// SAFETY: forwards to the wrapped loader.
unsafe impl CommandResolver for LibraryDispatch<'_> {
    fn resolve(&self, command: Command) -> Result<VoidFunction, ResultCode> {
        self.loader.resolve(command)
    }
}
