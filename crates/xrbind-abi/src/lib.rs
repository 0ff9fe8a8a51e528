// Projections forward raw pointers to loader entry points; each documents its
// contract once on the `*_raw` form and the rest defer to it.
#![allow(clippy::missing_safety_doc)]
//! # xrbind-abi
//!
//! ABI-transparent C++-style bindings over an OpenXR loader.
//!
//! Handle and struct wrappers here are layout-identical to their raw
//! counterparts in [`sys`], so a wrapper reference can be handed straight to
//! a loader entry point. Calls go through a dispatcher:
//!
//! ```text
//! projection -> Dispatch (static symbols | dynamic table) -> loader -> ResultCode
//!            -> ResultPolicy (Result<T, Error> | ResultValue<T>) -> caller
//! ```
//!
//! The result policy is fixed at build time by the `status-pairs` feature;
//! see [`xrbind_core::policy`].

pub mod sys;
pub mod transparent;

pub mod chain;
pub mod dispatch;
pub mod handle;
pub mod methods;
pub mod structs;
#[cfg(feature = "smart-handle")]
pub mod unique;

pub use dispatch::{
    CommandResolver, DEFAULT_LOADER_NAME, Dispatch, DispatchLoaderDynamic, DispatchTable,
    ExtensionDispatch, LibraryDispatch, LoaderLibrary, LoaderLibraryError, LoaderStats,
    LoaderStatsSnapshot, ReadOnlyDispatch,
};
#[cfg(feature = "static-loader")]
pub use dispatch::DispatchLoaderStatic;
pub use handle::{HandTrackerEXT, Handle, Instance, NullHandle, Session, Space};
pub use structs::{Extends, StructWrapper, TypedStruct};
pub use transparent::Transparent;
#[cfg(feature = "smart-handle")]
pub use unique::{
    Deleter, FnDeleter, ObjectDestroy, UniqueHandTrackerEXT, UniqueHandle, UniqueInstance,
    UniqueSession, UniqueSpace,
};

pub use xrbind_core::{
    BindingConfig, Error, ErrorMode, IntoCodedResult, IntoResult, PopulationMode, ResultCode,
    ResultValue,
};
