//! # xrbind-core
//!
//! Safe foundations of the xrbind binding layer.
//!
//! Nothing in this crate touches the C ABI. It owns the pieces every wrapper
//! depends on but that can be expressed without `unsafe`:
//!
//! - [`ResultCode`] and its success/failure classification.
//! - The closed error taxonomy ([`Error`], [`SystemError`], [`ErrorCategory`]).
//! - The two result-propagation modes ([`policy::Throwing`] and
//!   [`policy::StatusPair`]), selected once per build.
//! - Build configuration ([`config::BindingConfig`]).
//! - Typesafe bitmasks ([`flags`]), fixed-capacity string members
//!   ([`fixed_string`]) and the command descriptor table ([`command`]).

#![deny(unsafe_code)]

pub mod command;
pub mod config;
pub mod error;
pub mod fixed_string;
pub mod flags;
pub mod policy;
pub mod result;

pub use command::{Command, CommandInfo, CommandKind, Feature, HandleKind};
pub use config::{BindingConfig, ErrorMode, PopulationMode};
pub use error::{Error, ErrorCategory, SystemError};
pub use policy::{
    ActivePolicy, CodedResult, CodedValue, IntoCodedResult, IntoResult, ResultPolicy, ResultValue,
    ResultValueType, VoidResult,
};
pub use result::{ResultCode, failed, is_exact_success, succeeded};
