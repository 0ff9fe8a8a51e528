//! Error taxonomy for failed commands.
//!
//! Every failed command surfaces as an [`Error`]. Each known failure code has
//! a dedicated variant; anything else falls back to [`Error::System`]. All
//! variants carry a [`SystemError`] so the numeric code and context message
//! are always recoverable.

use std::borrow::Cow;
use std::fmt;

use crate::result::{ResultCode, for_each_failure_code};

/// Names the result-code error domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ErrorCategory;

impl ErrorCategory {
    /// Stable category name.
    pub const NAME: &'static str = "xrbind::Result";

    #[must_use]
    pub const fn name(&self) -> &'static str {
        Self::NAME
    }

    /// Human-readable text for a code in this category.
    #[must_use]
    pub fn message(&self, code: ResultCode) -> String {
        code.to_string()
    }
}

/// A failed result code plus the context message of the call that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemError {
    code: ResultCode,
    message: Cow<'static, str>,
}

impl SystemError {
    #[must_use]
    pub fn new(code: ResultCode, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn code(&self) -> ResultCode {
        self.code
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        ErrorCategory
    }
}

impl fmt::Display for SystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{}: {}", self.message, self.code)
        }
    }
}

impl std::error::Error for SystemError {}

macro_rules! define_error {
    ($( $name:ident = $value:literal => $symbol:literal, $variant:ident, )*) => {
        /// A failed command.
        ///
        /// One variant per known failure code; [`Error::System`] covers codes
        /// outside the known table.
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        #[non_exhaustive]
        pub enum Error {
            $(
                #[doc = concat!("`", $symbol, "`")]
                #[error(transparent)]
                $variant(SystemError),
            )*
            /// A failure code with no dedicated variant.
            #[error(transparent)]
            System(SystemError),
        }

        impl Error {
            /// Map a failure code to its variant.
            ///
            /// Known codes map to their dedicated variant; every other code,
            /// including non-negative ones, maps to [`Error::System`].
            #[must_use]
            pub fn from_result(code: ResultCode, message: impl Into<Cow<'static, str>>) -> Self {
                let inner = SystemError::new(code, message);
                match code.into_raw() {
                    $( $value => Self::$variant(inner), )*
                    _ => Self::System(inner),
                }
            }

            /// The wrapped [`SystemError`].
            #[must_use]
            pub const fn system(&self) -> &SystemError {
                match self {
                    $( Self::$variant(inner) )|* | Self::System(inner) => inner,
                }
            }
        }
    };
}

for_each_failure_code!(define_error);

impl Error {
    /// The numeric result code.
    #[must_use]
    pub const fn code(&self) -> ResultCode {
        self.system().code()
    }

    /// Context message supplied at the call site.
    #[must_use]
    pub fn message(&self) -> &str {
        self.system().message()
    }

    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        ErrorCategory
    }

    /// `true` when the code had no dedicated variant.
    #[must_use]
    pub const fn is_generic(&self) -> bool {
        matches!(self, Self::System(_))
    }
}

impl From<SystemError> for Error {
    fn from(inner: SystemError) -> Self {
        let SystemError { code, message } = inner;
        Self::from_result(code, message)
    }
}

impl From<Error> for SystemError {
    fn from(err: Error) -> Self {
        err.system().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_code_maps_to_dedicated_variant() {
        let err = Error::from_result(ResultCode::ERROR_HANDLE_INVALID, "xrbind::Session::begin");
        assert!(matches!(err, Error::HandleInvalid(_)));
        assert_eq!(err.code(), ResultCode::ERROR_HANDLE_INVALID);
        assert_eq!(err.message(), "xrbind::Session::begin");
        assert!(!err.is_generic());
    }

    #[test]
    fn unknown_code_maps_to_generic_variant() {
        let err = Error::from_result(ResultCode::from_raw(-5), "ctx");
        assert!(err.is_generic());
        assert_eq!(err.code().into_raw(), -5);
    }

    #[test]
    fn display_is_message_then_name() {
        let err = Error::from_result(ResultCode::ERROR_TIME_INVALID, "xrbind::Space::locate");
        assert_eq!(err.to_string(), "xrbind::Space::locate: XR_ERROR_TIME_INVALID");

        let bare = SystemError::new(ResultCode::ERROR_RUNTIME_FAILURE, "");
        assert_eq!(bare.to_string(), "XR_ERROR_RUNTIME_FAILURE");
    }

    #[test]
    fn category_is_stable() {
        let err = Error::from_result(ResultCode::ERROR_OUT_OF_MEMORY, "alloc");
        assert_eq!(err.category().name(), "xrbind::Result");
        assert_eq!(
            ErrorCategory.message(ResultCode::ERROR_OUT_OF_MEMORY),
            "XR_ERROR_OUT_OF_MEMORY"
        );
    }

    #[test]
    fn system_error_converts_back_to_variant() {
        let inner = SystemError::new(ResultCode::ERROR_SIZE_INSUFFICIENT, "two-call");
        let err: Error = inner.clone().into();
        assert!(matches!(err, Error::SizeInsufficient(_)));
        assert_eq!(SystemError::from(err), inner);
    }
}
