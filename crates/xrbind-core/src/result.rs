//! Result codes returned by every command.
//!
//! A result code is a signed 32-bit value: negative means failure, zero is the
//! canonical success, and positive values are informational successes. The
//! set of known codes is closed here, but any other value is carried through
//! unchanged so runtimes newer than this table never lose information.

use std::fmt;

/// Invokes `$callback!` with the closed list of known success codes.
///
/// Each entry is `CONST_NAME = value => "SYMBOL"`.
macro_rules! for_each_success_code {
    ($callback:ident) => {
        $callback! {
            SUCCESS = 0 => "XR_SUCCESS",
            TIMEOUT_EXPIRED = 1 => "XR_TIMEOUT_EXPIRED",
            SESSION_LOSS_PENDING = 3 => "XR_SESSION_LOSS_PENDING",
            EVENT_UNAVAILABLE = 4 => "XR_EVENT_UNAVAILABLE",
            SPACE_BOUNDS_UNAVAILABLE = 7 => "XR_SPACE_BOUNDS_UNAVAILABLE",
            SESSION_NOT_FOCUSED = 8 => "XR_SESSION_NOT_FOCUSED",
            FRAME_DISCARDED = 9 => "XR_FRAME_DISCARDED",
        }
    };
}

/// Invokes `$callback!` with the closed list of known failure codes.
///
/// Each entry is `CONST_NAME = value => "SYMBOL", ErrorVariant`. The variant
/// name is the dedicated [`crate::Error`] variant for that code.
macro_rules! for_each_failure_code {
    ($callback:ident) => {
        $callback! {
            ERROR_VALIDATION_FAILURE = -1 => "XR_ERROR_VALIDATION_FAILURE", ValidationFailure,
            ERROR_RUNTIME_FAILURE = -2 => "XR_ERROR_RUNTIME_FAILURE", RuntimeFailure,
            ERROR_OUT_OF_MEMORY = -3 => "XR_ERROR_OUT_OF_MEMORY", OutOfMemory,
            ERROR_API_VERSION_UNSUPPORTED = -4 => "XR_ERROR_API_VERSION_UNSUPPORTED", ApiVersionUnsupported,
            ERROR_INITIALIZATION_FAILED = -6 => "XR_ERROR_INITIALIZATION_FAILED", InitializationFailed,
            ERROR_FUNCTION_UNSUPPORTED = -7 => "XR_ERROR_FUNCTION_UNSUPPORTED", FunctionUnsupported,
            ERROR_FEATURE_UNSUPPORTED = -8 => "XR_ERROR_FEATURE_UNSUPPORTED", FeatureUnsupported,
            ERROR_EXTENSION_NOT_PRESENT = -9 => "XR_ERROR_EXTENSION_NOT_PRESENT", ExtensionNotPresent,
            ERROR_LIMIT_REACHED = -10 => "XR_ERROR_LIMIT_REACHED", LimitReached,
            ERROR_SIZE_INSUFFICIENT = -11 => "XR_ERROR_SIZE_INSUFFICIENT", SizeInsufficient,
            ERROR_HANDLE_INVALID = -12 => "XR_ERROR_HANDLE_INVALID", HandleInvalid,
            ERROR_INSTANCE_LOST = -13 => "XR_ERROR_INSTANCE_LOST", InstanceLost,
            ERROR_SESSION_RUNNING = -14 => "XR_ERROR_SESSION_RUNNING", SessionRunning,
            ERROR_SESSION_NOT_RUNNING = -16 => "XR_ERROR_SESSION_NOT_RUNNING", SessionNotRunning,
            ERROR_SESSION_LOST = -17 => "XR_ERROR_SESSION_LOST", SessionLost,
            ERROR_SYSTEM_INVALID = -18 => "XR_ERROR_SYSTEM_INVALID", SystemInvalid,
            ERROR_PATH_INVALID = -19 => "XR_ERROR_PATH_INVALID", PathInvalid,
            ERROR_PATH_COUNT_EXCEEDED = -20 => "XR_ERROR_PATH_COUNT_EXCEEDED", PathCountExceeded,
            ERROR_PATH_FORMAT_INVALID = -21 => "XR_ERROR_PATH_FORMAT_INVALID", PathFormatInvalid,
            ERROR_PATH_UNSUPPORTED = -22 => "XR_ERROR_PATH_UNSUPPORTED", PathUnsupported,
            ERROR_LAYER_INVALID = -23 => "XR_ERROR_LAYER_INVALID", LayerInvalid,
            ERROR_LAYER_LIMIT_EXCEEDED = -24 => "XR_ERROR_LAYER_LIMIT_EXCEEDED", LayerLimitExceeded,
            ERROR_SWAPCHAIN_RECT_INVALID = -25 => "XR_ERROR_SWAPCHAIN_RECT_INVALID", SwapchainRectInvalid,
            ERROR_SWAPCHAIN_FORMAT_UNSUPPORTED = -26 => "XR_ERROR_SWAPCHAIN_FORMAT_UNSUPPORTED", SwapchainFormatUnsupported,
            ERROR_ACTION_TYPE_MISMATCH = -27 => "XR_ERROR_ACTION_TYPE_MISMATCH", ActionTypeMismatch,
            ERROR_SESSION_NOT_READY = -28 => "XR_ERROR_SESSION_NOT_READY", SessionNotReady,
            ERROR_SESSION_NOT_STOPPING = -29 => "XR_ERROR_SESSION_NOT_STOPPING", SessionNotStopping,
            ERROR_TIME_INVALID = -30 => "XR_ERROR_TIME_INVALID", TimeInvalid,
            ERROR_REFERENCE_SPACE_UNSUPPORTED = -31 => "XR_ERROR_REFERENCE_SPACE_UNSUPPORTED", ReferenceSpaceUnsupported,
            ERROR_FILE_ACCESS_ERROR = -32 => "XR_ERROR_FILE_ACCESS_ERROR", FileAccessError,
            ERROR_FILE_CONTENTS_INVALID = -33 => "XR_ERROR_FILE_CONTENTS_INVALID", FileContentsInvalid,
            ERROR_FORM_FACTOR_UNSUPPORTED = -34 => "XR_ERROR_FORM_FACTOR_UNSUPPORTED", FormFactorUnsupported,
            ERROR_FORM_FACTOR_UNAVAILABLE = -35 => "XR_ERROR_FORM_FACTOR_UNAVAILABLE", FormFactorUnavailable,
            ERROR_API_LAYER_NOT_PRESENT = -36 => "XR_ERROR_API_LAYER_NOT_PRESENT", ApiLayerNotPresent,
            ERROR_CALL_ORDER_INVALID = -37 => "XR_ERROR_CALL_ORDER_INVALID", CallOrderInvalid,
            ERROR_GRAPHICS_DEVICE_INVALID = -38 => "XR_ERROR_GRAPHICS_DEVICE_INVALID", GraphicsDeviceInvalid,
            ERROR_POSE_INVALID = -39 => "XR_ERROR_POSE_INVALID", PoseInvalid,
            ERROR_INDEX_OUT_OF_RANGE = -40 => "XR_ERROR_INDEX_OUT_OF_RANGE", IndexOutOfRange,
            ERROR_VIEW_CONFIGURATION_TYPE_UNSUPPORTED = -41 => "XR_ERROR_VIEW_CONFIGURATION_TYPE_UNSUPPORTED", ViewConfigurationTypeUnsupported,
            ERROR_ENVIRONMENT_BLEND_MODE_UNSUPPORTED = -42 => "XR_ERROR_ENVIRONMENT_BLEND_MODE_UNSUPPORTED", EnvironmentBlendModeUnsupported,
            ERROR_NAME_DUPLICATED = -44 => "XR_ERROR_NAME_DUPLICATED", NameDuplicated,
            ERROR_NAME_INVALID = -45 => "XR_ERROR_NAME_INVALID", NameInvalid,
            ERROR_ACTIONSET_NOT_ATTACHED = -46 => "XR_ERROR_ACTIONSET_NOT_ATTACHED", ActionsetNotAttached,
            ERROR_ACTIONSETS_ALREADY_ATTACHED = -47 => "XR_ERROR_ACTIONSETS_ALREADY_ATTACHED", ActionsetsAlreadyAttached,
            ERROR_LOCALIZED_NAME_DUPLICATED = -48 => "XR_ERROR_LOCALIZED_NAME_DUPLICATED", LocalizedNameDuplicated,
            ERROR_LOCALIZED_NAME_INVALID = -49 => "XR_ERROR_LOCALIZED_NAME_INVALID", LocalizedNameInvalid,
            ERROR_GRAPHICS_REQUIREMENTS_CALL_MISSING = -50 => "XR_ERROR_GRAPHICS_REQUIREMENTS_CALL_MISSING", GraphicsRequirementsCallMissing,
            ERROR_RUNTIME_UNAVAILABLE = -51 => "XR_ERROR_RUNTIME_UNAVAILABLE", RuntimeUnavailable,
        }
    };
}

pub(crate) use for_each_failure_code;

/// Signed status value returned by a command.
///
/// ABI-identical to the raw 32-bit result type, so raw function-pointer
/// signatures use it directly. Ordering is plain integer ordering.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ResultCode(i32);

macro_rules! define_success_consts {
    ($( $name:ident = $value:literal => $symbol:literal, )*) => {
        impl ResultCode {
            $(
                #[doc = concat!("`", $symbol, "`")]
                pub const $name: Self = Self($value);
            )*
        }

        const SUCCESS_NAMES: &[(ResultCode, &str)] = &[$((ResultCode::$name, $symbol),)*];
    };
}

macro_rules! define_failure_consts {
    ($( $name:ident = $value:literal => $symbol:literal, $variant:ident, )*) => {
        impl ResultCode {
            $(
                #[doc = concat!("`", $symbol, "`")]
                pub const $name: Self = Self($value);
            )*
        }

        const FAILURE_NAMES: &[(ResultCode, &str)] = &[$((ResultCode::$name, $symbol),)*];
    };
}

for_each_success_code!(define_success_consts);
for_each_failure_code!(define_failure_consts);

impl ResultCode {
    /// Wrap a raw status value.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// The raw status value.
    #[must_use]
    pub const fn into_raw(self) -> i32 {
        self.0
    }

    /// `true` for every negative code.
    #[must_use]
    pub const fn failed(self) -> bool {
        self.0 < 0
    }

    /// `true` for zero and every positive (informational) code.
    #[must_use]
    pub const fn succeeded(self) -> bool {
        self.0 >= 0
    }

    /// `true` only for the canonical [`ResultCode::SUCCESS`].
    #[must_use]
    pub const fn is_exact_success(self) -> bool {
        self.0 == Self::SUCCESS.0
    }

    /// Symbolic name for a known code.
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        let table = if self.failed() {
            FAILURE_NAMES
        } else {
            SUCCESS_NAMES
        };
        table
            .iter()
            .find(|(code, _)| *code == self)
            .map(|(_, name)| *name)
    }

    /// `true` if this code is in the closed table of known codes.
    #[must_use]
    pub fn is_known(self) -> bool {
        self.name().is_some()
    }
}

/// Free-function form of [`ResultCode::failed`].
#[must_use]
pub const fn failed(code: ResultCode) -> bool {
    code.failed()
}

/// Free-function form of [`ResultCode::succeeded`].
#[must_use]
pub const fn succeeded(code: ResultCode) -> bool {
    code.succeeded()
}

/// Free-function form of [`ResultCode::is_exact_success`].
#[must_use]
pub const fn is_exact_success(code: ResultCode) -> bool {
    code.is_exact_success()
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None if self.failed() => write!(f, "XR_UNKNOWN_FAILURE_{}", self.0),
            None => write!(f, "XR_UNKNOWN_SUCCESS_{}", self.0),
        }
    }
}

impl fmt::Debug for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResultCode({self}, {})", self.0)
    }
}

impl From<ResultCode> for i32 {
    fn from(code: ResultCode) -> Self {
        code.0
    }
}

impl From<i32> for ResultCode {
    fn from(raw: i32) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_follows_sign() {
        assert!(ResultCode::SUCCESS.succeeded());
        assert!(ResultCode::SUCCESS.is_exact_success());
        assert!(!ResultCode::SUCCESS.failed());

        assert!(ResultCode::SESSION_LOSS_PENDING.succeeded());
        assert!(!ResultCode::SESSION_LOSS_PENDING.is_exact_success());

        assert!(ResultCode::ERROR_HANDLE_INVALID.failed());
        assert!(!ResultCode::ERROR_HANDLE_INVALID.succeeded());

        let unknown_failure = ResultCode::from_raw(-1_000_000);
        assert!(failed(unknown_failure));
        assert!(!succeeded(unknown_failure));
        assert!(!is_exact_success(unknown_failure));
    }

    #[test]
    fn total_order_is_integer_order() {
        let mut codes = vec![
            ResultCode::FRAME_DISCARDED,
            ResultCode::ERROR_RUNTIME_UNAVAILABLE,
            ResultCode::SUCCESS,
            ResultCode::ERROR_VALIDATION_FAILURE,
        ];
        codes.sort();
        let raw: Vec<i32> = codes.into_iter().map(i32::from).collect();
        assert_eq!(raw, vec![-51, -1, 0, 9]);
    }

    #[test]
    fn names_cover_known_codes() {
        assert_eq!(ResultCode::SUCCESS.name(), Some("XR_SUCCESS"));
        assert_eq!(
            ResultCode::ERROR_SIZE_INSUFFICIENT.name(),
            Some("XR_ERROR_SIZE_INSUFFICIENT")
        );
        assert!(ResultCode::TIMEOUT_EXPIRED.is_known());
        assert!(!ResultCode::from_raw(-5).is_known());
    }

    #[test]
    fn unknown_codes_display_with_sign_class() {
        assert_eq!(
            ResultCode::from_raw(-5).to_string(),
            "XR_UNKNOWN_FAILURE_-5"
        );
        assert_eq!(ResultCode::from_raw(42).to_string(), "XR_UNKNOWN_SUCCESS_42");
        assert_eq!(ResultCode::SESSION_NOT_FOCUSED.to_string(), "XR_SESSION_NOT_FOCUSED");
    }

    #[test]
    fn raw_round_trip_preserves_unknown_values() {
        let code = ResultCode::from(-9999);
        assert_eq!(code.into_raw(), -9999);
        assert_eq!(i32::from(code), -9999);
    }
}
