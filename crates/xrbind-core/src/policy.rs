//! Result propagation policies.
//!
//! Every wrapper hands its raw result code to the build's [`ActivePolicy`].
//! Two policies exist:
//!
//! - [`Throwing`] (default): a code outside the accepted set becomes an
//!   [`Error`] returned through `Err`.
//! - [`StatusPair`] (feature `status-pairs`): the code is always returned to
//!   the caller, paired with the value. A code outside the accepted set trips
//!   a `debug_assert!` carrying the call's context message.
//!
//! The accepted set defaults to `{SUCCESS}`; calls that expect informational
//! successes pass an explicit set.

use crate::error::Error;
use crate::result::ResultCode;

/// A result code paired with a value.
///
/// Returned by status-pair mode and by calls that expose several success
/// codes in exception mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResultValue<T> {
    pub result: ResultCode,
    pub value: T,
}

impl<T> ResultValue<T> {
    #[must_use]
    pub const fn new(result: ResultCode, value: T) -> Self {
        Self { result, value }
    }

    #[must_use]
    pub fn into_tuple(self) -> (ResultCode, T) {
        (self.result, self.value)
    }

    /// Transform the value, keeping the code.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResultValue<U> {
        ResultValue {
            result: self.result,
            value: f(self.value),
        }
    }
}

impl<T> From<ResultValue<T>> for (ResultCode, T) {
    fn from(rv: ResultValue<T>) -> Self {
        rv.into_tuple()
    }
}

/// Only the canonical success is accepted when no explicit set is given.
pub const DEFAULT_SUCCESS_CODES: &[ResultCode] = &[ResultCode::SUCCESS];

/// How a raw result code becomes the value a wrapper returns.
pub trait ResultPolicy {
    /// Return type of a value-producing call with the default success set.
    type Value<T>;
    /// Return type of a call that produces no value.
    type Void;
    /// Return type of a value-producing call with an explicit success set.
    type Coded<T>;
    /// Return type of a no-value call with an explicit success set.
    type CodedVoid;

    /// Propagate a bare result.
    fn void(result: ResultCode, message: &'static str) -> Self::Void;

    /// Propagate a result paired with an already-built value.
    fn value<T>(result: ResultCode, value: T, message: &'static str) -> Self::Value<T> {
        Self::value_map(result, value, message, |v| v)
    }

    /// Propagate a result, building the returned value from the raw output.
    ///
    /// `build` runs only when the value will be observed by the caller.
    fn value_map<R, T>(
        result: ResultCode,
        raw: R,
        message: &'static str,
        build: impl FnOnce(R) -> T,
    ) -> Self::Value<T>;

    /// Propagate a bare result accepted if it is in `success_codes`.
    fn void_with(
        result: ResultCode,
        message: &'static str,
        success_codes: &[ResultCode],
    ) -> Self::CodedVoid;

    /// Propagate a result and value accepted if the code is in `success_codes`.
    fn value_with<T>(
        result: ResultCode,
        value: T,
        message: &'static str,
        success_codes: &[ResultCode],
    ) -> Self::Coded<T> {
        Self::value_with_map(result, value, message, success_codes, |v| v)
    }

    fn value_with_map<R, T>(
        result: ResultCode,
        raw: R,
        message: &'static str,
        success_codes: &[ResultCode],
        build: impl FnOnce(R) -> T,
    ) -> Self::Coded<T>;
}

/// Exception mode: failures are returned as `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Throwing;

impl ResultPolicy for Throwing {
    type Value<T> = Result<T, Error>;
    type Void = Result<(), Error>;
    type Coded<T> = Result<ResultValue<T>, Error>;
    type CodedVoid = Result<ResultCode, Error>;

    fn void(result: ResultCode, message: &'static str) -> Self::Void {
        check(result, message, DEFAULT_SUCCESS_CODES)
    }

    fn value_map<R, T>(
        result: ResultCode,
        raw: R,
        message: &'static str,
        build: impl FnOnce(R) -> T,
    ) -> Self::Value<T> {
        check(result, message, DEFAULT_SUCCESS_CODES)?;
        Ok(build(raw))
    }

    fn void_with(
        result: ResultCode,
        message: &'static str,
        success_codes: &[ResultCode],
    ) -> Self::CodedVoid {
        check(result, message, success_codes)?;
        Ok(result)
    }

    fn value_with_map<R, T>(
        result: ResultCode,
        raw: R,
        message: &'static str,
        success_codes: &[ResultCode],
        build: impl FnOnce(R) -> T,
    ) -> Self::Coded<T> {
        check(result, message, success_codes)?;
        Ok(ResultValue::new(result, build(raw)))
    }
}

fn check(result: ResultCode, message: &'static str, accepted: &[ResultCode]) -> Result<(), Error> {
    if accepted.contains(&result) {
        Ok(())
    } else {
        Err(Error::from_result(result, message))
    }
}

/// Status-pair mode: the code always reaches the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusPair;

impl ResultPolicy for StatusPair {
    type Value<T> = ResultValue<T>;
    type Void = ResultCode;
    type Coded<T> = ResultValue<T>;
    type CodedVoid = ResultCode;

    fn void(result: ResultCode, message: &'static str) -> Self::Void {
        assert_accepted(result, message, DEFAULT_SUCCESS_CODES);
        result
    }

    fn value_map<R, T>(
        result: ResultCode,
        raw: R,
        message: &'static str,
        build: impl FnOnce(R) -> T,
    ) -> Self::Value<T> {
        assert_accepted(result, message, DEFAULT_SUCCESS_CODES);
        ResultValue::new(result, build(raw))
    }

    fn void_with(
        result: ResultCode,
        message: &'static str,
        success_codes: &[ResultCode],
    ) -> Self::CodedVoid {
        assert_accepted(result, message, success_codes);
        result
    }

    fn value_with_map<R, T>(
        result: ResultCode,
        raw: R,
        message: &'static str,
        success_codes: &[ResultCode],
        build: impl FnOnce(R) -> T,
    ) -> Self::Coded<T> {
        assert_accepted(result, message, success_codes);
        ResultValue::new(result, build(raw))
    }
}

#[inline]
fn assert_accepted(result: ResultCode, message: &'static str, accepted: &[ResultCode]) {
    debug_assert!(accepted.contains(&result), "{message}: {result}");
}

/// The policy selected for this build.
#[cfg(not(feature = "status-pairs"))]
pub type ActivePolicy = Throwing;

/// The policy selected for this build.
#[cfg(feature = "status-pairs")]
pub type ActivePolicy = StatusPair;

/// Return type of a value-producing wrapper under the active policy.
pub type ResultValueType<T> = <ActivePolicy as ResultPolicy>::Value<T>;
/// Return type of a no-value wrapper under the active policy.
pub type VoidResult = <ActivePolicy as ResultPolicy>::Void;
/// Return type of a value-producing wrapper that exposes several success codes.
pub type CodedValue<T> = <ActivePolicy as ResultPolicy>::Coded<T>;
/// Return type of a no-value wrapper that exposes several success codes.
pub type CodedResult = <ActivePolicy as ResultPolicy>::CodedVoid;

/// Propagate a bare result under the active policy.
pub fn create_result(result: ResultCode, message: &'static str) -> VoidResult {
    ActivePolicy::void(result, message)
}

/// Propagate a result and value under the active policy.
pub fn create_result_value<T>(
    result: ResultCode,
    value: T,
    message: &'static str,
) -> ResultValueType<T> {
    ActivePolicy::value(result, value, message)
}

/// Propagate a result and value, accepting any code in `success_codes`.
pub fn create_result_value_with<T>(
    result: ResultCode,
    value: T,
    message: &'static str,
    success_codes: &[ResultCode],
) -> CodedValue<T> {
    ActivePolicy::value_with(result, value, message, success_codes)
}

/// Propagate a bare result, accepting any code in `success_codes`.
pub fn create_result_with(
    result: ResultCode,
    message: &'static str,
    success_codes: &[ResultCode],
) -> CodedResult {
    ActivePolicy::void_with(result, message, success_codes)
}

/// Collapse any wrapper return value into a `Result`.
///
/// Lets code that must run under either policy handle outcomes uniformly.
/// A status-pair [`ResultValue`] carries no accepted-code list, so it is
/// judged by sign alone: negative codes turn into `Err` and informational
/// successes stay `Ok`. Wrappers that accept failure codes return
/// [`CodedValue`]; collapse those with [`IntoCodedResult`] instead.
pub trait IntoResult {
    type Output;

    fn into_result(self) -> Result<Self::Output, Error>;
}

impl<T> IntoResult for Result<T, Error> {
    type Output = T;

    fn into_result(self) -> Result<T, Error> {
        self
    }
}

impl<T> IntoResult for ResultValue<T> {
    type Output = T;

    fn into_result(self) -> Result<T, Error> {
        if self.result.succeeded() {
            Ok(self.value)
        } else {
            Err(Error::from_result(self.result, ""))
        }
    }
}

impl IntoResult for ResultCode {
    type Output = ResultCode;

    fn into_result(self) -> Result<ResultCode, Error> {
        if self.succeeded() {
            Ok(self)
        } else {
            Err(Error::from_result(self, ""))
        }
    }
}

/// [`IntoResult`] for wrappers that accept several success codes, keeping the
/// accepted code next to the value under either policy.
///
/// The wrapper already checked the code against its accepted list, so a
/// status-pair [`ResultValue`] is always `Ok`, matching what the throwing
/// policy returns for the same call.
pub trait IntoCodedResult {
    type Output;

    fn into_coded_result(self) -> Result<ResultValue<Self::Output>, Error>;
}

impl<T> IntoCodedResult for Result<ResultValue<T>, Error> {
    type Output = T;

    fn into_coded_result(self) -> Result<ResultValue<T>, Error> {
        self
    }
}

impl<T> IntoCodedResult for ResultValue<T> {
    type Output = T;

    fn into_coded_result(self) -> Result<ResultValue<T>, Error> {
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SESSION_CODES: &[ResultCode] = &[ResultCode::SUCCESS, ResultCode::SESSION_LOSS_PENDING];

    #[test]
    fn throwing_accepts_only_canonical_success_by_default() {
        assert_eq!(Throwing::value(ResultCode::SUCCESS, 7, "ctx"), Ok(7));

        let err = Throwing::void(ResultCode::ERROR_SESSION_LOST, "ctx").unwrap_err();
        assert!(matches!(err, Error::SessionLost(_)));

        let err = Throwing::value(ResultCode::TIMEOUT_EXPIRED, 1, "ctx").unwrap_err();
        assert_eq!(err.code(), ResultCode::TIMEOUT_EXPIRED);
        assert!(err.is_generic());
    }

    #[test]
    fn throwing_with_set_returns_code_alongside_value() {
        let rv = Throwing::value_with(ResultCode::SESSION_LOSS_PENDING, "x", "ctx", SESSION_CODES)
            .unwrap();
        assert_eq!(rv.result, ResultCode::SESSION_LOSS_PENDING);
        assert_eq!(rv.value, "x");

        assert_eq!(
            Throwing::void_with(ResultCode::SUCCESS, "ctx", SESSION_CODES),
            Ok(ResultCode::SUCCESS)
        );
        assert!(Throwing::void_with(ResultCode::FRAME_DISCARDED, "ctx", SESSION_CODES).is_err());
    }

    #[test]
    fn throwing_builder_skipped_on_failure() {
        let mut built = false;
        let res = Throwing::value_map(ResultCode::ERROR_RUNTIME_FAILURE, 3, "ctx", |v| {
            built = true;
            v * 2
        });
        assert!(res.is_err());
        assert!(!built);
    }

    #[test]
    fn status_pair_returns_code_and_value() {
        let rv = StatusPair::value(ResultCode::SUCCESS, 5u32, "ctx");
        assert_eq!(rv.into_tuple(), (ResultCode::SUCCESS, 5));
        assert_eq!(StatusPair::void(ResultCode::SUCCESS, "ctx"), ResultCode::SUCCESS);

        let rv = StatusPair::value_with(ResultCode::SESSION_LOSS_PENDING, 1, "ctx", SESSION_CODES);
        assert_eq!(rv.result, ResultCode::SESSION_LOSS_PENDING);
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "xrbind::Instance::get_system"))]
    fn status_pair_asserts_on_unaccepted_code() {
        let rv = StatusPair::value(ResultCode::ERROR_FORM_FACTOR_UNSUPPORTED, 0u64, "xrbind::Instance::get_system");
        // Only reached in release builds, where the code is simply returned.
        assert_eq!(rv.result, ResultCode::ERROR_FORM_FACTOR_UNSUPPORTED);
    }

    #[test]
    fn into_result_collapses_both_modes() {
        let ok: Result<u8, Error> = Ok(1);
        assert_eq!(ok.into_result(), Ok(1));

        let pair = ResultValue::new(ResultCode::SESSION_LOSS_PENDING, 2u8);
        assert_eq!(pair.into_result(), Ok(2));

        let failed = ResultValue::new(ResultCode::ERROR_HANDLE_INVALID, 0u8);
        assert!(matches!(failed.into_result(), Err(Error::HandleInvalid(_))));

        assert!(ResultCode::ERROR_VALIDATION_FAILURE.into_result().is_err());
        assert_eq!(ResultCode::SUCCESS.into_result(), Ok(ResultCode::SUCCESS));
    }

    #[test]
    fn into_coded_result_keeps_accepted_code() {
        let pair = ResultValue::new(ResultCode::SESSION_LOSS_PENDING, 3u8);
        let rv = pair.into_coded_result().unwrap();
        assert_eq!(rv.into_tuple(), (ResultCode::SESSION_LOSS_PENDING, 3));

        let thrown: Result<ResultValue<u8>, Error> =
            Err(Error::from_result(ResultCode::ERROR_TIME_INVALID, "ctx"));
        assert_eq!(
            thrown.into_coded_result().unwrap_err().code(),
            ResultCode::ERROR_TIME_INVALID
        );

    }

    #[test]
    fn accepted_failure_code_is_ok_under_both_policies() {
        let accepted = [ResultCode::SUCCESS, ResultCode::ERROR_TIME_INVALID];
        let thrown = Throwing::value_with(ResultCode::ERROR_TIME_INVALID, 4u8, "ctx", &accepted)
            .into_coded_result()
            .unwrap();
        let pair = StatusPair::value_with(ResultCode::ERROR_TIME_INVALID, 4u8, "ctx", &accepted)
            .into_coded_result()
            .unwrap();
        assert_eq!(thrown, pair);
        assert_eq!(pair.result, ResultCode::ERROR_TIME_INVALID);

        // A bare pair has no accepted list to consult.
        let pair = ResultValue::new(ResultCode::ERROR_TIME_INVALID, 4u8);
        assert!(matches!(pair.into_result(), Err(Error::TimeInvalid(_))));
    }
}
