use xrbind_core::ResultCode;
use xrbind_core::policy::{ActivePolicy, CodedResult, ResultPolicy, ResultValueType, VoidResult};

use super::SESSION_SUCCESS_CODES;
use crate::dispatch::Dispatch;
use crate::handle::{Session, Space};
use crate::structs::{ReferenceSpaceCreateInfo, SessionBeginInfo, StructWrapper};
use crate::sys::ReferenceSpaceType;
#[cfg(feature = "smart-handle")]
use crate::unique::{ObjectDestroy, UniqueSpace, create_unique_result_value};

impl Session {
    /// `xrDestroySession`.
    ///
    /// # Safety
    ///
    /// `self` is live, created through `d`, and not used afterwards.
    pub unsafe fn destroy_raw<D: Dispatch + ?Sized>(self, d: &D) -> ResultCode {
        // SAFETY: caller contract.
        unsafe { d.destroy_session(self.get()) }
    }

    /// # Safety
    ///
    /// As for [`Session::destroy_raw`].
    pub unsafe fn destroy<D: Dispatch + ?Sized>(self, d: &D) -> VoidResult {
        // SAFETY: forwarded caller contract.
        let result = unsafe { self.destroy_raw(d) };
        ActivePolicy::void(result, "xrbind::Session::destroy")
    }

    /// `xrBeginSession`.
    ///
    /// # Safety
    ///
    /// `self` is live and created through `d`; `begin_info`'s chain is live.
    pub unsafe fn begin_raw<D: Dispatch + ?Sized>(
        self,
        d: &D,
        begin_info: &SessionBeginInfo,
    ) -> ResultCode {
        // SAFETY: caller contract.
        unsafe { d.begin_session(self.get(), begin_info.get()) }
    }

    /// Accepts `SUCCESS` and `SESSION_LOSS_PENDING`, returning which.
    ///
    /// # Safety
    ///
    /// As for [`Session::begin_raw`].
    pub unsafe fn begin<D: Dispatch + ?Sized>(
        self,
        d: &D,
        begin_info: &SessionBeginInfo,
    ) -> CodedResult {
        // SAFETY: forwarded caller contract.
        let result = unsafe { self.begin_raw(d, begin_info) };
        ActivePolicy::void_with(result, "xrbind::Session::begin", SESSION_SUCCESS_CODES)
    }

    /// `xrEndSession`.
    ///
    /// # Safety
    ///
    /// `self` is live and created through `d`.
    pub unsafe fn end_raw<D: Dispatch + ?Sized>(self, d: &D) -> ResultCode {
        // SAFETY: caller contract.
        unsafe { d.end_session(self.get()) }
    }

    /// # Safety
    ///
    /// As for [`Session::end_raw`].
    pub unsafe fn end<D: Dispatch + ?Sized>(self, d: &D) -> CodedResult {
        // SAFETY: forwarded caller contract.
        let result = unsafe { self.end_raw(d) };
        ActivePolicy::void_with(result, "xrbind::Session::end", SESSION_SUCCESS_CODES)
    }

    /// `xrRequestExitSession`.
    ///
    /// # Safety
    ///
    /// `self` is live and created through `d`.
    pub unsafe fn request_exit_raw<D: Dispatch + ?Sized>(self, d: &D) -> ResultCode {
        // SAFETY: caller contract.
        unsafe { d.request_exit_session(self.get()) }
    }

    /// # Safety
    ///
    /// As for [`Session::request_exit_raw`].
    pub unsafe fn request_exit<D: Dispatch + ?Sized>(self, d: &D) -> CodedResult {
        // SAFETY: forwarded caller contract.
        let result = unsafe { self.request_exit_raw(d) };
        ActivePolicy::void_with(result, "xrbind::Session::request_exit", SESSION_SUCCESS_CODES)
    }

    /// One `xrEnumerateReferenceSpaces` call. An empty `spaces` queries the
    /// count only.
    ///
    /// # Safety
    ///
    /// `self` is live and created through `d`.
    pub unsafe fn enumerate_reference_spaces_raw<D: Dispatch + ?Sized>(
        self,
        d: &D,
        count: &mut u32,
        spaces: &mut [ReferenceSpaceType],
    ) -> ResultCode {
        let capacity = u32::try_from(spaces.len()).unwrap_or(u32::MAX);
        let ptr = if spaces.is_empty() {
            std::ptr::null_mut()
        } else {
            spaces.as_mut_ptr()
        };
        // SAFETY: caller contract; `ptr` is null or holds `capacity` slots.
        unsafe { d.enumerate_reference_spaces(self.get(), capacity, count, ptr) }
    }

    /// Every reference space type the session supports.
    ///
    /// Queries the count, then fills; retries while the runtime reports
    /// `ERROR_SIZE_INSUFFICIENT` because the set grew in between.
    ///
    /// # Safety
    ///
    /// As for [`Session::enumerate_reference_spaces_raw`].
    pub unsafe fn enumerate_reference_spaces<D: Dispatch + ?Sized>(
        self,
        d: &D,
    ) -> ResultValueType<Vec<ReferenceSpaceType>> {
        let mut spaces = Vec::new();
        let mut count = 0u32;
        let result = loop {
            // SAFETY: forwarded caller contract.
            let result = unsafe { self.enumerate_reference_spaces_raw(d, &mut count, &mut []) };
            if result != ResultCode::SUCCESS || count == 0 {
                break result;
            }
            spaces.resize(count as usize, ReferenceSpaceType::default());
            // SAFETY: forwarded caller contract.
            let result = unsafe { self.enumerate_reference_spaces_raw(d, &mut count, &mut spaces) };
            if result != ResultCode::ERROR_SIZE_INSUFFICIENT {
                break result;
            }
        };
        spaces.truncate(count as usize);
        ActivePolicy::value(result, spaces, "xrbind::Session::enumerate_reference_spaces")
    }

    /// `xrCreateReferenceSpace`, writing the new handle into `space`.
    ///
    /// # Safety
    ///
    /// `self` is live and created through `d`; `create_info`'s chain is live.
    pub unsafe fn create_reference_space_raw<D: Dispatch + ?Sized>(
        self,
        d: &D,
        create_info: &ReferenceSpaceCreateInfo,
        space: &mut Space,
    ) -> ResultCode {
        // SAFETY: caller contract.
        unsafe { d.create_reference_space(self.get(), create_info.get(), space.put()) }
    }

    /// # Safety
    ///
    /// As for [`Session::create_reference_space_raw`].
    pub unsafe fn create_reference_space<D: Dispatch + ?Sized>(
        self,
        d: &D,
        create_info: &ReferenceSpaceCreateInfo,
    ) -> ResultValueType<Space> {
        let mut space = Space::NULL;
        // SAFETY: forwarded caller contract.
        let result = unsafe { self.create_reference_space_raw(d, create_info, &mut space) };
        ActivePolicy::value(result, space, "xrbind::Session::create_reference_space")
    }

    /// # Safety
    ///
    /// As for [`Session::create_reference_space_raw`].
    #[cfg(feature = "smart-handle")]
    pub unsafe fn create_reference_space_unique<'d, D: Dispatch + ?Sized>(
        self,
        d: &'d D,
        create_info: &ReferenceSpaceCreateInfo,
    ) -> ResultValueType<UniqueSpace<'d, D>> {
        let mut space = Space::NULL;
        // SAFETY: forwarded caller contract.
        let result = unsafe { self.create_reference_space_raw(d, create_info, &mut space) };
        // SAFETY: the space was created through `d` and is owned only here.
        let deleter = unsafe { ObjectDestroy::new(d) };
        create_unique_result_value(
            result,
            space,
            "xrbind::Session::create_reference_space_unique",
            deleter,
        )
    }
}
