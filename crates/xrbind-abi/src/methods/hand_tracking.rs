//! `XR_EXT_hand_tracking`. These need an [`ExtensionDispatch`]; the static
//! loader does not export extension commands.

use xrbind_core::ResultCode;
use xrbind_core::policy::{ActivePolicy, ResultPolicy, ResultValueType, VoidResult};

use crate::dispatch::ExtensionDispatch;
use crate::handle::{HandTrackerEXT, Session};
use crate::structs::{HandTrackerCreateInfoEXT, StructWrapper};
#[cfg(feature = "smart-handle")]
use crate::unique::{ObjectDestroy, UniqueHandTrackerEXT, create_unique_result_value};

impl Session {
    /// `xrCreateHandTrackerEXT`, writing the new handle into `hand_tracker`.
    ///
    /// # Safety
    ///
    /// `self` is live and created through `d`, whose instance enabled the
    /// extension; `create_info`'s chain is live.
    pub unsafe fn create_hand_tracker_ext_raw<D: ExtensionDispatch + ?Sized>(
        self,
        d: &D,
        create_info: &HandTrackerCreateInfoEXT,
        hand_tracker: &mut HandTrackerEXT,
    ) -> ResultCode {
        // SAFETY: caller contract.
        unsafe { d.create_hand_tracker_ext(self.get(), create_info.get(), hand_tracker.put()) }
    }

    /// # Safety
    ///
    /// As for [`Session::create_hand_tracker_ext_raw`].
    pub unsafe fn create_hand_tracker_ext<D: ExtensionDispatch + ?Sized>(
        self,
        d: &D,
        create_info: &HandTrackerCreateInfoEXT,
    ) -> ResultValueType<HandTrackerEXT> {
        let mut hand_tracker = HandTrackerEXT::NULL;
        // SAFETY: forwarded caller contract.
        let result = unsafe { self.create_hand_tracker_ext_raw(d, create_info, &mut hand_tracker) };
        ActivePolicy::value(result, hand_tracker, "xrbind::Session::create_hand_tracker_ext")
    }

    /// # Safety
    ///
    /// As for [`Session::create_hand_tracker_ext_raw`].
    #[cfg(feature = "smart-handle")]
    pub unsafe fn create_hand_tracker_ext_unique<'d, D: ExtensionDispatch + ?Sized>(
        self,
        d: &'d D,
        create_info: &HandTrackerCreateInfoEXT,
    ) -> ResultValueType<UniqueHandTrackerEXT<'d, D>> {
        let mut hand_tracker = HandTrackerEXT::NULL;
        // SAFETY: forwarded caller contract.
        let result = unsafe { self.create_hand_tracker_ext_raw(d, create_info, &mut hand_tracker) };
        // SAFETY: the tracker was created through `d` and is owned only here.
        let deleter = unsafe { ObjectDestroy::new(d) };
        create_unique_result_value(
            result,
            hand_tracker,
            "xrbind::Session::create_hand_tracker_ext_unique",
            deleter,
        )
    }
}

impl HandTrackerEXT {
    /// `xrDestroyHandTrackerEXT`.
    ///
    /// # Safety
    ///
    /// `self` is live, created through `d`, and not used afterwards.
    pub unsafe fn destroy_raw<D: ExtensionDispatch + ?Sized>(self, d: &D) -> ResultCode {
        // SAFETY: caller contract.
        unsafe { d.destroy_hand_tracker_ext(self.get()) }
    }

    /// # Safety
    ///
    /// As for [`HandTrackerEXT::destroy_raw`].
    pub unsafe fn destroy<D: ExtensionDispatch + ?Sized>(self, d: &D) -> VoidResult {
        // SAFETY: forwarded caller contract.
        let result = unsafe { self.destroy_raw(d) };
        ActivePolicy::void(result, "xrbind::HandTrackerEXT::destroy")
    }
}
