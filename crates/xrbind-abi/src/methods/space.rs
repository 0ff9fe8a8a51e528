use xrbind_core::ResultCode;
use xrbind_core::policy::{ActivePolicy, CodedValue, ResultPolicy, VoidResult};

use super::SESSION_SUCCESS_CODES;
use crate::dispatch::Dispatch;
use crate::handle::Space;
use crate::structs::{SpaceLocation, StructWrapper};
use crate::sys::Time;

impl Space {
    /// `xrDestroySpace`.
    ///
    /// # Safety
    ///
    /// `self` is live, created through `d`, and not used afterwards.
    pub unsafe fn destroy_raw<D: Dispatch + ?Sized>(self, d: &D) -> ResultCode {
        // SAFETY: caller contract.
        unsafe { d.destroy_space(self.get()) }
    }

    /// # Safety
    ///
    /// As for [`Space::destroy_raw`].
    pub unsafe fn destroy<D: Dispatch + ?Sized>(self, d: &D) -> VoidResult {
        // SAFETY: forwarded caller contract.
        let result = unsafe { self.destroy_raw(d) };
        ActivePolicy::void(result, "xrbind::Space::destroy")
    }

    /// `xrLocateSpace` into `location`, keeping its chain.
    ///
    /// # Safety
    ///
    /// Both spaces are live and were created through `d`; `location`'s chain
    /// is live.
    pub unsafe fn locate_raw<D: Dispatch + ?Sized>(
        self,
        d: &D,
        base_space: Space,
        time: Time,
        location: &mut SpaceLocation,
    ) -> ResultCode {
        // SAFETY: caller contract.
        unsafe { d.locate_space(self.get(), base_space.get(), time, location.put(true)) }
    }

    /// Locate `self` relative to `base_space` at `time`.
    ///
    /// `SESSION_LOSS_PENDING` is accepted as success and reported alongside
    /// the location.
    ///
    /// # Safety
    ///
    /// As for [`Space::locate_raw`].
    pub unsafe fn locate<D: Dispatch + ?Sized>(
        self,
        d: &D,
        base_space: Space,
        time: Time,
    ) -> CodedValue<SpaceLocation> {
        let mut location = SpaceLocation::default();
        // SAFETY: forwarded caller contract; no chain.
        let result = unsafe { self.locate_raw(d, base_space, time, &mut location) };
        ActivePolicy::value_with(result, location, "xrbind::Space::locate", SESSION_SUCCESS_CODES)
    }
}
