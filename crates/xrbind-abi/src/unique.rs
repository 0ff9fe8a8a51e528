//! Unique ownership of handles.
//!
//! A [`UniqueHandle`] owns one handle and a deleter. Dropping it runs the
//! deleter once if the handle is non-null; [`UniqueHandle::release`] gives the
//! handle back without running it. Rust moves leave nothing behind to drop, so
//! a moved-from owner never deletes.

use std::fmt;
use std::mem;
use std::ops::Deref;

use xrbind_core::ResultCode;
use xrbind_core::policy::{ActivePolicy, ResultPolicy, ResultValueType};

use crate::dispatch::{Dispatch, ExtensionDispatch};
use crate::handle::{HandTrackerEXT, Handle, Instance, Session, Space};

/// Destroys handles of type `H`.
pub trait Deleter<H: Handle> {
    fn delete(&mut self, handle: H);
}

/// Adapts a closure into a [`Deleter`].
#[derive(Clone, Copy)]
pub struct FnDeleter<F>(pub F);

impl<H: Handle, F: FnMut(H)> Deleter<H> for FnDeleter<F> {
    fn delete(&mut self, handle: H) {
        (self.0)(handle);
    }
}

impl<F> fmt::Debug for FnDeleter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnDeleter")
    }
}

/// Handles that can be destroyed through dispatcher `D`.
pub trait DestroyWith<D: ?Sized>: Handle {
    /// Call this handle type's destroy command.
    ///
    /// # Safety
    ///
    /// `self` must be a live handle created through `dispatch` and not
    /// destroyed elsewhere.
    unsafe fn destroy_with(self, dispatch: &D) -> ResultCode;
}

impl<D: Dispatch + ?Sized> DestroyWith<D> for Instance {
    unsafe fn destroy_with(self, dispatch: &D) -> ResultCode {
        // SAFETY: forwarded caller contract.
        unsafe { dispatch.destroy_instance(self.get()) }
    }
}

impl<D: Dispatch + ?Sized> DestroyWith<D> for Session {
    unsafe fn destroy_with(self, dispatch: &D) -> ResultCode {
        // SAFETY: forwarded caller contract.
        unsafe { dispatch.destroy_session(self.get()) }
    }
}

impl<D: Dispatch + ?Sized> DestroyWith<D> for Space {
    unsafe fn destroy_with(self, dispatch: &D) -> ResultCode {
        // SAFETY: forwarded caller contract.
        unsafe { dispatch.destroy_space(self.get()) }
    }
}

impl<D: ExtensionDispatch + ?Sized> DestroyWith<D> for HandTrackerEXT {
    unsafe fn destroy_with(self, dispatch: &D) -> ResultCode {
        // SAFETY: forwarded caller contract.
        unsafe { dispatch.destroy_hand_tracker_ext(self.get()) }
    }
}

/// The standard deleter: the handle type's destroy command, via a borrowed
/// dispatcher.
pub struct ObjectDestroy<'d, D: ?Sized> {
    dispatch: &'d D,
}

impl<'d, D: ?Sized> ObjectDestroy<'d, D> {
    /// # Safety
    ///
    /// Every handle later passed to this deleter must have been created
    /// through `dispatch`, be live, and not be destroyed by anyone else.
    #[must_use]
    pub const unsafe fn new(dispatch: &'d D) -> Self {
        Self { dispatch }
    }

    #[must_use]
    pub const fn dispatch(&self) -> &'d D {
        self.dispatch
    }
}

impl<D: ?Sized> Clone for ObjectDestroy<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: ?Sized> Copy for ObjectDestroy<'_, D> {}

impl<D: ?Sized> fmt::Debug for ObjectDestroy<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectDestroy").finish_non_exhaustive()
    }
}

impl<H: DestroyWith<D>, D: ?Sized> Deleter<H> for ObjectDestroy<'_, D> {
    fn delete(&mut self, handle: H) {
        // SAFETY: guaranteed by the contract of `ObjectDestroy::new`.
        // Destroy failures have no caller to report to.
        let _ = unsafe { handle.destroy_with(self.dispatch) };
    }
}

/// Owns one handle and the deleter that destroys it.
pub struct UniqueHandle<H: Handle, D: Deleter<H>> {
    handle: H,
    deleter: D,
}

impl<H: Handle, D: Deleter<H>> UniqueHandle<H, D> {
    #[must_use]
    pub fn new(handle: H, deleter: D) -> Self {
        Self { handle, deleter }
    }

    /// An owner holding nothing.
    #[must_use]
    pub fn null(deleter: D) -> Self {
        Self {
            handle: H::NULL,
            deleter,
        }
    }

    #[must_use]
    pub fn get(&self) -> H {
        self.handle
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.handle.is_null()
    }

    pub fn deleter(&self) -> &D {
        &self.deleter
    }

    pub fn deleter_mut(&mut self) -> &mut D {
        &mut self.deleter
    }

    /// Give up ownership without deleting. `self` is left null.
    #[must_use = "the released handle must be destroyed by the caller"]
    pub fn release(&mut self) -> H {
        mem::replace(&mut self.handle, H::NULL)
    }

    /// Delete the current handle (if any and if different) and own `handle`.
    pub fn reset(&mut self, handle: H) {
        let old = mem::replace(&mut self.handle, handle);
        if !old.is_null() && old != handle {
            self.deleter.delete(old);
        }
    }

    /// Delete the current handle and expose storage for a new one.
    pub fn put(&mut self) -> *mut H::Raw {
        self.reset(H::NULL);
        self.handle.put()
    }

    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Move ownership into a new owner, leaving `self` null.
    #[must_use]
    pub fn take(&mut self) -> Self
    where
        D: Clone,
    {
        let handle = self.release();
        Self::new(handle, self.deleter.clone())
    }
}

impl<H: Handle, D: Deleter<H>> Deref for UniqueHandle<H, D> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.handle
    }
}

impl<H: Handle, D: Deleter<H>> Drop for UniqueHandle<H, D> {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            let handle = mem::replace(&mut self.handle, H::NULL);
            self.deleter.delete(handle);
        }
    }
}

impl<H: Handle, D: Deleter<H>> fmt::Debug for UniqueHandle<H, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UniqueHandle").field(&self.handle).finish()
    }
}

impl<H: Handle, D: Deleter<H>> PartialEq<H> for UniqueHandle<H, D> {
    fn eq(&self, other: &H) -> bool {
        self.handle == *other
    }
}

pub type UniqueInstance<'d, D> = UniqueHandle<Instance, ObjectDestroy<'d, D>>;
pub type UniqueSession<'d, D> = UniqueHandle<Session, ObjectDestroy<'d, D>>;
pub type UniqueSpace<'d, D> = UniqueHandle<Space, ObjectDestroy<'d, D>>;
pub type UniqueHandTrackerEXT<'d, D> = UniqueHandle<HandTrackerEXT, ObjectDestroy<'d, D>>;

/// Classify `result` like any value projection, wrapping `handle` with
/// `deleter` when the caller will observe it.
pub fn create_unique_result_value<H, D>(
    result: ResultCode,
    handle: H,
    message: &'static str,
    deleter: D,
) -> ResultValueType<UniqueHandle<H, D>>
where
    H: Handle,
    D: Deleter<H>,
{
    ActivePolicy::value_map(result, (handle, deleter), message, |(h, d)| {
        UniqueHandle::new(h, d)
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::sys;

    type Log = Rc<RefCell<Vec<sys::Space>>>;

    fn recorder() -> (Log, FnDeleter<impl FnMut(Space) + Clone>) {
        let log: Log = Rc::default();
        let sink = Rc::clone(&log);
        (log, FnDeleter(move |s: Space| sink.borrow_mut().push(s.get())))
    }

    fn space(raw: u64) -> Space {
        Space::from_raw(sys::Space::from_raw(raw))
    }

    #[test]
    fn drop_deletes_exactly_once() {
        let (log, deleter) = recorder();
        {
            let _owned = UniqueHandle::new(space(7), deleter);
        }
        assert_eq!(*log.borrow(), vec![sys::Space::from_raw(7)]);
    }

    #[test]
    fn move_transfers_single_deletion() {
        let (log, deleter) = recorder();
        let a = UniqueHandle::new(space(3), deleter);
        let b = a;
        assert_eq!(b.get(), space(3));
        drop(b);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn take_leaves_source_null() {
        let (log, deleter) = recorder();
        let mut a = UniqueHandle::new(space(4), deleter);
        let b = a.take();
        assert!(a.is_null());
        drop(a);
        assert!(log.borrow().is_empty());
        drop(b);
        assert_eq!(*log.borrow(), vec![sys::Space::from_raw(4)]);
    }

    #[test]
    fn release_skips_deleter() {
        let (log, deleter) = recorder();
        let mut a = UniqueHandle::new(space(5), deleter);
        let raw = a.release();
        assert_eq!(raw, space(5));
        assert!(a.is_null());
        drop(a);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn reset_deletes_previous() {
        let (log, deleter) = recorder();
        let mut a = UniqueHandle::new(space(1), deleter);
        a.reset(space(1));
        assert!(log.borrow().is_empty());
        a.reset(space(2));
        assert_eq!(*log.borrow(), vec![sys::Space::from_raw(1)]);
        let slot = a.put();
        assert!(a.is_null());
        // SAFETY: `slot` points at `a`'s handle storage.
        unsafe { *slot = sys::Space::from_raw(9) };
        drop(a);
        assert_eq!(
            *log.borrow(),
            vec![sys::Space::from_raw(1), sys::Space::from_raw(2), sys::Space::from_raw(9)]
        );
    }

    #[test]
    fn null_owner_never_deletes() {
        let (log, deleter) = recorder();
        drop(UniqueHandle::<Space, _>::null(deleter));
        assert!(log.borrow().is_empty());
    }

    #[cfg(not(feature = "status-pairs"))]
    #[test]
    fn unique_result_carries_handle_on_success() {
        let (log, deleter) = recorder();
        let owned = create_unique_result_value(ResultCode::SUCCESS, space(8), "ctx", deleter)
            .expect("success");
        assert_eq!(owned.get(), space(8));
        drop(owned);
        assert_eq!(log.borrow().len(), 1);

        let (log, deleter) = recorder();
        let err = create_unique_result_value(
            ResultCode::ERROR_LIMIT_REACHED,
            Space::NULL,
            "ctx",
            deleter,
        )
        .unwrap_err();
        assert_eq!(err.code(), ResultCode::ERROR_LIMIT_REACHED);
        assert!(log.borrow().is_empty());
    }
}
