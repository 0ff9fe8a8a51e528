//! Typesafe handle wrappers.
//!
//! Each wrapper is a `#[repr(transparent)]` newtype over its raw handle, so a
//! `&[Session]` and a `&[sys::Session]` are interchangeable at the ABI. Equality
//! is raw-value equality, against wrappers, raw handles and [`NullHandle`] in
//! either operand order.

use std::fmt;

use xrbind_core::HandleKind;

use crate::sys;
use crate::transparent::Transparent;

/// Stand-in for the null handle literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NullHandle;

/// Common surface of every handle wrapper.
pub trait Handle: Copy + Eq + fmt::Debug {
    /// The raw handle type at the ABI.
    type Raw: Copy + Eq + fmt::Debug;

    /// The null sentinel.
    const NULL: Self;

    const KIND: HandleKind;

    fn from_raw(raw: Self::Raw) -> Self;

    /// The raw handle value.
    fn get(&self) -> Self::Raw;

    /// Null this handle and expose its storage as an output parameter.
    fn put(&mut self) -> *mut Self::Raw;

    fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    /// `true` for any non-null handle.
    fn is_some(&self) -> bool {
        !self.is_null()
    }
}

macro_rules! define_handle {
    ($(
        $(#[$meta:meta])*
        $name:ident => $kind:ident;
    )*) => {$(
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(sys::$name);

        impl $name {
            pub const NULL: Self = Self(sys::$name::NULL);

            /// Wrap a raw handle.
            #[must_use]
            pub const fn from_raw(raw: sys::$name) -> Self {
                Self(raw)
            }

            #[must_use]
            pub const fn get(self) -> sys::$name {
                self.0
            }

            /// Null this handle and return a pointer to its storage.
            pub fn put(&mut self) -> *mut sys::$name {
                self.0 = sys::$name::NULL;
                &mut self.0
            }

            #[must_use]
            pub const fn is_null(self) -> bool {
                self.0.is_null()
            }
        }

        impl Handle for $name {
            type Raw = sys::$name;
            const NULL: Self = Self(sys::$name::NULL);
            const KIND: HandleKind = HandleKind::$kind;

            fn from_raw(raw: sys::$name) -> Self {
                Self(raw)
            }

            fn get(&self) -> sys::$name {
                self.0
            }

            fn put(&mut self) -> *mut sys::$name {
                $name::put(self)
            }
        }

        // SAFETY: `#[repr(transparent)]` over `sys::$name`, every raw value valid.
        unsafe impl Transparent for $name {
            type Raw = sys::$name;
        }

        $crate::assert_layout!($name => sys::$name);

        impl PartialEq<sys::$name> for $name {
            fn eq(&self, other: &sys::$name) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<$name> for sys::$name {
            fn eq(&self, other: &$name) -> bool {
                *self == other.0
            }
        }

        impl PartialEq<NullHandle> for $name {
            fn eq(&self, _: &NullHandle) -> bool {
                self.0.is_null()
            }
        }

        impl PartialEq<$name> for NullHandle {
            fn eq(&self, other: &$name) -> bool {
                other.0.is_null()
            }
        }

        impl From<NullHandle> for $name {
            fn from(_: NullHandle) -> Self {
                Self::NULL
            }
        }

        #[cfg(feature = "typesafe-conversion")]
        impl From<sys::$name> for $name {
            fn from(raw: sys::$name) -> Self {
                Self(raw)
            }
        }

        #[cfg(feature = "typesafe-conversion")]
        impl From<$name> for sys::$name {
            fn from(h: $name) -> Self {
                h.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({:#x})"), self.0.into_raw())
            }
        }
    )*};
}

define_handle! {
    /// Connection between an application and the runtime.
    Instance => Instance;
    /// An application's XR session, created from an [`Instance`].
    Session => Session;
    /// A reference frame, created from a [`Session`].
    Space => Space;
    /// Per-hand joint tracker from `XR_EXT_hand_tracking`.
    HandTrackerEXT => HandTrackerEXT;
}

/// Raw value of a handle.
#[must_use]
pub fn get<H: Handle>(h: &H) -> H::Raw {
    h.get()
}

/// Null a handle and return its storage as an output parameter.
pub fn put<H: Handle>(h: &mut H) -> *mut H::Raw {
    h.put()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_equals_null_literal() {
        assert_eq!(Session::default(), Session::from(NullHandle));
        assert_eq!(Session::default(), NullHandle);
        assert_eq!(NullHandle, Session::default());
        assert!(Session::default().is_null());
    }

    #[test]
    fn non_zero_handle_is_never_null() {
        let s = Session::from_raw(sys::Session::from_raw(0x42));
        assert_ne!(s, NullHandle);
        assert_ne!(NullHandle, s);
        assert!(Handle::is_some(&s));
        assert_eq!(s, sys::Session::from_raw(0x42));
        assert_eq!(sys::Session::from_raw(0x42), s);
    }

    #[test]
    fn put_nulls_and_exposes_storage() {
        let mut s = Space::from_raw(sys::Space::from_raw(9));
        let p = put(&mut s);
        assert!(s.is_null());
        // SAFETY: `p` points at `s`'s storage, which is live and unaliased here.
        unsafe { *p = sys::Space::from_raw(11) };
        assert_eq!(get(&s), sys::Space::from_raw(11));
    }

    #[test]
    fn kinds_match_wrappers() {
        assert_eq!(<Instance as Handle>::KIND, HandleKind::Instance);
        assert_eq!(<HandTrackerEXT as Handle>::KIND.parent(), Some(HandleKind::Session));
    }

    #[test]
    fn debug_shows_raw_value() {
        let i = Instance::from_raw(sys::Instance::from_raw(0x10));
        assert_eq!(format!("{i:?}"), "Instance(0x10)");
    }

    #[cfg(feature = "typesafe-conversion")]
    #[test]
    fn implicit_conversions_round_trip() {
        let raw = sys::Session::from_raw(5);
        let wrapped: Session = raw.into();
        let back: sys::Session = wrapped.into();
        assert_eq!(back, raw);
    }
}
