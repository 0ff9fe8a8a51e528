//! Extensible-struct wrappers.
//!
//! Every wrapper mirrors its raw struct field for field and is reinterpreted
//! in place through [`Transparent`]. Typed structs start with a private
//! header (type tag plus `next` link); the tag is fixed at construction and
//! the link is only changed through [`TypedStruct::set_next`] or
//! [`TypedStruct::push_next`].
//!
//! `put(true)` resets a struct for reuse as an output buffer but keeps its
//! `next` link, so a chain wired up by the caller survives repeated calls.

mod types;

use std::ffi::c_void;
use std::ptr;

pub use types::{
    ApplicationInfo, HandTrackerCreateInfoEXT, InstanceCreateInfo, InstanceProperties,
    ReferenceSpaceCreateInfo, SessionBeginInfo, SessionCreateInfo, SpaceLocation, SystemGetInfo,
    SystemHandTrackingPropertiesEXT, SystemProperties, erase,
};

use crate::sys::{self, StructureType};
use crate::transparent::Transparent;

/// Header of a struct passed into a command.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InHeader {
    ty: StructureType,
    next: *const c_void,
}

/// Header of a struct filled in by a command.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutHeader {
    ty: StructureType,
    next: *mut c_void,
}

// SAFETY: same fields, order and types as the base structures; the `next`
// pointers differ only in pointee type.
unsafe impl Transparent for InHeader {
    type Raw = sys::BaseInStructure;
}

// SAFETY: as above.
unsafe impl Transparent for OutHeader {
    type Raw = sys::BaseOutStructure;
}

impl InHeader {
    const fn with_next(self, next: *const c_void) -> Self {
        Self { ty: self.ty, next }
    }
}

impl OutHeader {
    const fn with_next(self, next: *const c_void) -> Self {
        Self {
            ty: self.ty,
            next: next.cast_mut(),
        }
    }
}

crate::assert_layout!(InHeader => sys::BaseInStructure, ty, next);
crate::assert_layout!(OutHeader => sys::BaseOutStructure, ty, next);

/// The tag-plus-link prefix shared by typed structs.
pub trait ChainHeader: Transparent + Copy {
    fn new(ty: StructureType) -> Self;
    fn ty(&self) -> StructureType;
    fn next(&self) -> *const c_void;
    fn set_next(&mut self, next: *mut c_void);
}

impl ChainHeader for InHeader {
    fn new(ty: StructureType) -> Self {
        Self {
            ty,
            next: ptr::null(),
        }
    }

    fn ty(&self) -> StructureType {
        self.ty
    }

    fn next(&self) -> *const c_void {
        self.next
    }

    fn set_next(&mut self, next: *mut c_void) {
        self.next = next.cast_const();
    }
}

impl ChainHeader for OutHeader {
    fn new(ty: StructureType) -> Self {
        Self {
            ty,
            next: ptr::null_mut(),
        }
    }

    fn ty(&self) -> StructureType {
        self.ty
    }

    fn next(&self) -> *const c_void {
        self.next.cast_const()
    }

    fn set_next(&mut self, next: *mut c_void) {
        self.next = next;
    }
}

/// A value-type wrapper over a raw C struct.
pub trait StructWrapper: Transparent<Raw: Copy> + Default + Copy {
    /// Only ever filled in by commands, never read by them.
    const OUTPUT_ONLY: bool;

    /// Read-only view as the raw struct.
    fn get(&self) -> *const Self::Raw {
        self.as_raw_ptr()
    }

    /// Mutable view as the raw struct, for use as an output argument.
    ///
    /// With `clear`, the struct is first reset to its default state (keeping
    /// any `next` link). Without it, nothing is touched.
    fn put(&mut self, clear: bool) -> *mut Self::Raw {
        if clear {
            self.clear();
        }
        self.as_raw_mut_ptr()
    }

    /// Reset to the default state.
    fn clear(&mut self) {
        *self = Self::default();
    }

    /// Copy a raw struct into a new wrapper.
    fn from_raw(raw: &Self::Raw) -> Self {
        *Self::from_raw_ref(raw)
    }

    /// Overwrite this wrapper with a raw struct's contents.
    fn assign_from_raw(&mut self, raw: &Self::Raw) {
        if !ptr::eq(self.as_raw_ptr(), raw) {
            *self.as_raw_mut() = *raw;
        }
    }
}

/// A struct carrying a type tag and a `next` link.
pub trait TypedStruct: StructWrapper {
    const TYPE: StructureType;

    type Header: ChainHeader;

    #[doc(hidden)]
    fn header(&self) -> &Self::Header;

    #[doc(hidden)]
    fn header_mut(&mut self) -> &mut Self::Header;

    fn structure_type(&self) -> StructureType {
        self.header().ty()
    }

    fn next(&self) -> *const c_void {
        self.header().next()
    }

    /// Set the `next` link.
    ///
    /// The pointee must outlive every use of this struct in a command.
    fn set_next(&mut self, next: *mut c_void) {
        self.header_mut().set_next(next);
    }

    /// The header viewed as the base raw structure.
    fn get_base(&self) -> &<Self::Header as Transparent>::Raw {
        self.header().as_raw()
    }

    /// Insert `ext` directly after this struct in its chain.
    ///
    /// `ext` must outlive every use of this struct in a command.
    fn push_next<E>(&mut self, ext: &mut E)
    where
        E: Extends<Self>,
        Self: Sized,
    {
        ext.set_next(self.next().cast_mut());
        self.set_next((ext as *mut E).cast());
    }
}

/// Marks `Self` as a valid chain member of `Base`.
pub trait Extends<Base: TypedStruct>: TypedStruct {}

/// Raw read-only view of a wrapper.
#[must_use]
pub fn get<S: StructWrapper>(s: &S) -> *const S::Raw {
    s.get()
}

/// Raw output view of a wrapper, cleared first.
pub fn put<S: StructWrapper>(s: &mut S) -> *mut S::Raw {
    s.put(true)
}

/// Base-structure view of a typed wrapper.
#[must_use]
pub fn get_base<S: TypedStruct>(s: &S) -> &<S::Header as Transparent>::Raw {
    s.get_base()
}

/// Implements the wrapper traits for a typed struct, pins its layout against
/// the raw struct, and gives `Default` the fixed type tag.
macro_rules! typed_struct {
    (
        $name:ident: $header:ident => sys::$raw:ident = $tag:ident,
        output_only: $output_only:literal,
        fields: [$($field:ident),* $(,)?]
    ) => {
        // SAFETY: `#[repr(C)]` mirror of the raw struct; offsets pinned below.
        unsafe impl $crate::transparent::Transparent for $name {
            type Raw = $crate::sys::$raw;
        }

        $crate::assert_layout!($name => $crate::sys::$raw, $($field),*);
        const _: () = assert!(::core::mem::offset_of!($name, header) == 0);

        impl Default for $name {
            fn default() -> Self {
                let mut raw = $crate::sys::$raw::default();
                raw.ty = $crate::sys::StructureType::$tag;
                <Self as $crate::structs::StructWrapper>::from_raw(&raw)
            }
        }

        impl $crate::structs::StructWrapper for $name {
            const OUTPUT_ONLY: bool = $output_only;

            fn clear(&mut self) {
                let next = $crate::structs::ChainHeader::next(&self.header);
                *self = Self::default();
                $crate::structs::ChainHeader::set_next(&mut self.header, next.cast_mut());
            }
        }

        impl $name {
            /// The same struct with `next` as the head of its chain.
            #[must_use]
            pub const fn with_next(mut self, next: *const ::core::ffi::c_void) -> Self {
                self.header = self.header.with_next(next);
                self
            }
        }

        impl $crate::structs::TypedStruct for $name {
            const TYPE: $crate::sys::StructureType = $crate::sys::StructureType::$tag;

            type Header = $crate::structs::$header;

            fn header(&self) -> &Self::Header {
                &self.header
            }

            fn header_mut(&mut self) -> &mut Self::Header {
                &mut self.header
            }
        }
    };
}

pub(crate) use typed_struct;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::{FormFactor, SystemId};

    #[test]
    fn put_clear_preserves_chain_and_resets_fields() {
        let mut ext = SystemHandTrackingPropertiesEXT::default();
        let mut props = SystemProperties::default();
        props.push_next(&mut ext);
        let link = props.next();
        props.vendor_id = 77;
        props.system_id = SystemId::from_raw(3);

        let raw = props.put(true);
        // SAFETY: `raw` views `props`, which is live.
        let raw = unsafe { &*raw };
        assert_eq!(raw.next.cast_const(), link);
        assert_eq!(raw.ty, StructureType::SYSTEM_PROPERTIES);
        assert_eq!(raw.vendor_id, 0);
        assert_eq!(raw.system_id, SystemId::NULL);
    }

    #[test]
    fn put_without_clear_changes_nothing() {
        let mut info = SystemGetInfo::new(FormFactor::HANDHELD_DISPLAY);
        let before = info;
        let _ = info.put(false);
        assert_eq!(info.form_factor, before.form_factor);
        assert_eq!(info.next(), before.next());
    }

    #[test]
    fn push_next_links_in_order() {
        let mut a = SystemHandTrackingPropertiesEXT::default();
        let mut b = SystemHandTrackingPropertiesEXT::default();
        let mut props = SystemProperties::default();
        props.push_next(&mut a);
        props.push_next(&mut b);
        assert_eq!(props.next(), (&b as *const SystemHandTrackingPropertiesEXT).cast());
        assert_eq!(b.next(), (&a as *const SystemHandTrackingPropertiesEXT).cast());
        assert!(a.next().is_null());
    }

    #[test]
    fn copy_from_raw_matches_put_assignment() {
        let mut raw = sys::SessionCreateInfo::default();
        raw.ty = StructureType::SESSION_CREATE_INFO;
        raw.system_id = SystemId::from_raw(12);

        let copied = SessionCreateInfo::from_raw(&raw);
        let mut assigned = SessionCreateInfo::default();
        // SAFETY: `put` views `assigned`, which is live and unaliased.
        unsafe { *assigned.put(false) = raw };
        assert_eq!(copied.system_id, assigned.system_id);

        let mut reassigned = SessionCreateInfo::default();
        reassigned.assign_from_raw(&raw);
        assert_eq!(reassigned.system_id, SystemId::from_raw(12));
    }

    #[test]
    fn base_view_exposes_tag_and_link() {
        let info = SessionBeginInfo::default();
        let base = get_base(&info);
        assert_eq!(base.ty, StructureType::SESSION_BEGIN_INFO);
        assert!(base.next.is_null());
        assert_eq!(get(&info).cast::<sys::BaseInStructure>(), base as *const _);
    }

    #[test]
    fn output_only_marks_receivers() {
        assert!(SystemProperties::OUTPUT_ONLY);
        assert!(SpaceLocation::OUTPUT_ONLY);
        assert!(!SessionCreateInfo::OUTPUT_ONLY);
    }
}
