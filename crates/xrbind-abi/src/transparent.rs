//! In-place reinterpretation between wrappers and their raw C types.
//!
//! This is the only place the binding converts a reference to a wrapper into
//! a reference to its raw type (or back). Every implementor pins its layout
//! with [`assert_layout!`].

/// A wrapper that is layout-identical to [`Transparent::Raw`].
///
/// # Safety
///
/// Implementors must have the same size and alignment as `Raw`, with every
/// field at the same offset, and every bit pattern valid for `Raw` must be a
/// valid `Self`. Implementors are `#[repr(transparent)]` newtypes or
/// `#[repr(C)]` mirrors of `Raw`.
pub unsafe trait Transparent: Sized {
    type Raw;

    #[inline]
    fn as_raw(&self) -> &Self::Raw {
        // SAFETY: layout identity is the trait contract.
        unsafe { &*self.as_raw_ptr() }
    }

    #[inline]
    fn as_raw_mut(&mut self) -> &mut Self::Raw {
        // SAFETY: layout identity is the trait contract; any value the raw
        // side writes is a valid `Self`.
        unsafe { &mut *self.as_raw_mut_ptr() }
    }

    #[inline]
    fn as_raw_ptr(&self) -> *const Self::Raw {
        (self as *const Self).cast()
    }

    #[inline]
    fn as_raw_mut_ptr(&mut self) -> *mut Self::Raw {
        (self as *mut Self).cast()
    }

    #[inline]
    fn from_raw_ref(raw: &Self::Raw) -> &Self {
        // SAFETY: layout identity plus validity of every raw bit pattern.
        unsafe { &*(raw as *const Self::Raw).cast::<Self>() }
    }

    #[inline]
    fn from_raw_mut(raw: &mut Self::Raw) -> &mut Self {
        // SAFETY: as for `from_raw_ref`.
        unsafe { &mut *(raw as *mut Self::Raw).cast::<Self>() }
    }

    /// Reinterpret a slice of raw values.
    #[inline]
    fn from_raw_slice(raw: &[Self::Raw]) -> &[Self] {
        // SAFETY: equal size and alignment make the element strides identical.
        unsafe { std::slice::from_raw_parts(raw.as_ptr().cast::<Self>(), raw.len()) }
    }
}

/// Compile-time size and alignment check of a wrapper against its raw type,
/// optionally with per-field offset checks.
#[macro_export]
macro_rules! assert_layout {
    ($wrapper:ty => $raw:ty) => {
        const _: () = {
            assert!(::core::mem::size_of::<$wrapper>() == ::core::mem::size_of::<$raw>());
            assert!(::core::mem::align_of::<$wrapper>() == ::core::mem::align_of::<$raw>());
        };
    };
    ($wrapper:ty => $raw:ty, $($field:ident),+ $(,)?) => {
        $crate::assert_layout!($wrapper => $raw);
        const _: () = {
            $(
                assert!(
                    ::core::mem::offset_of!($wrapper, $field)
                        == ::core::mem::offset_of!($raw, $field)
                );
            )+
        };
    };
}
