//! Raw C-ABI mirror types.
//!
//! Everything here is laid out exactly as the C headers declare it. The safe
//! wrappers in [`crate::handle`] and [`crate::structs`] reinterpret these types
//! in place; nothing in this module carries invariants of its own.

use std::ffi::{c_char, c_void};
use std::fmt;

pub use xrbind_core::ResultCode;
pub use xrbind_core::flags::{
    Flags64, InstanceCreateFlags, SessionCreateFlags, SpaceLocationFlags,
};

// ---------------------------------------------------------------------------
// Sizes
// ---------------------------------------------------------------------------

pub const MAX_APPLICATION_NAME_SIZE: usize = 128;
pub const MAX_ENGINE_NAME_SIZE: usize = 128;
pub const MAX_RUNTIME_NAME_SIZE: usize = 128;
pub const MAX_SYSTEM_NAME_SIZE: usize = 256;
pub const MAX_RESULT_STRING_SIZE: usize = 64;

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

macro_rules! raw_handle {
    ($($(#[$meta:meta])* $name:ident;)*) => {$(
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(u64);

        impl $name {
            pub const NULL: Self = Self(0);

            #[must_use]
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            #[must_use]
            pub const fn into_raw(self) -> u64 {
                self.0
            }

            #[must_use]
            pub const fn is_null(self) -> bool {
                self.0 == 0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({:#x})"), self.0)
            }
        }
    )*};
}

raw_handle! {
    Instance;
    Session;
    Space;
    HandTrackerEXT;
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SystemId(u64);

impl SystemId {
    pub const NULL: Self = Self(0);

    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn into_raw(self) -> u64 {
        self.0
    }
}

/// Nanosecond timestamp.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Time(i64);

impl Time {
    #[must_use]
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    #[must_use]
    pub const fn as_nanos(self) -> i64 {
        self.0
    }
}

/// Packed `major.minor.patch` version: 16, 16 and 32 bits.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Version(u64);

impl Version {
    #[must_use]
    pub const fn new(major: u16, minor: u16, patch: u32) -> Self {
        Self(((major as u64) << 48) | ((minor as u64) << 32) | patch as u64)
    }

    #[must_use]
    pub const fn major(self) -> u16 {
        (self.0 >> 48) as u16
    }

    #[must_use]
    pub const fn minor(self) -> u16 {
        (self.0 >> 32) as u16
    }

    #[must_use]
    pub const fn patch(self) -> u32 {
        self.0 as u32
    }

    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn into_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.patch())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// API version this binding targets.
pub const CURRENT_API_VERSION: Version = Version::new(1, 0, 34);

/// 32-bit boolean.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bool32(u32);

impl Bool32 {
    pub const TRUE: Self = Self(1);
    pub const FALSE: Self = Self(0);

    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn into_raw(self) -> u32 {
        self.0
    }
}

impl From<bool> for Bool32 {
    fn from(b: bool) -> Self {
        Self(u32::from(b))
    }
}

impl From<Bool32> for bool {
    fn from(b: Bool32) -> Self {
        b.0 != 0
    }
}

// ---------------------------------------------------------------------------
// Open enums
// ---------------------------------------------------------------------------

/// Enumerations whose unknown values must pass through unchanged.
macro_rules! open_enum {
    ($(
        $(#[$meta:meta])*
        $name:ident { $($variant:ident = $value:literal,)* }
    )*) => {$(
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(i32);

        impl $name {
            $(pub const $variant: Self = Self($value);)*

            #[must_use]
            pub const fn from_raw(raw: i32) -> Self {
                Self(raw)
            }

            #[must_use]
            pub const fn into_raw(self) -> i32 {
                self.0
            }

            /// Symbolic name for a known value.
            #[must_use]
            pub const fn name(self) -> Option<&'static str> {
                match self.0 {
                    $($value => Some(stringify!($variant)),)*
                    _ => None,
                }
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.name() {
                    Some(n) => write!(f, concat!(stringify!($name), "::{}"), n),
                    None => write!(f, concat!(stringify!($name), "({})"), self.0),
                }
            }
        }
    )*};
}

open_enum! {
    StructureType {
        UNKNOWN = 0,
        INSTANCE_CREATE_INFO = 3,
        SYSTEM_GET_INFO = 4,
        SYSTEM_PROPERTIES = 5,
        SESSION_CREATE_INFO = 8,
        SESSION_BEGIN_INFO = 10,
        INSTANCE_PROPERTIES = 32,
        REFERENCE_SPACE_CREATE_INFO = 37,
        SPACE_LOCATION = 42,
        SYSTEM_HAND_TRACKING_PROPERTIES_EXT = 1000051000,
        HAND_TRACKER_CREATE_INFO_EXT = 1000051001,
    }

    FormFactor {
        HEAD_MOUNTED_DISPLAY = 1,
        HANDHELD_DISPLAY = 2,
    }

    ViewConfigurationType {
        PRIMARY_MONO = 1,
        PRIMARY_STEREO = 2,
    }

    ReferenceSpaceType {
        VIEW = 1,
        LOCAL = 2,
        STAGE = 3,
    }

    HandEXT {
        LEFT = 1,
        RIGHT = 2,
    }

    HandJointSetEXT {
        DEFAULT = 0,
    }
}

// ---------------------------------------------------------------------------
// Structures
// ---------------------------------------------------------------------------

/// Implements `Default` as the all-zero bit pattern.
///
/// Only for structures made of integers, floats, raw pointers and arrays of
/// those, for which all-zero is a valid value.
macro_rules! zeroed_default {
    ($($name:ident),* $(,)?) => {$(
        impl Default for $name {
            fn default() -> Self {
                // SAFETY: every field is an integer, float, raw pointer or an
                // array of those; the all-zero pattern is valid for each.
                unsafe { std::mem::zeroed() }
            }
        }
    )*};
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct BaseInStructure {
    pub ty: StructureType,
    pub next: *const BaseInStructure,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct BaseOutStructure {
    pub ty: StructureType,
    pub next: *mut BaseOutStructure,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ApplicationInfo {
    pub application_name: [c_char; MAX_APPLICATION_NAME_SIZE],
    pub application_version: u32,
    pub engine_name: [c_char; MAX_ENGINE_NAME_SIZE],
    pub engine_version: u32,
    pub api_version: Version,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct InstanceCreateInfo {
    pub ty: StructureType,
    pub next: *const c_void,
    pub create_flags: InstanceCreateFlags,
    pub application_info: ApplicationInfo,
    pub enabled_api_layer_count: u32,
    pub enabled_api_layer_names: *const *const c_char,
    pub enabled_extension_count: u32,
    pub enabled_extension_names: *const *const c_char,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct InstanceProperties {
    pub ty: StructureType,
    pub next: *mut c_void,
    pub runtime_version: Version,
    pub runtime_name: [c_char; MAX_RUNTIME_NAME_SIZE],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SystemGetInfo {
    pub ty: StructureType,
    pub next: *const c_void,
    pub form_factor: FormFactor,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemGraphicsProperties {
    pub max_swapchain_image_height: u32,
    pub max_swapchain_image_width: u32,
    pub max_layer_count: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemTrackingProperties {
    pub orientation_tracking: Bool32,
    pub position_tracking: Bool32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SystemProperties {
    pub ty: StructureType,
    pub next: *mut c_void,
    pub system_id: SystemId,
    pub vendor_id: u32,
    pub system_name: [c_char; MAX_SYSTEM_NAME_SIZE],
    pub graphics_properties: SystemGraphicsProperties,
    pub tracking_properties: SystemTrackingProperties,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SystemHandTrackingPropertiesEXT {
    pub ty: StructureType,
    pub next: *mut c_void,
    pub supports_hand_tracking: Bool32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SessionCreateInfo {
    pub ty: StructureType,
    pub next: *const c_void,
    pub create_flags: SessionCreateFlags,
    pub system_id: SystemId,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SessionBeginInfo {
    pub ty: StructureType,
    pub next: *const c_void,
    pub primary_view_configuration_type: ViewConfigurationType,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Quaternionf {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quaternionf {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    #[must_use]
    pub fn norm_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector3f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Posef {
    pub orientation: Quaternionf,
    pub position: Vector3f,
}

impl Posef {
    pub const IDENTITY: Self = Self {
        orientation: Quaternionf::IDENTITY,
        position: Vector3f {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        },
    };
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ReferenceSpaceCreateInfo {
    pub ty: StructureType,
    pub next: *const c_void,
    pub reference_space_type: ReferenceSpaceType,
    pub pose_in_reference_space: Posef,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SpaceLocation {
    pub ty: StructureType,
    pub next: *mut c_void,
    pub location_flags: SpaceLocationFlags,
    pub pose: Posef,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct HandTrackerCreateInfoEXT {
    pub ty: StructureType,
    pub next: *const c_void,
    pub hand: HandEXT,
    pub hand_joint_set: HandJointSetEXT,
}

zeroed_default!(
    BaseInStructure,
    BaseOutStructure,
    ApplicationInfo,
    InstanceCreateInfo,
    InstanceProperties,
    SystemGetInfo,
    SystemProperties,
    SystemHandTrackingPropertiesEXT,
    SessionCreateInfo,
    SessionBeginInfo,
    ReferenceSpaceCreateInfo,
    SpaceLocation,
    HandTrackerCreateInfoEXT,
);

// ---------------------------------------------------------------------------
// Function pointers
// ---------------------------------------------------------------------------

/// Type-erased command pointer as handed out by the loader.
pub type VoidFunction = unsafe extern "system" fn();

/// The loader's command resolver, `xrGetInstanceProcAddr`.
pub type GetInstanceProcAddr = unsafe extern "system" fn(
    instance: Instance,
    name: *const c_char,
    function: *mut Option<VoidFunction>,
) -> ResultCode;
