use std::borrow::Cow;
use std::ffi::{c_char, c_void};

use xrbind_core::fixed_string::{copy_to_fixed, fixed_to_str};

use super::{ChainHeader, Extends, InHeader, OutHeader, StructWrapper, TypedStruct, typed_struct};
use crate::sys::{
    self, Bool32, FormFactor, HandEXT, HandJointSetEXT, InstanceCreateFlags, Posef,
    ReferenceSpaceType, SessionCreateFlags, SpaceLocationFlags, SystemGraphicsProperties, SystemId,
    SystemTrackingProperties, Version, ViewConfigurationType, MAX_APPLICATION_NAME_SIZE,
    MAX_ENGINE_NAME_SIZE, MAX_RUNTIME_NAME_SIZE, MAX_SYSTEM_NAME_SIZE,
};
use crate::transparent::Transparent;

fn count_of<T>(items: &[T]) -> u32 {
    u32::try_from(items.len()).unwrap_or(u32::MAX)
}

// ---------------------------------------------------------------------------
// ApplicationInfo (untyped)
// ---------------------------------------------------------------------------

/// Identifies the application and engine to the runtime.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ApplicationInfo {
    pub application_name: [c_char; MAX_APPLICATION_NAME_SIZE],
    pub application_version: u32,
    pub engine_name: [c_char; MAX_ENGINE_NAME_SIZE],
    pub engine_version: u32,
    pub api_version: Version,
}

// SAFETY: `#[repr(C)]` mirror of the raw struct; offsets pinned below.
unsafe impl Transparent for ApplicationInfo {
    type Raw = sys::ApplicationInfo;
}

crate::assert_layout!(
    ApplicationInfo => sys::ApplicationInfo,
    application_name,
    application_version,
    engine_name,
    engine_version,
    api_version,
);

impl Default for ApplicationInfo {
    fn default() -> Self {
        Self::from_raw(&sys::ApplicationInfo::default())
    }
}

impl StructWrapper for ApplicationInfo {
    const OUTPUT_ONLY: bool = false;
}

impl ApplicationInfo {
    /// Names longer than their buffers are truncated; both stay terminated.
    #[must_use]
    pub fn new(
        application_name: &str,
        application_version: u32,
        engine_name: &str,
        engine_version: u32,
        api_version: Version,
    ) -> Self {
        let mut info = Self {
            application_version,
            engine_version,
            api_version,
            ..Self::default()
        };
        copy_to_fixed(&mut info.application_name, application_name);
        copy_to_fixed(&mut info.engine_name, engine_name);
        info
    }

    pub fn set_application_name(&mut self, name: &str) {
        copy_to_fixed(&mut self.application_name, name);
    }

    pub fn set_engine_name(&mut self, name: &str) {
        copy_to_fixed(&mut self.engine_name, name);
    }

    #[must_use]
    pub fn application_name(&self) -> Cow<'_, str> {
        fixed_to_str(&self.application_name)
    }

    #[must_use]
    pub fn engine_name(&self) -> Cow<'_, str> {
        fixed_to_str(&self.engine_name)
    }
}

// ---------------------------------------------------------------------------
// Instance
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct InstanceCreateInfo {
    header: InHeader,
    pub create_flags: InstanceCreateFlags,
    pub application_info: ApplicationInfo,
    pub enabled_api_layer_count: u32,
    pub enabled_api_layer_names: *const *const c_char,
    pub enabled_extension_count: u32,
    pub enabled_extension_names: *const *const c_char,
}

typed_struct! {
    InstanceCreateInfo: InHeader => sys::InstanceCreateInfo = INSTANCE_CREATE_INFO,
    output_only: false,
    fields: [
        create_flags,
        application_info,
        enabled_api_layer_count,
        enabled_api_layer_names,
        enabled_extension_count,
        enabled_extension_names,
    ]
}

impl InstanceCreateInfo {
    /// The name arrays are borrowed by pointer and must outlive every
    /// command call that uses this struct.
    #[must_use]
    pub fn new(
        create_flags: InstanceCreateFlags,
        application_info: ApplicationInfo,
        enabled_api_layer_names: &[*const c_char],
        enabled_extension_names: &[*const c_char],
    ) -> Self {
        Self {
            header: InHeader::new(Self::TYPE),
            create_flags,
            application_info,
            enabled_api_layer_count: count_of(enabled_api_layer_names),
            enabled_api_layer_names: enabled_api_layer_names.as_ptr(),
            enabled_extension_count: count_of(enabled_extension_names),
            enabled_extension_names: enabled_extension_names.as_ptr(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct InstanceProperties {
    header: OutHeader,
    pub runtime_version: Version,
    pub runtime_name: [c_char; MAX_RUNTIME_NAME_SIZE],
}

typed_struct! {
    InstanceProperties: OutHeader => sys::InstanceProperties = INSTANCE_PROPERTIES,
    output_only: true,
    fields: [runtime_version, runtime_name]
}

impl InstanceProperties {
    #[must_use]
    pub fn runtime_name(&self) -> Cow<'_, str> {
        fixed_to_str(&self.runtime_name)
    }
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SystemGetInfo {
    header: InHeader,
    pub form_factor: FormFactor,
}

typed_struct! {
    SystemGetInfo: InHeader => sys::SystemGetInfo = SYSTEM_GET_INFO,
    output_only: false,
    fields: [form_factor]
}

impl SystemGetInfo {
    #[must_use]
    pub fn new(form_factor: FormFactor) -> Self {
        Self {
            header: InHeader::new(Self::TYPE),
            form_factor,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SystemProperties {
    header: OutHeader,
    pub system_id: SystemId,
    pub vendor_id: u32,
    pub system_name: [c_char; MAX_SYSTEM_NAME_SIZE],
    pub graphics_properties: SystemGraphicsProperties,
    pub tracking_properties: SystemTrackingProperties,
}

typed_struct! {
    SystemProperties: OutHeader => sys::SystemProperties = SYSTEM_PROPERTIES,
    output_only: true,
    fields: [system_id, vendor_id, system_name, graphics_properties, tracking_properties]
}

impl SystemProperties {
    #[must_use]
    pub fn system_name(&self) -> Cow<'_, str> {
        fixed_to_str(&self.system_name)
    }
}

/// Chained onto [`SystemProperties`] to query hand-tracking support.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SystemHandTrackingPropertiesEXT {
    header: OutHeader,
    pub supports_hand_tracking: Bool32,
}

typed_struct! {
    SystemHandTrackingPropertiesEXT: OutHeader
        => sys::SystemHandTrackingPropertiesEXT = SYSTEM_HAND_TRACKING_PROPERTIES_EXT,
    output_only: true,
    fields: [supports_hand_tracking]
}

impl Extends<SystemProperties> for SystemHandTrackingPropertiesEXT {}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SessionCreateInfo {
    header: InHeader,
    pub create_flags: SessionCreateFlags,
    pub system_id: SystemId,
}

typed_struct! {
    SessionCreateInfo: InHeader => sys::SessionCreateInfo = SESSION_CREATE_INFO,
    output_only: false,
    fields: [create_flags, system_id]
}

impl SessionCreateInfo {
    #[must_use]
    pub fn new(create_flags: SessionCreateFlags, system_id: SystemId) -> Self {
        Self {
            header: InHeader::new(Self::TYPE),
            create_flags,
            system_id,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SessionBeginInfo {
    header: InHeader,
    pub primary_view_configuration_type: ViewConfigurationType,
}

typed_struct! {
    SessionBeginInfo: InHeader => sys::SessionBeginInfo = SESSION_BEGIN_INFO,
    output_only: false,
    fields: [primary_view_configuration_type]
}

impl SessionBeginInfo {
    #[must_use]
    pub fn new(primary_view_configuration_type: ViewConfigurationType) -> Self {
        Self {
            header: InHeader::new(Self::TYPE),
            primary_view_configuration_type,
        }
    }
}

// ---------------------------------------------------------------------------
// Space
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ReferenceSpaceCreateInfo {
    header: InHeader,
    pub reference_space_type: ReferenceSpaceType,
    pub pose_in_reference_space: Posef,
}

typed_struct! {
    ReferenceSpaceCreateInfo: InHeader => sys::ReferenceSpaceCreateInfo = REFERENCE_SPACE_CREATE_INFO,
    output_only: false,
    fields: [reference_space_type, pose_in_reference_space]
}

impl ReferenceSpaceCreateInfo {
    #[must_use]
    pub fn new(reference_space_type: ReferenceSpaceType, pose_in_reference_space: Posef) -> Self {
        Self {
            header: InHeader::new(Self::TYPE),
            reference_space_type,
            pose_in_reference_space,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SpaceLocation {
    header: OutHeader,
    pub location_flags: SpaceLocationFlags,
    pub pose: Posef,
}

typed_struct! {
    SpaceLocation: OutHeader => sys::SpaceLocation = SPACE_LOCATION,
    output_only: true,
    fields: [location_flags, pose]
}

// ---------------------------------------------------------------------------
// XR_EXT_hand_tracking
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct HandTrackerCreateInfoEXT {
    header: InHeader,
    pub hand: HandEXT,
    pub hand_joint_set: HandJointSetEXT,
}

typed_struct! {
    HandTrackerCreateInfoEXT: InHeader => sys::HandTrackerCreateInfoEXT = HAND_TRACKER_CREATE_INFO_EXT,
    output_only: false,
    fields: [hand, hand_joint_set]
}

impl HandTrackerCreateInfoEXT {
    #[must_use]
    pub fn new(hand: HandEXT, hand_joint_set: HandJointSetEXT) -> Self {
        Self {
            header: InHeader::new(Self::TYPE),
            hand,
            hand_joint_set,
        }
    }
}

/// Opaque chain link for callers wiring their own extension structs.
#[must_use]
pub fn erase<T>(ext: &mut T) -> *mut c_void {
    (ext as *mut T).cast()
}
