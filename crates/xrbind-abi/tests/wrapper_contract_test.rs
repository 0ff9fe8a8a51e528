//! Integration test: wrapper values cross the ABI unchanged.
//!
//! Handles and structs must be usable wherever the raw type is expected,
//! and output structs must keep their chain across `put(true)`.
//!
//! Run: cargo test -p xrbind-abi --test wrapper_contract_test

use std::mem::{align_of, size_of};

use xrbind_abi::chain::{ChainNode, chain, find_in_chain};
use xrbind_abi::structs::{
    ApplicationInfo, InstanceCreateInfo, SessionCreateInfo, SpaceLocation,
    SystemHandTrackingPropertiesEXT, SystemProperties, erase,
};
use xrbind_abi::sys::{self, Bool32, SessionCreateFlags, StructureType, SystemId, Version};
use xrbind_abi::{Handle, NullHandle, Session, Space, StructWrapper, Transparent, TypedStruct};

#[test]
fn handle_slices_reinterpret_as_raw() {
    let wrapped = [Space::from_raw(sys::Space::from_raw(7)), Space::NULL];
    let raw: &[sys::Space] = {
        // SAFETY: `Space` is `#[repr(transparent)]` over `sys::Space`.
        unsafe { std::slice::from_raw_parts(wrapped.as_ptr().cast(), wrapped.len()) }
    };
    assert_eq!(raw[0].into_raw(), 7);
    assert!(raw[1].is_null());
    assert_eq!(size_of::<Space>(), size_of::<u64>());
    assert_eq!(align_of::<Session>(), align_of::<sys::Session>());
}

#[test]
fn null_handle_compares_in_both_orders() {
    let mut session = Session::from_raw(sys::Session::from_raw(3));
    assert!(session != NullHandle);
    assert!(NullHandle != session);
    assert!(session.is_some());

    let out = session.put();
    assert!(session == NullHandle);
    // SAFETY: `out` points at `session`'s storage, which is still live.
    unsafe { *out = sys::Session::from_raw(9) };
    assert_eq!(session.get().into_raw(), 9);
}

#[test]
fn typed_defaults_carry_their_tag() {
    assert_eq!(
        SessionCreateInfo::default().structure_type(),
        StructureType::SESSION_CREATE_INFO
    );
    assert_eq!(
        SystemHandTrackingPropertiesEXT::TYPE,
        StructureType::SYSTEM_HAND_TRACKING_PROPERTIES_EXT
    );
    let info = SessionCreateInfo::new(SessionCreateFlags::empty(), SystemId::from_raw(4));
    assert_eq!(info.get_base().ty, StructureType::SESSION_CREATE_INFO);
    assert!(info.get_base().next.is_null());
    // SAFETY: `get` returns a pointer to `info`, which is live here.
    assert_eq!(unsafe { (*info.get()).system_id }, SystemId::from_raw(4));
}

#[test]
fn put_with_clear_keeps_the_chain() {
    let mut hand = SystemHandTrackingPropertiesEXT::default();
    let mut props = SystemProperties::default();
    props.push_next(&mut hand);
    props.vendor_id = 0x1234;
    props.system_name[0] = b'x' as _;

    let raw = props.put(true);
    // SAFETY: `raw` points at `props`.
    let raw = unsafe { &*raw };
    assert_eq!(raw.ty, StructureType::SYSTEM_PROPERTIES);
    assert_eq!(raw.vendor_id, 0);
    assert_eq!(raw.system_name[0], 0);
    assert_eq!(raw.next, erase(&mut hand));
}

#[test]
fn put_without_clear_touches_nothing() {
    let mut location = SpaceLocation::default();
    location.pose.position.x = 2.5;
    let raw = location.put(false);
    // SAFETY: `raw` points at `location`.
    assert_eq!(unsafe { (*raw).pose.position.x }, 2.5);
}

#[test]
fn push_next_inserts_after_head() {
    let mut first = SystemHandTrackingPropertiesEXT::default();
    let mut second = SystemHandTrackingPropertiesEXT::default();
    second.supports_hand_tracking = Bool32::TRUE;
    let mut props = SystemProperties::default();
    props.push_next(&mut first);
    props.push_next(&mut second);

    // SAFETY: every link points at a live local.
    let kinds: Vec<StructureType> = unsafe { chain(&props) }.map(|n| n.structure_type()).collect();
    assert_eq!(kinds.len(), 2);

    // SAFETY: as above.
    let found = unsafe { find_in_chain::<SystemHandTrackingPropertiesEXT, _>(&props) };
    assert_eq!(found.map(|h| h.supports_hand_tracking), Some(Bool32::TRUE));

    // SAFETY: as above.
    let head = unsafe { chain(&props) }.next();
    assert!(matches!(head, Some(ChainNode::SystemHandTrackingPropertiesEXT(_))));
}

#[test]
fn instance_create_info_borrows_name_arrays() {
    let ext = c"XR_EXT_hand_tracking";
    let names = [ext.as_ptr()];
    let app = ApplicationInfo::new("demo", 1, "engine", 2, Version::new(1, 0, 0));
    let info = InstanceCreateInfo::new(sys::InstanceCreateFlags::empty(), app, &[], &names);
    assert_eq!(info.enabled_extension_count, 1);
    assert_eq!(info.enabled_api_layer_count, 0);
    assert_eq!(info.enabled_extension_names, names.as_ptr());
    assert_eq!(info.application_info.application_name(), "demo");

    let raw: &sys::InstanceCreateInfo = info.as_raw();
    assert_eq!(raw.application_info.engine_version, 2);
}

#[test]
fn from_raw_and_assign_copy_whole_struct() {
    let mut raw = sys::SystemProperties::default();
    raw.ty = StructureType::SYSTEM_PROPERTIES;
    raw.vendor_id = 77;
    let mut props = SystemProperties::from_raw(&raw);
    assert_eq!(props.vendor_id, 77);

    raw.vendor_id = 78;
    props.assign_from_raw(&raw);
    assert_eq!(props.vendor_id, 78);
    assert_eq!(SystemProperties::from_raw_ref(&raw).vendor_id, 78);
}
