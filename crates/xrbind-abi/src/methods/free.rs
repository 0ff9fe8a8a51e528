use xrbind_core::ResultCode;
use xrbind_core::policy::{ActivePolicy, ResultPolicy, ResultValueType};

use crate::dispatch::Dispatch;
use crate::handle::Instance;
use crate::structs::{InstanceCreateInfo, StructWrapper};
#[cfg(feature = "smart-handle")]
use crate::unique::{ObjectDestroy, UniqueInstance, create_unique_result_value};

/// `xrCreateInstance`, writing the new handle into `instance`.
///
/// # Safety
///
/// `create_info`'s name arrays and chain must be live.
pub unsafe fn create_instance_raw<D: Dispatch + ?Sized>(
    d: &D,
    create_info: &InstanceCreateInfo,
    instance: &mut Instance,
) -> ResultCode {
    // SAFETY: caller contract; `put` exposes writable handle storage.
    unsafe { d.create_instance(create_info.get(), instance.put()) }
}

/// `xrCreateInstance`.
///
/// # Safety
///
/// As for [`create_instance_raw`].
pub unsafe fn create_instance<D: Dispatch + ?Sized>(
    d: &D,
    create_info: &InstanceCreateInfo,
) -> ResultValueType<Instance> {
    let mut instance = Instance::NULL;
    // SAFETY: forwarded caller contract.
    let result = unsafe { create_instance_raw(d, create_info, &mut instance) };
    ActivePolicy::value(result, instance, "xrbind::create_instance")
}

/// `xrCreateInstance`, owning the result. The instance is destroyed through
/// `d` when the owner drops.
///
/// # Safety
///
/// As for [`create_instance_raw`].
#[cfg(feature = "smart-handle")]
pub unsafe fn create_instance_unique<'d, D: Dispatch + ?Sized>(
    d: &'d D,
    create_info: &InstanceCreateInfo,
) -> ResultValueType<UniqueInstance<'d, D>> {
    let mut instance = Instance::NULL;
    // SAFETY: forwarded caller contract.
    let result = unsafe { create_instance_raw(d, create_info, &mut instance) };
    // SAFETY: the handle was created through `d` and is owned only here.
    let deleter = unsafe { ObjectDestroy::new(d) };
    create_unique_result_value(result, instance, "xrbind::create_instance_unique", deleter)
}
