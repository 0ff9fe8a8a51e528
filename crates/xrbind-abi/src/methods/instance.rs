use std::ffi::c_char;

use xrbind_core::ResultCode;
use xrbind_core::fixed_string::fixed_to_str;
use xrbind_core::policy::{ActivePolicy, ResultPolicy, ResultValueType, VoidResult};

use crate::dispatch::Dispatch;
use crate::handle::{Instance, Session};
use crate::structs::{
    InstanceProperties, SessionCreateInfo, StructWrapper, SystemGetInfo, SystemProperties,
};
use crate::sys::{MAX_RESULT_STRING_SIZE, SystemId};
#[cfg(feature = "smart-handle")]
use crate::unique::{ObjectDestroy, UniqueSession, create_unique_result_value};

impl Instance {
    /// `xrDestroyInstance`.
    ///
    /// # Safety
    ///
    /// `self` is live, created through `d`, and not used afterwards.
    pub unsafe fn destroy_raw<D: Dispatch + ?Sized>(self, d: &D) -> ResultCode {
        // SAFETY: caller contract.
        unsafe { d.destroy_instance(self.get()) }
    }

    /// # Safety
    ///
    /// As for [`Instance::destroy_raw`].
    pub unsafe fn destroy<D: Dispatch + ?Sized>(self, d: &D) -> VoidResult {
        // SAFETY: forwarded caller contract.
        let result = unsafe { self.destroy_raw(d) };
        ActivePolicy::void(result, "xrbind::Instance::destroy")
    }

    /// `xrResultToString` into a caller buffer.
    ///
    /// # Safety
    ///
    /// `self` is live and created through `d`.
    pub unsafe fn result_to_string_raw<D: Dispatch + ?Sized>(
        self,
        d: &D,
        value: ResultCode,
        buffer: &mut [c_char; MAX_RESULT_STRING_SIZE],
    ) -> ResultCode {
        // SAFETY: caller contract; the buffer has the required size.
        unsafe { d.result_to_string(self.get(), value, buffer.as_mut_ptr()) }
    }

    /// The runtime's name for `value`.
    ///
    /// # Safety
    ///
    /// As for [`Instance::result_to_string_raw`].
    pub unsafe fn result_to_string<D: Dispatch + ?Sized>(
        self,
        d: &D,
        value: ResultCode,
    ) -> ResultValueType<String> {
        let mut buffer = [0 as c_char; MAX_RESULT_STRING_SIZE];
        // SAFETY: forwarded caller contract.
        let result = unsafe { self.result_to_string_raw(d, value, &mut buffer) };
        ActivePolicy::value_map(result, buffer, "xrbind::Instance::result_to_string", |b| {
            fixed_to_str(&b).into_owned()
        })
    }

    /// `xrGetInstanceProperties` into `properties`, keeping its chain.
    ///
    /// # Safety
    ///
    /// `self` is live and created through `d`; `properties`' chain is live.
    pub unsafe fn get_instance_properties_raw<D: Dispatch + ?Sized>(
        self,
        d: &D,
        properties: &mut InstanceProperties,
    ) -> ResultCode {
        // SAFETY: caller contract.
        unsafe { d.get_instance_properties(self.get(), properties.put(true)) }
    }

    /// # Safety
    ///
    /// `self` is live and created through `d`.
    pub unsafe fn get_instance_properties<D: Dispatch + ?Sized>(
        self,
        d: &D,
    ) -> ResultValueType<InstanceProperties> {
        let mut properties = InstanceProperties::default();
        // SAFETY: forwarded caller contract; no chain.
        let result = unsafe { self.get_instance_properties_raw(d, &mut properties) };
        ActivePolicy::value(result, properties, "xrbind::Instance::get_instance_properties")
    }

    /// `xrGetSystem`.
    ///
    /// # Safety
    ///
    /// `self` is live and created through `d`; `get_info`'s chain is live.
    pub unsafe fn get_system_raw<D: Dispatch + ?Sized>(
        self,
        d: &D,
        get_info: &SystemGetInfo,
        system_id: &mut SystemId,
    ) -> ResultCode {
        // SAFETY: caller contract.
        unsafe { d.get_system(self.get(), get_info.get(), system_id) }
    }

    /// # Safety
    ///
    /// As for [`Instance::get_system_raw`].
    pub unsafe fn get_system<D: Dispatch + ?Sized>(
        self,
        d: &D,
        get_info: &SystemGetInfo,
    ) -> ResultValueType<SystemId> {
        let mut system_id = SystemId::NULL;
        // SAFETY: forwarded caller contract.
        let result = unsafe { self.get_system_raw(d, get_info, &mut system_id) };
        ActivePolicy::value(result, system_id, "xrbind::Instance::get_system")
    }

    /// `xrGetSystemProperties` into `properties`.
    ///
    /// `properties` is reset first but its chain is kept, so extension
    /// structs linked onto it are filled in as well.
    ///
    /// # Safety
    ///
    /// `self` is live and created through `d`; `properties`' chain is live.
    pub unsafe fn get_system_properties_raw<D: Dispatch + ?Sized>(
        self,
        d: &D,
        system_id: SystemId,
        properties: &mut SystemProperties,
    ) -> ResultCode {
        // SAFETY: caller contract.
        unsafe { d.get_system_properties(self.get(), system_id, properties.put(true)) }
    }

    /// # Safety
    ///
    /// `self` is live and created through `d`.
    pub unsafe fn get_system_properties<D: Dispatch + ?Sized>(
        self,
        d: &D,
        system_id: SystemId,
    ) -> ResultValueType<SystemProperties> {
        let mut properties = SystemProperties::default();
        // SAFETY: forwarded caller contract; no chain.
        let result = unsafe { self.get_system_properties_raw(d, system_id, &mut properties) };
        ActivePolicy::value(result, properties, "xrbind::Instance::get_system_properties")
    }

    /// `xrCreateSession`, writing the new handle into `session`.
    ///
    /// # Safety
    ///
    /// `self` is live and created through `d`; `create_info`'s chain is live.
    pub unsafe fn create_session_raw<D: Dispatch + ?Sized>(
        self,
        d: &D,
        create_info: &SessionCreateInfo,
        session: &mut Session,
    ) -> ResultCode {
        // SAFETY: caller contract.
        unsafe { d.create_session(self.get(), create_info.get(), session.put()) }
    }

    /// # Safety
    ///
    /// As for [`Instance::create_session_raw`].
    pub unsafe fn create_session<D: Dispatch + ?Sized>(
        self,
        d: &D,
        create_info: &SessionCreateInfo,
    ) -> ResultValueType<Session> {
        let mut session = Session::NULL;
        // SAFETY: forwarded caller contract.
        let result = unsafe { self.create_session_raw(d, create_info, &mut session) };
        ActivePolicy::value(result, session, "xrbind::Instance::create_session")
    }

    /// # Safety
    ///
    /// As for [`Instance::create_session_raw`].
    #[cfg(feature = "smart-handle")]
    pub unsafe fn create_session_unique<'d, D: Dispatch + ?Sized>(
        self,
        d: &'d D,
        create_info: &SessionCreateInfo,
    ) -> ResultValueType<UniqueSession<'d, D>> {
        let mut session = Session::NULL;
        // SAFETY: forwarded caller contract.
        let result = unsafe { self.create_session_raw(d, create_info, &mut session) };
        // SAFETY: the session was created through `d` and is owned only here.
        let deleter = unsafe { ObjectDestroy::new(d) };
        create_unique_result_value(result, session, "xrbind::Instance::create_session_unique", deleter)
    }
}
