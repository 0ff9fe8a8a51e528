//! In-process simulated runtime.
//!
//! Exports every command as an `extern "system"` entry point behind an
//! `xrGetInstanceProcAddr`-compatible [`resolver`], so the dynamic loader
//! and every projection can be driven end to end without a real loader.
//!
//! State is keyed by instance. Each instance has its own resolution counts,
//! injected results and unresolvable commands, and handle values are unique
//! process-wide, so tests sharing the runtime can run in parallel.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::{CStr, c_char};
use std::mem::transmute;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, const_mutex};
use xrbind_abi::chain::find_in_chain_mut;
use xrbind_abi::dispatch::{
    PFN_xrBeginSession, PFN_xrCreateHandTrackerEXT, PFN_xrCreateInstance,
    PFN_xrCreateReferenceSpace, PFN_xrCreateSession, PFN_xrDestroyHandTrackerEXT,
    PFN_xrDestroyInstance, PFN_xrDestroySession, PFN_xrDestroySpace, PFN_xrEndSession,
    PFN_xrEnumerateReferenceSpaces, PFN_xrGetInstanceProperties, PFN_xrGetSystem,
    PFN_xrGetSystemProperties, PFN_xrLocateSpace, PFN_xrRequestExitSession, PFN_xrResultToString,
};
use xrbind_abi::structs::SystemHandTrackingPropertiesEXT;
use xrbind_abi::sys::{
    self, Bool32, FormFactor, GetInstanceProcAddr, HandEXT, HandJointSetEXT,
    MAX_RESULT_STRING_SIZE, Posef, ReferenceSpaceType, SpaceLocationFlags, StructureType, SystemId,
    Time, Vector3f, Version, ViewConfigurationType, VoidFunction,
};
use xrbind_core::command::EXT_HAND_TRACKING;
use xrbind_core::fixed_string::copy_to_fixed;
use xrbind_core::{Command, HandleKind, ResultCode};

pub const RUNTIME_NAME: &str = "xrbind simulated runtime";
pub const RUNTIME_VERSION: Version = Version::new(0, 1, 0);
pub const SYSTEM_ID: SystemId = SystemId::from_raw(0x5157);
pub const SYSTEM_NAME: &str = "xrbind simulated HMD";
pub const VENDOR_ID: u32 = 0x1209;

/// Reference spaces every session supports, in enumeration order.
pub const REFERENCE_SPACES: [ReferenceSpaceType; 3] = [
    ReferenceSpaceType::VIEW,
    ReferenceSpaceType::LOCAL,
    ReferenceSpaceType::STAGE,
];

const POSE_TOLERANCE: f32 = 1e-3;

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(0x1000);
static STATE: Mutex<SimState> = const_mutex(SimState::new());

#[derive(Debug, Default)]
struct InstanceState {
    hand_tracking: bool,
    resolutions: BTreeMap<Command, u64>,
    unresolvable: BTreeSet<Command>,
    injected: BTreeMap<Command, ResultCode>,
}

#[derive(Debug)]
enum Object {
    Instance(InstanceState),
    Session {
        instance: u64,
        running: bool,
        exit_requested: bool,
    },
    Space {
        instance: u64,
        session: u64,
        pose: Posef,
    },
    HandTracker {
        instance: u64,
        session: u64,
    },
}

impl Object {
    fn kind(&self) -> HandleKind {
        match self {
            Self::Instance(_) => HandleKind::Instance,
            Self::Session { .. } => HandleKind::Session,
            Self::Space { .. } => HandleKind::Space,
            Self::HandTracker { .. } => HandleKind::HandTrackerEXT,
        }
    }

    fn owner(&self, id: u64) -> u64 {
        match self {
            Self::Instance(_) => id,
            Self::Session { instance, .. }
            | Self::Space { instance, .. }
            | Self::HandTracker { instance, .. } => *instance,
        }
    }

    fn parent(&self) -> Option<u64> {
        match self {
            Self::Instance(_) => None,
            Self::Session { instance, .. } => Some(*instance),
            Self::Space { session, .. } | Self::HandTracker { session, .. } => Some(*session),
        }
    }
}

struct SimState {
    objects: BTreeMap<u64, Object>,
    destroyed: BTreeMap<u64, u32>,
}

impl SimState {
    const fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            destroyed: BTreeMap::new(),
        }
    }

    fn instance_mut(&mut self, id: u64) -> Option<&mut InstanceState> {
        match self.objects.get_mut(&id) {
            Some(Object::Instance(state)) => Some(state),
            _ => None,
        }
    }

    /// Validate `handle` as the first parameter of `command` and consume any
    /// result injected for it.
    fn enter(&mut self, handle: u64, command: Command) -> Result<u64, ResultCode> {
        let Some(object) = self.objects.get(&handle) else {
            return Err(ResultCode::ERROR_HANDLE_INVALID);
        };
        if command.info().handle != Some(object.kind()) {
            return Err(ResultCode::ERROR_HANDLE_INVALID);
        }
        let owner = object.owner(handle);
        let injected = self
            .instance_mut(owner)
            .and_then(|state| state.injected.remove(&command));
        match injected {
            Some(code) => Err(code),
            None => Ok(owner),
        }
    }

    fn insert(&mut self, object: Object) -> u64 {
        let id = NEXT_HANDLE.fetch_add(1, Ordering::Relaxed);
        self.objects.insert(id, object);
        id
    }

    /// Remove `handle` and every object created under it.
    fn destroy(&mut self, handle: u64) {
        let mut doomed = vec![handle];
        let mut i = 0;
        while i < doomed.len() {
            let parent = doomed[i];
            doomed.extend(
                self.objects
                    .iter()
                    .filter(|(_, o)| o.parent() == Some(parent))
                    .map(|(id, _)| *id),
            );
            i += 1;
        }
        for id in doomed {
            self.objects.remove(&id);
        }
        *self.destroyed.entry(handle).or_default() += 1;
    }
}

/// Run `body` for a call whose first parameter is `handle`.
fn with_handle(
    handle: u64,
    command: Command,
    body: impl FnOnce(&mut SimState, u64) -> ResultCode,
) -> ResultCode {
    let mut state = STATE.lock();
    match state.enter(handle, command) {
        Ok(owner) => body(&mut state, owner),
        Err(code) => code,
    }
}

// ---------------------------------------------------------------------------
// Inspection and fault injection
// ---------------------------------------------------------------------------

/// The runtime's `xrGetInstanceProcAddr`.
#[must_use]
pub fn resolver() -> GetInstanceProcAddr {
    get_instance_proc_addr
}

/// How many times `command` was resolved for `instance`.
#[must_use]
pub fn resolution_count(instance: sys::Instance, command: Command) -> u64 {
    STATE
        .lock()
        .instance_mut(instance.into_raw())
        .and_then(|state| state.resolutions.get(&command).copied())
        .unwrap_or(0)
}

/// Make the next `command` call under `instance` return `code` untouched.
///
/// Returns `false` if `instance` is not live.
pub fn inject_result(instance: sys::Instance, command: Command, code: ResultCode) -> bool {
    let mut state = STATE.lock();
    match state.instance_mut(instance.into_raw()) {
        Some(inst) => {
            inst.injected.insert(command, code);
            true
        }
        None => false,
    }
}

/// Make `command` unresolvable for `instance` from now on.
pub fn fail_resolution(instance: sys::Instance, command: Command) -> bool {
    let mut state = STATE.lock();
    match state.instance_mut(instance.into_raw()) {
        Some(inst) => {
            inst.unresolvable.insert(command);
            true
        }
        None => false,
    }
}

/// Times the handle with this raw value was explicitly destroyed.
#[must_use]
pub fn destroy_count(raw: u64) -> u32 {
    STATE.lock().destroyed.get(&raw).copied().unwrap_or(0)
}

/// `true` while the handle with this raw value exists.
#[must_use]
pub fn is_live(raw: u64) -> bool {
    STATE.lock().objects.contains_key(&raw)
}

/// Objects owned by `instance`, the instance included.
#[must_use]
pub fn live_count(instance: sys::Instance) -> usize {
    let raw = instance.into_raw();
    STATE
        .lock()
        .objects
        .iter()
        .filter(|(id, o)| o.owner(**id) == raw)
        .count()
}

#[must_use]
pub fn is_running(session: sys::Session) -> bool {
    matches!(
        STATE.lock().objects.get(&session.into_raw()),
        Some(Object::Session { running: true, .. })
    )
}

#[must_use]
pub fn exit_requested(session: sys::Session) -> bool {
    matches!(
        STATE.lock().objects.get(&session.into_raw()),
        Some(Object::Session {
            exit_requested: true,
            ..
        })
    )
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

unsafe extern "system" fn get_instance_proc_addr(
    instance: sys::Instance,
    name: *const c_char,
    function: *mut Option<VoidFunction>,
) -> ResultCode {
    if name.is_null() || function.is_null() {
        return ResultCode::ERROR_VALIDATION_FAILURE;
    }
    // SAFETY: `function` is non-null and writable per the resolver contract.
    unsafe { *function = None };
    // SAFETY: `name` is non-null and NUL-terminated per the resolver contract.
    let name = unsafe { CStr::from_ptr(name) };
    let Some(command) = name.to_str().ok().and_then(Command::from_name) else {
        return ResultCode::ERROR_FUNCTION_UNSUPPORTED;
    };

    if instance.is_null() {
        if command != Command::CreateInstance {
            return ResultCode::ERROR_HANDLE_INVALID;
        }
    } else {
        let mut state = STATE.lock();
        let Some(inst) = state.instance_mut(instance.into_raw()) else {
            return ResultCode::ERROR_HANDLE_INVALID;
        };
        *inst.resolutions.entry(command).or_default() += 1;
        if inst.unresolvable.contains(&command) || (command.is_extension() && !inst.hand_tracking) {
            return ResultCode::ERROR_FUNCTION_UNSUPPORTED;
        }
    }

    // SAFETY: as above.
    unsafe { *function = Some(entry_point(command)) };
    ResultCode::SUCCESS
}

fn entry_point(command: Command) -> VoidFunction {
    // SAFETY: only the signature is erased; callers cast each pointer back to
    // the PFN type of the command it was resolved for.
    unsafe {
        match command {
            Command::CreateInstance => {
                transmute::<PFN_xrCreateInstance, VoidFunction>(create_instance)
            }
            Command::DestroyInstance => {
                transmute::<PFN_xrDestroyInstance, VoidFunction>(destroy_instance)
            }
            Command::ResultToString => {
                transmute::<PFN_xrResultToString, VoidFunction>(result_to_string)
            }
            Command::GetInstanceProperties => {
                transmute::<PFN_xrGetInstanceProperties, VoidFunction>(get_instance_properties)
            }
            Command::GetSystem => transmute::<PFN_xrGetSystem, VoidFunction>(get_system),
            Command::GetSystemProperties => {
                transmute::<PFN_xrGetSystemProperties, VoidFunction>(get_system_properties)
            }
            Command::CreateSession => {
                transmute::<PFN_xrCreateSession, VoidFunction>(create_session)
            }
            Command::DestroySession => {
                transmute::<PFN_xrDestroySession, VoidFunction>(destroy_session)
            }
            Command::BeginSession => transmute::<PFN_xrBeginSession, VoidFunction>(begin_session),
            Command::EndSession => transmute::<PFN_xrEndSession, VoidFunction>(end_session),
            Command::RequestExitSession => {
                transmute::<PFN_xrRequestExitSession, VoidFunction>(request_exit_session)
            }
            Command::EnumerateReferenceSpaces => {
                transmute::<PFN_xrEnumerateReferenceSpaces, VoidFunction>(enumerate_reference_spaces)
            }
            Command::CreateReferenceSpace => {
                transmute::<PFN_xrCreateReferenceSpace, VoidFunction>(create_reference_space)
            }
            Command::DestroySpace => transmute::<PFN_xrDestroySpace, VoidFunction>(destroy_space),
            Command::LocateSpace => transmute::<PFN_xrLocateSpace, VoidFunction>(locate_space),
            Command::CreateHandTrackerEXT => {
                transmute::<PFN_xrCreateHandTrackerEXT, VoidFunction>(create_hand_tracker_ext)
            }
            Command::DestroyHandTrackerEXT => {
                transmute::<PFN_xrDestroyHandTrackerEXT, VoidFunction>(destroy_hand_tracker_ext)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Instance
// ---------------------------------------------------------------------------

unsafe extern "system" fn create_instance(
    create_info: *const sys::InstanceCreateInfo,
    instance: *mut sys::Instance,
) -> ResultCode {
    if create_info.is_null() || instance.is_null() {
        return ResultCode::ERROR_VALIDATION_FAILURE;
    }
    // SAFETY: non-null and live for the call.
    let info = unsafe { &*create_info };
    if info.ty != StructureType::INSTANCE_CREATE_INFO {
        return ResultCode::ERROR_VALIDATION_FAILURE;
    }
    if info.application_info.application_name[0] == 0 {
        return ResultCode::ERROR_NAME_INVALID;
    }
    if info.application_info.api_version.major() != 1 {
        return ResultCode::ERROR_API_VERSION_UNSUPPORTED;
    }
    if info.enabled_api_layer_count > 0 {
        return ResultCode::ERROR_API_LAYER_NOT_PRESENT;
    }
    if info.enabled_extension_count > 0 && info.enabled_extension_names.is_null() {
        return ResultCode::ERROR_VALIDATION_FAILURE;
    }

    let mut hand_tracking = false;
    for i in 0..info.enabled_extension_count as usize {
        // SAFETY: the array holds `enabled_extension_count` terminated names.
        let name = unsafe { CStr::from_ptr(*info.enabled_extension_names.add(i)) };
        if name.to_bytes() != EXT_HAND_TRACKING.as_bytes() {
            return ResultCode::ERROR_EXTENSION_NOT_PRESENT;
        }
        hand_tracking = true;
    }

    let id = STATE.lock().insert(Object::Instance(InstanceState {
        hand_tracking,
        ..InstanceState::default()
    }));
    // SAFETY: non-null output slot.
    unsafe { *instance = sys::Instance::from_raw(id) };
    ResultCode::SUCCESS
}

unsafe extern "system" fn destroy_instance(instance: sys::Instance) -> ResultCode {
    with_handle(instance.into_raw(), Command::DestroyInstance, |state, _| {
        state.destroy(instance.into_raw());
        ResultCode::SUCCESS
    })
}

unsafe extern "system" fn result_to_string(
    instance: sys::Instance,
    value: ResultCode,
    buffer: *mut c_char,
) -> ResultCode {
    with_handle(instance.into_raw(), Command::ResultToString, |_, _| {
        if buffer.is_null() {
            return ResultCode::ERROR_VALIDATION_FAILURE;
        }
        // SAFETY: the caller provides `MAX_RESULT_STRING_SIZE` bytes.
        let buffer = unsafe { &mut *buffer.cast::<[c_char; MAX_RESULT_STRING_SIZE]>() };
        copy_to_fixed(buffer, &value.to_string());
        ResultCode::SUCCESS
    })
}

unsafe extern "system" fn get_instance_properties(
    instance: sys::Instance,
    properties: *mut sys::InstanceProperties,
) -> ResultCode {
    with_handle(instance.into_raw(), Command::GetInstanceProperties, |_, _| {
        if properties.is_null() {
            return ResultCode::ERROR_VALIDATION_FAILURE;
        }
        // SAFETY: non-null and exclusively ours for the call.
        let props = unsafe { &mut *properties };
        if props.ty != StructureType::INSTANCE_PROPERTIES {
            return ResultCode::ERROR_VALIDATION_FAILURE;
        }
        props.runtime_version = RUNTIME_VERSION;
        copy_to_fixed(&mut props.runtime_name, RUNTIME_NAME);
        ResultCode::SUCCESS
    })
}

unsafe extern "system" fn get_system(
    instance: sys::Instance,
    get_info: *const sys::SystemGetInfo,
    system_id: *mut SystemId,
) -> ResultCode {
    with_handle(instance.into_raw(), Command::GetSystem, |_, _| {
        if get_info.is_null() || system_id.is_null() {
            return ResultCode::ERROR_VALIDATION_FAILURE;
        }
        // SAFETY: non-null and live for the call.
        let info = unsafe { &*get_info };
        if info.ty != StructureType::SYSTEM_GET_INFO {
            return ResultCode::ERROR_VALIDATION_FAILURE;
        }
        match info.form_factor {
            FormFactor::HEAD_MOUNTED_DISPLAY => {
                // SAFETY: non-null output slot.
                unsafe { *system_id = SYSTEM_ID };
                ResultCode::SUCCESS
            }
            FormFactor::HANDHELD_DISPLAY => ResultCode::ERROR_FORM_FACTOR_UNSUPPORTED,
            _ => ResultCode::ERROR_VALIDATION_FAILURE,
        }
    })
}

unsafe extern "system" fn get_system_properties(
    instance: sys::Instance,
    system_id: SystemId,
    properties: *mut sys::SystemProperties,
) -> ResultCode {
    with_handle(instance.into_raw(), Command::GetSystemProperties, |state, owner| {
        if properties.is_null() {
            return ResultCode::ERROR_VALIDATION_FAILURE;
        }
        if system_id != SYSTEM_ID {
            return ResultCode::ERROR_SYSTEM_INVALID;
        }
        // SAFETY: non-null and exclusively ours for the call.
        let props = unsafe { &mut *properties };
        if props.ty != StructureType::SYSTEM_PROPERTIES {
            return ResultCode::ERROR_VALIDATION_FAILURE;
        }
        props.system_id = SYSTEM_ID;
        props.vendor_id = VENDOR_ID;
        copy_to_fixed(&mut props.system_name, SYSTEM_NAME);
        props.graphics_properties = sys::SystemGraphicsProperties {
            max_swapchain_image_height: 2048,
            max_swapchain_image_width: 2048,
            max_layer_count: 16,
        };
        props.tracking_properties = sys::SystemTrackingProperties {
            orientation_tracking: Bool32::TRUE,
            position_tracking: Bool32::TRUE,
        };

        let hand_tracking = state
            .instance_mut(owner)
            .is_some_and(|inst| inst.hand_tracking);
        // SAFETY: the caller's output chain is live and exclusively ours.
        if let Some(ext) =
            unsafe { find_in_chain_mut::<SystemHandTrackingPropertiesEXT>(props.next) }
        {
            ext.supports_hand_tracking = Bool32::from(hand_tracking);
        }
        ResultCode::SUCCESS
    })
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

unsafe extern "system" fn create_session(
    instance: sys::Instance,
    create_info: *const sys::SessionCreateInfo,
    session: *mut sys::Session,
) -> ResultCode {
    with_handle(instance.into_raw(), Command::CreateSession, |state, owner| {
        if create_info.is_null() || session.is_null() {
            return ResultCode::ERROR_VALIDATION_FAILURE;
        }
        // SAFETY: non-null and live for the call.
        let info = unsafe { &*create_info };
        if info.ty != StructureType::SESSION_CREATE_INFO {
            return ResultCode::ERROR_VALIDATION_FAILURE;
        }
        if info.system_id != SYSTEM_ID {
            return ResultCode::ERROR_SYSTEM_INVALID;
        }
        let id = state.insert(Object::Session {
            instance: owner,
            running: false,
            exit_requested: false,
        });
        // SAFETY: non-null output slot.
        unsafe { *session = sys::Session::from_raw(id) };
        ResultCode::SUCCESS
    })
}

unsafe extern "system" fn destroy_session(session: sys::Session) -> ResultCode {
    with_handle(session.into_raw(), Command::DestroySession, |state, _| {
        state.destroy(session.into_raw());
        ResultCode::SUCCESS
    })
}

unsafe extern "system" fn begin_session(
    session: sys::Session,
    begin_info: *const sys::SessionBeginInfo,
) -> ResultCode {
    with_handle(session.into_raw(), Command::BeginSession, |state, _| {
        if begin_info.is_null() {
            return ResultCode::ERROR_VALIDATION_FAILURE;
        }
        // SAFETY: non-null and live for the call.
        let info = unsafe { &*begin_info };
        if info.ty != StructureType::SESSION_BEGIN_INFO {
            return ResultCode::ERROR_VALIDATION_FAILURE;
        }
        if !matches!(
            info.primary_view_configuration_type,
            ViewConfigurationType::PRIMARY_MONO | ViewConfigurationType::PRIMARY_STEREO
        ) {
            return ResultCode::ERROR_VIEW_CONFIGURATION_TYPE_UNSUPPORTED;
        }
        match state.objects.get_mut(&session.into_raw()) {
            Some(Object::Session { running: true, .. }) => ResultCode::ERROR_SESSION_RUNNING,
            Some(Object::Session { running, .. }) => {
                *running = true;
                ResultCode::SUCCESS
            }
            _ => ResultCode::ERROR_HANDLE_INVALID,
        }
    })
}

unsafe extern "system" fn end_session(session: sys::Session) -> ResultCode {
    with_handle(session.into_raw(), Command::EndSession, |state, _| {
        match state.objects.get_mut(&session.into_raw()) {
            Some(Object::Session {
                running,
                exit_requested,
                ..
            }) if *running => {
                *running = false;
                *exit_requested = false;
                ResultCode::SUCCESS
            }
            Some(Object::Session { .. }) => ResultCode::ERROR_SESSION_NOT_RUNNING,
            _ => ResultCode::ERROR_HANDLE_INVALID,
        }
    })
}

unsafe extern "system" fn request_exit_session(session: sys::Session) -> ResultCode {
    with_handle(session.into_raw(), Command::RequestExitSession, |state, _| {
        match state.objects.get_mut(&session.into_raw()) {
            Some(Object::Session {
                running,
                exit_requested,
                ..
            }) if *running => {
                *exit_requested = true;
                ResultCode::SUCCESS
            }
            Some(Object::Session { .. }) => ResultCode::ERROR_SESSION_NOT_RUNNING,
            _ => ResultCode::ERROR_HANDLE_INVALID,
        }
    })
}

unsafe extern "system" fn enumerate_reference_spaces(
    session: sys::Session,
    space_capacity_input: u32,
    space_count_output: *mut u32,
    spaces: *mut ReferenceSpaceType,
) -> ResultCode {
    with_handle(session.into_raw(), Command::EnumerateReferenceSpaces, |_, _| {
        if space_count_output.is_null() {
            return ResultCode::ERROR_VALIDATION_FAILURE;
        }
        let available = REFERENCE_SPACES.len();
        // SAFETY: non-null output slot.
        unsafe { *space_count_output = available as u32 };
        if space_capacity_input == 0 {
            return ResultCode::SUCCESS;
        }
        if (space_capacity_input as usize) < available {
            return ResultCode::ERROR_SIZE_INSUFFICIENT;
        }
        if spaces.is_null() {
            return ResultCode::ERROR_VALIDATION_FAILURE;
        }
        // SAFETY: the caller provides `space_capacity_input` >= `available` slots.
        unsafe { std::ptr::copy_nonoverlapping(REFERENCE_SPACES.as_ptr(), spaces, available) };
        ResultCode::SUCCESS
    })
}

// ---------------------------------------------------------------------------
// Space
// ---------------------------------------------------------------------------

unsafe extern "system" fn create_reference_space(
    session: sys::Session,
    create_info: *const sys::ReferenceSpaceCreateInfo,
    space: *mut sys::Space,
) -> ResultCode {
    with_handle(session.into_raw(), Command::CreateReferenceSpace, |state, owner| {
        if create_info.is_null() || space.is_null() {
            return ResultCode::ERROR_VALIDATION_FAILURE;
        }
        // SAFETY: non-null and live for the call.
        let info = unsafe { &*create_info };
        if info.ty != StructureType::REFERENCE_SPACE_CREATE_INFO {
            return ResultCode::ERROR_VALIDATION_FAILURE;
        }
        if !REFERENCE_SPACES.contains(&info.reference_space_type) {
            return ResultCode::ERROR_REFERENCE_SPACE_UNSUPPORTED;
        }
        let pose = info.pose_in_reference_space;
        if (pose.orientation.norm_squared() - 1.0).abs() > POSE_TOLERANCE {
            return ResultCode::ERROR_POSE_INVALID;
        }
        let id = state.insert(Object::Space {
            instance: owner,
            session: session.into_raw(),
            pose,
        });
        // SAFETY: non-null output slot.
        unsafe { *space = sys::Space::from_raw(id) };
        ResultCode::SUCCESS
    })
}

unsafe extern "system" fn destroy_space(space: sys::Space) -> ResultCode {
    with_handle(space.into_raw(), Command::DestroySpace, |state, _| {
        state.destroy(space.into_raw());
        ResultCode::SUCCESS
    })
}

unsafe extern "system" fn locate_space(
    space: sys::Space,
    base_space: sys::Space,
    time: Time,
    location: *mut sys::SpaceLocation,
) -> ResultCode {
    with_handle(space.into_raw(), Command::LocateSpace, |state, _| {
        if location.is_null() {
            return ResultCode::ERROR_VALIDATION_FAILURE;
        }
        let (Some(Object::Space { pose, .. }), Some(Object::Space { pose: base, .. })) = (
            state.objects.get(&space.into_raw()),
            state.objects.get(&base_space.into_raw()),
        ) else {
            return ResultCode::ERROR_HANDLE_INVALID;
        };
        if time.as_nanos() <= 0 {
            return ResultCode::ERROR_TIME_INVALID;
        }
        // SAFETY: non-null and exclusively ours for the call.
        let loc = unsafe { &mut *location };
        if loc.ty != StructureType::SPACE_LOCATION {
            return ResultCode::ERROR_VALIDATION_FAILURE;
        }
        loc.location_flags = SpaceLocationFlags::all();
        loc.pose = Posef {
            orientation: pose.orientation,
            position: Vector3f {
                x: pose.position.x - base.position.x,
                y: pose.position.y - base.position.y,
                z: pose.position.z - base.position.z,
            },
        };
        ResultCode::SUCCESS
    })
}

// ---------------------------------------------------------------------------
// XR_EXT_hand_tracking
// ---------------------------------------------------------------------------

unsafe extern "system" fn create_hand_tracker_ext(
    session: sys::Session,
    create_info: *const sys::HandTrackerCreateInfoEXT,
    hand_tracker: *mut sys::HandTrackerEXT,
) -> ResultCode {
    with_handle(session.into_raw(), Command::CreateHandTrackerEXT, |state, owner| {
        if create_info.is_null() || hand_tracker.is_null() {
            return ResultCode::ERROR_VALIDATION_FAILURE;
        }
        // SAFETY: non-null and live for the call.
        let info = unsafe { &*create_info };
        if info.ty != StructureType::HAND_TRACKER_CREATE_INFO_EXT
            || !matches!(info.hand, HandEXT::LEFT | HandEXT::RIGHT)
            || info.hand_joint_set != HandJointSetEXT::DEFAULT
        {
            return ResultCode::ERROR_VALIDATION_FAILURE;
        }
        let id = state.insert(Object::HandTracker {
            instance: owner,
            session: session.into_raw(),
        });
        // SAFETY: non-null output slot.
        unsafe { *hand_tracker = sys::HandTrackerEXT::from_raw(id) };
        ResultCode::SUCCESS
    })
}

unsafe extern "system" fn destroy_hand_tracker_ext(hand_tracker: sys::HandTrackerEXT) -> ResultCode {
    with_handle(hand_tracker.into_raw(), Command::DestroyHandTrackerEXT, |state, _| {
        state.destroy(hand_tracker.into_raw());
        ResultCode::SUCCESS
    })
}

#[cfg(test)]
mod tests {
    use std::ptr;

    use super::*;

    fn resolve(instance: sys::Instance, name: &CStr) -> (ResultCode, Option<VoidFunction>) {
        let mut function = None;
        // SAFETY: valid name and output slot.
        let code = unsafe { get_instance_proc_addr(instance, name.as_ptr(), &mut function) };
        (code, function)
    }

    fn new_instance(extensions: &[*const c_char]) -> sys::Instance {
        let mut info = sys::InstanceCreateInfo::default();
        info.ty = StructureType::INSTANCE_CREATE_INFO;
        copy_to_fixed(&mut info.application_info.application_name, "sim-test");
        info.application_info.api_version = Version::new(1, 0, 0);
        info.enabled_extension_count = extensions.len() as u32;
        info.enabled_extension_names = extensions.as_ptr();
        let mut instance = sys::Instance::NULL;
        // SAFETY: `info` and its name array are live for the call.
        let code = unsafe { create_instance(&info, &mut instance) };
        assert_eq!(code, ResultCode::SUCCESS);
        instance
    }

    #[test]
    fn null_instance_resolves_only_create_instance() {
        let (code, f) = resolve(sys::Instance::NULL, c"xrCreateInstance");
        assert_eq!(code, ResultCode::SUCCESS);
        assert!(f.is_some());

        let (code, f) = resolve(sys::Instance::NULL, c"xrDestroyInstance");
        assert_eq!(code, ResultCode::ERROR_HANDLE_INVALID);
        assert!(f.is_none());
    }

    #[test]
    fn unknown_names_are_unsupported() {
        let instance = new_instance(&[]);
        let (code, f) = resolve(instance, c"xrNotACommand");
        assert_eq!(code, ResultCode::ERROR_FUNCTION_UNSUPPORTED);
        assert!(f.is_none());
    }

    #[test]
    fn extension_commands_need_the_extension() {
        let plain = new_instance(&[]);
        assert_eq!(
            resolve(plain, c"xrCreateHandTrackerEXT").0,
            ResultCode::ERROR_FUNCTION_UNSUPPORTED
        );

        let names = [c"XR_EXT_hand_tracking".as_ptr()];
        let tracked = new_instance(&names);
        assert_eq!(resolve(tracked, c"xrCreateHandTrackerEXT").0, ResultCode::SUCCESS);
        assert_eq!(resolution_count(tracked, Command::CreateHandTrackerEXT), 1);
    }

    #[test]
    fn unknown_extension_fails_instance_creation() {
        let names = [c"XR_KHR_not_here".as_ptr()];
        let mut info = sys::InstanceCreateInfo::default();
        info.ty = StructureType::INSTANCE_CREATE_INFO;
        copy_to_fixed(&mut info.application_info.application_name, "sim-test");
        info.application_info.api_version = Version::new(1, 0, 0);
        info.enabled_extension_count = 1;
        info.enabled_extension_names = names.as_ptr();
        let mut instance = sys::Instance::NULL;
        // SAFETY: `info` and its name array are live for the call.
        let code = unsafe { create_instance(&info, &mut instance) };
        assert_eq!(code, ResultCode::ERROR_EXTENSION_NOT_PRESENT);
        assert!(instance.is_null());
    }

    #[test]
    fn destroying_an_instance_removes_its_children() {
        let instance = new_instance(&[]);
        let mut info = sys::SessionCreateInfo::default();
        info.ty = StructureType::SESSION_CREATE_INFO;
        info.system_id = SYSTEM_ID;
        let mut session = sys::Session::NULL;
        // SAFETY: live arguments.
        assert_eq!(unsafe { create_session(instance, &info, &mut session) }, ResultCode::SUCCESS);
        assert_eq!(live_count(instance), 2);

        // SAFETY: live handle.
        assert_eq!(unsafe { destroy_instance(instance) }, ResultCode::SUCCESS);
        assert!(!is_live(session.into_raw()));
        assert_eq!(destroy_count(instance.into_raw()), 1);
        assert_eq!(destroy_count(session.into_raw()), 0);

        // SAFETY: stale handle, rejected without dereferencing.
        assert_eq!(unsafe { destroy_instance(instance) }, ResultCode::ERROR_HANDLE_INVALID);
    }

    #[test]
    fn injected_result_is_returned_once() {
        let instance = new_instance(&[]);
        assert!(inject_result(instance, Command::GetSystem, ResultCode::ERROR_RUNTIME_FAILURE));
        let mut info = sys::SystemGetInfo::default();
        info.ty = StructureType::SYSTEM_GET_INFO;
        info.form_factor = FormFactor::HEAD_MOUNTED_DISPLAY;
        let mut id = SystemId::NULL;
        // SAFETY: live arguments.
        unsafe {
            assert_eq!(get_system(instance, &info, &mut id), ResultCode::ERROR_RUNTIME_FAILURE);
            assert_eq!(id, SystemId::NULL);
            assert_eq!(get_system(instance, &info, &mut id), ResultCode::SUCCESS);
        }
        assert_eq!(id, SYSTEM_ID);
    }

    #[test]
    fn handle_kind_is_checked() {
        let instance = new_instance(&[]);
        // SAFETY: the handle value is looked up, never dereferenced.
        let code = unsafe { destroy_session(sys::Session::from_raw(instance.into_raw())) };
        assert_eq!(code, ResultCode::ERROR_HANDLE_INVALID);
        assert!(is_live(instance.into_raw()));
    }

    #[test]
    fn two_call_enumeration_reports_short_buffers() {
        let instance = new_instance(&[]);
        let mut info = sys::SessionCreateInfo::default();
        info.ty = StructureType::SESSION_CREATE_INFO;
        info.system_id = SYSTEM_ID;
        let mut session = sys::Session::NULL;
        let mut count = 0;
        let mut short = [ReferenceSpaceType::default(); 2];
        // SAFETY: live arguments with matching capacities.
        unsafe {
            assert_eq!(create_session(instance, &info, &mut session), ResultCode::SUCCESS);
            assert_eq!(
                enumerate_reference_spaces(session, 0, &mut count, ptr::null_mut()),
                ResultCode::SUCCESS
            );
            assert_eq!(count, 3);
            assert_eq!(
                enumerate_reference_spaces(session, 2, &mut count, short.as_mut_ptr()),
                ResultCode::ERROR_SIZE_INSUFFICIENT
            );
        }
        assert_eq!(short, [ReferenceSpaceType::default(); 2]);
    }
}
