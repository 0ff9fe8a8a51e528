//! Conformance scenario engine.
//!
//! Drives every projection against the simulated runtime through a
//! [`DispatchLoaderDynamic`] and records one check per expectation. Failure
//! paths go through the `*_raw` projections so the same scenario runs under
//! either result policy.

use std::fmt::Display;
use std::time::Instant;

use serde::Serialize;
use xrbind_abi::structs::{
    ApplicationInfo, HandTrackerCreateInfoEXT, InstanceCreateInfo, ReferenceSpaceCreateInfo,
    SessionBeginInfo, SessionCreateInfo, SpaceLocation, SystemGetInfo,
    SystemHandTrackingPropertiesEXT, SystemProperties, TypedStruct, erase,
};
use xrbind_abi::sys::{
    self, Bool32, FormFactor, HandEXT, HandJointSetEXT, InstanceCreateFlags, Posef, Quaternionf,
    ReferenceSpaceType, SessionCreateFlags, SpaceLocationFlags, SystemId, Time, Vector3f,
    ViewConfigurationType,
};
use xrbind_abi::{
    BindingConfig, Dispatch, DispatchLoaderDynamic, Instance, IntoCodedResult, IntoResult,
    LoaderStatsSnapshot, PopulationMode, ResultCode, Space, methods,
};
use xrbind_core::Command;

use crate::sim_runtime;
use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome, Projection};

/// Application name the scenario registers with.
pub const APPLICATION_NAME: &str = "xrbind-conformance";

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("log I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("{context}: {source}")]
    Binding {
        context: &'static str,
        #[source]
        source: xrbind_core::Error,
    },
}

trait Context<T> {
    fn context(self, context: &'static str) -> Result<T, HarnessError>;
}

impl<T> Context<T> for Result<T, xrbind_core::Error> {
    fn context(self, context: &'static str) -> Result<T, HarnessError> {
        self.map_err(|source| HarnessError::Binding { context, source })
    }
}

/// One recorded expectation.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub command: String,
    pub projection: Projection,
    pub expected: String,
    pub actual: String,
    pub passed: bool,
}

/// Outcome of a full scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub campaign: String,
    pub run_id: String,
    pub error_mode: &'static str,
    pub population: &'static str,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Resolver calls made by the instance loader.
    pub resolutions: u64,
    pub table_hits: u64,
    pub resolution_failures: u64,
    pub duration_ms: u64,
    pub checks: Vec<CheckResult>,
}

impl RunSummary {
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Names of the failed checks.
    #[must_use]
    pub fn failures(&self) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.name.as_str())
            .collect()
    }
}

/// Runs the conformance scenario with one population mode.
pub struct ConformanceRunner {
    pub campaign: String,
    pub population: PopulationMode,
}

impl ConformanceRunner {
    #[must_use]
    pub fn new(campaign: impl Into<String>, population: PopulationMode) -> Self {
        Self {
            campaign: campaign.into(),
            population,
        }
    }

    /// Run the scenario, logging every check to `log`.
    ///
    /// Check failures are reported in the summary; `Err` means the scenario
    /// could not continue.
    pub fn run(&self, log: &mut LogEmitter) -> Result<RunSummary, HarnessError> {
        let started = Instant::now();
        let error_mode = BindingConfig::ACTIVE.error_mode.as_str();
        let population = self.population.as_str();
        log.emit_entry(
            LogEntry::new("", LogLevel::Info, "run_start")
                .with_modes(error_mode, population)
                .with_details(serde_json::json!({ "campaign": self.campaign })),
        )?;

        let mut rec = Recorder {
            log,
            error_mode,
            population,
            checks: Vec::new(),
        };
        let stats = scenario(&mut rec, self.population)?;
        let checks = rec.checks;

        let passed = checks.iter().filter(|c| c.passed).count();
        let summary = RunSummary {
            campaign: self.campaign.clone(),
            run_id: log.run_id().to_string(),
            error_mode,
            population,
            total: checks.len(),
            passed,
            failed: checks.len() - passed,
            resolutions: stats.resolutions,
            table_hits: stats.hits,
            resolution_failures: stats.failures,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            checks,
        };

        let level = if summary.all_passed() {
            LogLevel::Info
        } else {
            LogLevel::Error
        };
        log.emit_entry(
            LogEntry::new("", level, "run_end")
                .with_modes(error_mode, population)
                .with_outcome(if summary.all_passed() {
                    Outcome::Pass
                } else {
                    Outcome::Fail
                })
                .with_details(serde_json::json!({
                    "total": summary.total,
                    "failed": summary.failed,
                    "resolutions": summary.resolutions,
                })),
        )?;
        log.flush()?;
        Ok(summary)
    }
}

struct Recorder<'a> {
    log: &'a mut LogEmitter,
    error_mode: &'static str,
    population: &'static str,
    checks: Vec<CheckResult>,
}

impl Recorder<'_> {
    /// Record that `command` returned `actual` where `expected` was due.
    fn code(
        &mut self,
        name: &str,
        command: Command,
        projection: Projection,
        actual: ResultCode,
        expected: ResultCode,
    ) -> std::io::Result<bool> {
        self.record(
            name,
            command,
            projection,
            Some(actual),
            actual == expected,
            expected,
            actual,
        )
    }

    /// Record an arbitrary expectation about `command`.
    fn that(
        &mut self,
        name: &str,
        command: Command,
        projection: Projection,
        passed: bool,
        expected: impl Display,
        actual: impl Display,
    ) -> std::io::Result<bool> {
        self.record(name, command, projection, None, passed, expected, actual)
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        &mut self,
        name: &str,
        command: Command,
        projection: Projection,
        code: Option<ResultCode>,
        passed: bool,
        expected: impl Display,
        actual: impl Display,
    ) -> std::io::Result<bool> {
        let check = CheckResult {
            name: name.to_string(),
            command: command.name().to_string(),
            projection,
            expected: expected.to_string(),
            actual: actual.to_string(),
            passed,
        };
        let mut entry = LogEntry::new("", if passed { LogLevel::Info } else { LogLevel::Error }, name)
            .with_modes(self.error_mode, self.population)
            .with_command(command.name(), projection)
            .with_outcome(if passed { Outcome::Pass } else { Outcome::Fail });
        if let Some(code) = code {
            entry = entry.with_result(code);
        }
        if !passed {
            entry = entry.with_details(serde_json::json!({
                "expected": check.expected,
                "actual": check.actual,
            }));
        }
        self.log.emit_entry(entry)?;
        self.checks.push(check);
        Ok(passed)
    }
}

fn identity_offset(x: f32, y: f32, z: f32) -> Posef {
    Posef {
        orientation: Quaternionf::IDENTITY,
        position: Vector3f { x, y, z },
    }
}

fn scenario(
    rec: &mut Recorder<'_>,
    population: PopulationMode,
) -> Result<LoaderStatsSnapshot, HarnessError> {
    // Instance creation goes through a loader bound to no instance.
    // SAFETY: the simulated resolver matches the loader contract and lives
    // for the whole process.
    let bootstrap = unsafe { DispatchLoaderDynamic::new(sys::Instance::NULL, sim_runtime::resolver()) };
    let ext = c"XR_EXT_hand_tracking";
    let extensions = [ext.as_ptr()];
    let app = ApplicationInfo::new(APPLICATION_NAME, 1, "xrbind", 1, sys::CURRENT_API_VERSION);
    let create_info = InstanceCreateInfo::new(InstanceCreateFlags::empty(), app, &[], &extensions);

    let unknown = [c"XR_KHR_not_present".as_ptr()];
    let bad_info = InstanceCreateInfo::new(InstanceCreateFlags::empty(), app, &[], &unknown);
    let mut rejected = Instance::NULL;
    // SAFETY: the name arrays outlive the call.
    let code = unsafe { methods::create_instance_raw(&bootstrap, &bad_info, &mut rejected) };
    rec.code(
        "create_instance_unknown_extension",
        Command::CreateInstance,
        Projection::Raw,
        code,
        ResultCode::ERROR_EXTENSION_NOT_PRESENT,
    )?;

    // SAFETY: as above.
    let instance = unsafe { methods::create_instance(&bootstrap, &create_info) }
        .into_result()
        .context("create_instance")?;
    rec.that(
        "create_instance",
        Command::CreateInstance,
        Projection::Value,
        !instance.is_null() && sim_runtime::is_live(instance.get().into_raw()),
        "live instance",
        format!("{:?}", instance.get()),
    )?;

    // SAFETY: as for `bootstrap`.
    let d = unsafe {
        DispatchLoaderDynamic::with_mode(instance.get(), sim_runtime::resolver(), population)
    };
    let expected_populated = if population.is_eager() { Command::COUNT } else { 0 };
    rec.that(
        "loader_initial_population",
        Command::CreateInstance,
        Projection::Loader,
        d.populated_count() == expected_populated,
        expected_populated,
        d.populated_count(),
    )?;

    if !population.is_eager() {
        // SAFETY: the session handle is never dereferenced; the call stops at
        // the empty slot.
        let code = unsafe { d.read_only().end_session(sys::Session::NULL) };
        rec.code(
            "read_only_skips_resolution",
            Command::EndSession,
            Projection::Loader,
            code,
            ResultCode::ERROR_FUNCTION_UNSUPPORTED,
        )?;
    }

    instance_checks(rec, &d, instance)?;
    session_checks(rec, &d, instance)?;

    rec.that(
        "commands_resolve_once",
        Command::LocateSpace,
        Projection::Loader,
        sim_runtime::resolution_count(instance.get(), Command::LocateSpace) == 1,
        1,
        sim_runtime::resolution_count(instance.get(), Command::LocateSpace),
    )?;

    let stats = d.stats();
    // SAFETY: everything created under the instance has been released.
    let destroyed = unsafe { instance.destroy(&d) }.into_result().is_ok();
    rec.that(
        "destroy_instance",
        Command::DestroyInstance,
        Projection::Value,
        destroyed && !sim_runtime::is_live(instance.get().into_raw()),
        "destroyed",
        if destroyed { "destroyed" } else { "still live" },
    )?;
    // SAFETY: the handle is stale; the runtime rejects it without using it.
    let code = unsafe { instance.destroy_raw(&d) };
    rec.code(
        "destroy_instance_twice",
        Command::DestroyInstance,
        Projection::Raw,
        code,
        ResultCode::ERROR_HANDLE_INVALID,
    )?;
    Ok(stats)
}

fn instance_checks(
    rec: &mut Recorder<'_>,
    d: &DispatchLoaderDynamic,
    instance: Instance,
) -> Result<(), HarnessError> {
    // SAFETY (whole function): `instance` is live and was created through
    // the same runtime `d` resolves against; every struct passed is a local.
    let name = unsafe { instance.result_to_string(d, ResultCode::ERROR_HANDLE_INVALID) }
        .into_result()
        .context("result_to_string")?;
    rec.that(
        "result_to_string",
        Command::ResultToString,
        Projection::Value,
        name == "XR_ERROR_HANDLE_INVALID",
        "XR_ERROR_HANDLE_INVALID",
        &name,
    )?;

    let props = unsafe { instance.get_instance_properties(d) }
        .into_result()
        .context("get_instance_properties")?;
    rec.that(
        "get_instance_properties",
        Command::GetInstanceProperties,
        Projection::Value,
        props.runtime_name() == sim_runtime::RUNTIME_NAME
            && props.runtime_version == sim_runtime::RUNTIME_VERSION,
        sim_runtime::RUNTIME_NAME,
        props.runtime_name(),
    )?;

    let hmd = SystemGetInfo::new(FormFactor::HEAD_MOUNTED_DISPLAY);
    let system_id = unsafe { instance.get_system(d, &hmd) }
        .into_result()
        .context("get_system")?;
    rec.that(
        "get_system",
        Command::GetSystem,
        Projection::Value,
        system_id == sim_runtime::SYSTEM_ID,
        sim_runtime::SYSTEM_ID.into_raw(),
        system_id.into_raw(),
    )?;

    let handheld = SystemGetInfo::new(FormFactor::HANDHELD_DISPLAY);
    let mut unused = SystemId::NULL;
    let code = unsafe { instance.get_system_raw(d, &handheld, &mut unused) };
    rec.code(
        "get_system_unsupported_form_factor",
        Command::GetSystem,
        Projection::Raw,
        code,
        ResultCode::ERROR_FORM_FACTOR_UNSUPPORTED,
    )?;

    // The extension struct rides the output chain and must survive the reset.
    let mut hand = SystemHandTrackingPropertiesEXT::default();
    let mut sys_props = SystemProperties::default();
    sys_props.push_next(&mut hand);
    sys_props.vendor_id = 0xdead;
    let code = unsafe { instance.get_system_properties_raw(d, system_id, &mut sys_props) };
    let chain_kept = sys_props.next() == erase(&mut hand).cast_const();
    let vendor_id = sys_props.vendor_id;
    rec.code(
        "get_system_properties",
        Command::GetSystemProperties,
        Projection::Raw,
        code,
        ResultCode::SUCCESS,
    )?;
    rec.that(
        "get_system_properties_keeps_chain",
        Command::GetSystemProperties,
        Projection::Raw,
        chain_kept && vendor_id == sim_runtime::VENDOR_ID,
        "chain intact, vendor filled",
        format!("chain_kept={chain_kept} vendor_id={vendor_id:#x}"),
    )?;
    rec.that(
        "hand_tracking_reported_through_chain",
        Command::GetSystemProperties,
        Projection::Raw,
        hand.supports_hand_tracking == Bool32::TRUE,
        true,
        bool::from(hand.supports_hand_tracking),
    )?;

    let code = unsafe {
        instance.get_system_properties_raw(d, SystemId::from_raw(1), &mut SystemProperties::default())
    };
    rec.code(
        "get_system_properties_bad_system",
        Command::GetSystemProperties,
        Projection::Raw,
        code,
        ResultCode::ERROR_SYSTEM_INVALID,
    )?;
    Ok(())
}

fn session_checks(
    rec: &mut Recorder<'_>,
    d: &DispatchLoaderDynamic,
    instance: Instance,
) -> Result<(), HarnessError> {
    // SAFETY (whole function): every handle is created through `d` and used
    // only while live; owned handles are dropped before the instance goes.
    let session_info = SessionCreateInfo::new(SessionCreateFlags::empty(), sim_runtime::SYSTEM_ID);
    let session = unsafe { instance.create_session_unique(d, &session_info) }
        .into_result()
        .context("create_session_unique")?;
    let session_raw = session.get().get().into_raw();
    rec.that(
        "create_session_unique",
        Command::CreateSession,
        Projection::Unique,
        sim_runtime::is_live(session_raw),
        "live session",
        format!("{:?}", session.get()),
    )?;

    let begin_info = SessionBeginInfo::new(ViewConfigurationType::PRIMARY_STEREO);
    let code = unsafe { session.begin(d, &begin_info) }
        .into_result()
        .context("begin_session")?;
    rec.code("begin_session", Command::BeginSession, Projection::Value, code, ResultCode::SUCCESS)?;
    let code = unsafe { session.begin_raw(d, &begin_info) };
    rec.code(
        "begin_session_twice",
        Command::BeginSession,
        Projection::Raw,
        code,
        ResultCode::ERROR_SESSION_RUNNING,
    )?;

    let spaces = unsafe { session.enumerate_reference_spaces(d) }
        .into_result()
        .context("enumerate_reference_spaces")?;
    rec.that(
        "enumerate_reference_spaces",
        Command::EnumerateReferenceSpaces,
        Projection::Value,
        spaces == sim_runtime::REFERENCE_SPACES,
        format!("{:?}", sim_runtime::REFERENCE_SPACES),
        format!("{spaces:?}"),
    )?;

    let mut count = 0u32;
    let mut short = [ReferenceSpaceType::default(); 1];
    let code = unsafe { session.enumerate_reference_spaces_raw(d, &mut count, &mut short) };
    rec.code(
        "enumerate_reference_spaces_short_buffer",
        Command::EnumerateReferenceSpaces,
        Projection::Raw,
        code,
        ResultCode::ERROR_SIZE_INSUFFICIENT,
    )?;

    space_checks(rec, d, instance, session.get())?;

    let tracker_info = HandTrackerCreateInfoEXT::new(HandEXT::LEFT, HandJointSetEXT::DEFAULT);
    let tracker_raw = {
        let tracker = unsafe { session.create_hand_tracker_ext_unique(d, &tracker_info) }
            .into_result()
            .context("create_hand_tracker_ext_unique")?;
        tracker.get().get().into_raw()
    };
    rec.that(
        "hand_tracker_destroyed_on_drop",
        Command::DestroyHandTrackerEXT,
        Projection::Unique,
        !sim_runtime::is_live(tracker_raw) && sim_runtime::destroy_count(tracker_raw) == 1,
        1,
        sim_runtime::destroy_count(tracker_raw),
    )?;

    let code = unsafe { session.request_exit(d) }
        .into_result()
        .context("request_exit_session")?;
    rec.code(
        "request_exit_session",
        Command::RequestExitSession,
        Projection::Value,
        code,
        ResultCode::SUCCESS,
    )?;
    let code = unsafe { session.end(d) }.into_result().context("end_session")?;
    rec.code("end_session", Command::EndSession, Projection::Value, code, ResultCode::SUCCESS)?;
    let code = unsafe { session.end_raw(d) };
    rec.code(
        "end_session_not_running",
        Command::EndSession,
        Projection::Raw,
        code,
        ResultCode::ERROR_SESSION_NOT_RUNNING,
    )?;

    drop(session);
    rec.that(
        "session_destroyed_on_drop",
        Command::DestroySession,
        Projection::Unique,
        sim_runtime::destroy_count(session_raw) == 1,
        1,
        sim_runtime::destroy_count(session_raw),
    )?;
    Ok(())
}

fn space_checks(
    rec: &mut Recorder<'_>,
    d: &DispatchLoaderDynamic,
    instance: Instance,
    session: xrbind_abi::Session,
) -> Result<(), HarnessError> {
    // SAFETY (whole function): as in `session_checks`.
    let local_info = ReferenceSpaceCreateInfo::new(ReferenceSpaceType::LOCAL, Posef::IDENTITY);
    let stage_info =
        ReferenceSpaceCreateInfo::new(ReferenceSpaceType::STAGE, identity_offset(0.0, 1.5, -2.0));
    let local = unsafe { session.create_reference_space_unique(d, &local_info) }
        .into_result()
        .context("create_reference_space_unique(local)")?;
    let stage = unsafe { session.create_reference_space(d, &stage_info) }
        .into_result()
        .context("create_reference_space(stage)")?;

    let located = unsafe { stage.locate(d, local.get(), Time::from_nanos(1)) }
        .into_coded_result()
        .context("locate_space")?;
    let pose_ok = located.value.pose.position == Vector3f { x: 0.0, y: 1.5, z: -2.0 }
        && located.value.location_flags == SpaceLocationFlags::all();
    rec.that(
        "locate_space",
        Command::LocateSpace,
        Projection::Value,
        located.result == ResultCode::SUCCESS && pose_ok,
        "SUCCESS at (0, 1.5, -2)",
        format!("{} at {:?}", located.result, located.value.pose.position),
    )?;

    sim_runtime::inject_result(
        instance.get(),
        Command::LocateSpace,
        ResultCode::SESSION_LOSS_PENDING,
    );
    let pending = unsafe { stage.locate(d, local.get(), Time::from_nanos(2)) }
        .into_coded_result()
        .context("locate_space(loss pending)")?;
    rec.code(
        "locate_space_accepts_loss_pending",
        Command::LocateSpace,
        Projection::Value,
        pending.result,
        ResultCode::SESSION_LOSS_PENDING,
    )?;

    let mut location = SpaceLocation::default();
    let code = unsafe { stage.locate_raw(d, local.get(), Time::from_nanos(0), &mut location) };
    rec.code(
        "locate_space_invalid_time",
        Command::LocateSpace,
        Projection::Raw,
        code,
        ResultCode::ERROR_TIME_INVALID,
    )?;

    let skewed = Posef {
        orientation: Quaternionf {
            x: 1.0,
            y: 1.0,
            z: 0.0,
            w: 1.0,
        },
        ..Posef::IDENTITY
    };
    let bad_info = ReferenceSpaceCreateInfo::new(ReferenceSpaceType::VIEW, skewed);
    let mut bad = Space::NULL;
    let code = unsafe { session.create_reference_space_raw(d, &bad_info, &mut bad) };
    rec.code(
        "create_reference_space_invalid_pose",
        Command::CreateReferenceSpace,
        Projection::Raw,
        code,
        ResultCode::ERROR_POSE_INVALID,
    )?;

    let stage_raw = stage.get().into_raw();
    let destroyed = unsafe { stage.destroy(d) }.into_result().is_ok();
    rec.that(
        "destroy_space",
        Command::DestroySpace,
        Projection::Value,
        destroyed && sim_runtime::destroy_count(stage_raw) == 1,
        1,
        sim_runtime::destroy_count(stage_raw),
    )?;

    let local_raw = local.get().get().into_raw();
    drop(local);
    rec.that(
        "space_destroyed_on_drop",
        Command::DestroySpace,
        Projection::Unique,
        sim_runtime::destroy_count(local_raw) == 1,
        1,
        sim_runtime::destroy_count(local_raw),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lazy_run_passes_every_check() {
        let mut log = LogEmitter::sink("runner-test", "lazy");
        let summary = ConformanceRunner::new("unit", PopulationMode::Lazy)
            .run(&mut log)
            .unwrap();
        assert!(summary.all_passed(), "failed: {:?}", summary.failures());
        assert!(summary.total > 20);
        assert!(summary.checks.iter().any(|c| c.name == "read_only_skips_resolution"));
    }

    #[test]
    fn eager_run_resolves_up_front() {
        let mut log = LogEmitter::sink("runner-test", "eager");
        let summary = ConformanceRunner::new("unit", PopulationMode::Eager)
            .run(&mut log)
            .unwrap();
        assert!(summary.all_passed(), "failed: {:?}", summary.failures());
        assert_eq!(summary.resolutions, Command::COUNT as u64);
        assert!(!summary.checks.iter().any(|c| c.name == "read_only_skips_resolution"));
    }
}
