//! Runtime-resolved dispatch table.
//!
//! The table has one `Cell` slot per [`Command`]. A slot is written once,
//! when its command is first populated, and never cleared. `Cell` makes the
//! loader `!Sync`, so populating one table from several threads does not
//! compile; [`DispatchLoaderDynamic::freeze`] turns a populated loader into a
//! [`DispatchTable`] that is `Send + Sync` and never resolves again.

use std::cell::Cell;
use std::fmt;

use xrbind_core::{Command, PopulationMode, ResultCode};

use super::{CommandResolver, LoaderStats, LoaderStatsSnapshot};
use crate::sys::{self, GetInstanceProcAddr, VoidFunction};

/// Lazily populated dispatch table bound to one instance.
pub struct DispatchLoaderDynamic {
    instance: sys::Instance,
    get_instance_proc_addr: GetInstanceProcAddr,
    table: [Cell<Option<VoidFunction>>; Command::COUNT],
    stats: LoaderStats,
}

impl DispatchLoaderDynamic {
    /// Bind a resolver to `instance` without resolving anything.
    ///
    /// `instance` may be null, in which case only instance-independent
    /// commands (`xrCreateInstance`) resolve.
    ///
    /// # Safety
    ///
    /// `get_instance_proc_addr` must behave as the loader's
    /// `xrGetInstanceProcAddr`: for each command name it writes either null or
    /// that command's entry point. It and every pointer it returns must stay
    /// valid for the life of this loader.
    #[must_use]
    pub unsafe fn new(instance: sys::Instance, get_instance_proc_addr: GetInstanceProcAddr) -> Self {
        Self {
            instance,
            get_instance_proc_addr,
            table: std::array::from_fn(|_| Cell::new(None)),
            stats: LoaderStats::default(),
        }
    }

    /// Bind and resolve every command up front.
    ///
    /// # Safety
    ///
    /// As for [`DispatchLoaderDynamic::new`].
    #[must_use]
    pub unsafe fn create_fully_populated(
        instance: sys::Instance,
        get_instance_proc_addr: GetInstanceProcAddr,
    ) -> Self {
        debug_assert!(!instance.is_null(), "fully populated loader needs an instance");
        // SAFETY: forwarded caller contract.
        let loader = unsafe { Self::new(instance, get_instance_proc_addr) };
        loader.populate_fully();
        loader
    }

    /// Bind, then resolve up front only in [`PopulationMode::Eager`].
    ///
    /// # Safety
    ///
    /// As for [`DispatchLoaderDynamic::new`].
    #[must_use]
    pub unsafe fn with_mode(
        instance: sys::Instance,
        get_instance_proc_addr: GetInstanceProcAddr,
        mode: PopulationMode,
    ) -> Self {
        // SAFETY: forwarded caller contract.
        let loader = unsafe { Self::new(instance, get_instance_proc_addr) };
        if mode.is_eager() {
            loader.populate_fully();
        }
        loader
    }

    #[must_use]
    pub fn instance(&self) -> sys::Instance {
        self.instance
    }

    /// Resolve `command` unless its slot is already filled.
    ///
    /// Returns the resolver's code unchanged; a filled slot returns
    /// `SUCCESS` without calling the resolver.
    pub fn populate(&self, command: Command) -> ResultCode {
        let slot = &self.table[command.index()];
        if slot.get().is_some() {
            self.stats.record_hit();
            return ResultCode::SUCCESS;
        }
        let mut pfn: Option<VoidFunction> = None;
        // SAFETY: the name is NUL-terminated and `pfn` is writable; the
        // resolver is valid per the construction contract.
        let result = unsafe {
            (self.get_instance_proc_addr)(self.instance, command.c_name().as_ptr(), &mut pfn)
        };
        slot.set(pfn);
        self.stats.record_resolution(result.succeeded() && pfn.is_some());
        result
    }

    /// [`populate`](Self::populate) by C symbol name.
    ///
    /// Names outside the command table fail with
    /// `ERROR_FUNCTION_UNSUPPORTED`.
    pub fn populate_by_name(&self, name: &str) -> ResultCode {
        match Command::from_name(name) {
            Some(command) => self.populate(command),
            None => ResultCode::ERROR_FUNCTION_UNSUPPORTED,
        }
    }

    /// Populate every command once. Returns the number of filled slots.
    ///
    /// Filled slots are left alone, so repeating the call changes nothing
    /// that already resolved. Commands of extensions that were not enabled
    /// stay empty.
    pub fn populate_fully(&self) -> usize {
        for &command in Command::ALL {
            let _ = self.populate(command);
        }
        self.populated_count()
    }

    /// Rebind to `instance` and a new resolver, then populate every empty
    /// slot through it. Filled slots are kept.
    ///
    /// # Safety
    ///
    /// As for [`DispatchLoaderDynamic::new`].
    pub unsafe fn populate_fully_with(
        &mut self,
        instance: sys::Instance,
        get_instance_proc_addr: GetInstanceProcAddr,
    ) -> usize {
        self.instance = instance;
        self.get_instance_proc_addr = get_instance_proc_addr;
        self.populate_fully()
    }

    #[must_use]
    pub fn is_populated(&self, command: Command) -> bool {
        self.table[command.index()].get().is_some()
    }

    #[must_use]
    pub fn populated_count(&self) -> usize {
        self.table.iter().filter(|slot| slot.get().is_some()).count()
    }

    /// Populate `command` and return its pointer; `None` if resolution failed.
    #[must_use]
    pub fn pfn(&self, command: Command) -> Option<VoidFunction> {
        if self.populate(command).failed() {
            return None;
        }
        self.table[command.index()].get()
    }

    /// The stored pointer, without populating.
    #[must_use]
    pub fn pfn_no_populate(&self, command: Command) -> Option<VoidFunction> {
        self.table[command.index()].get()
    }

    /// A dispatcher over this table that never populates.
    ///
    /// Commands whose slot is still empty fail with
    /// `ERROR_FUNCTION_UNSUPPORTED` instead of being called.
    #[must_use]
    pub fn read_only(&self) -> ReadOnlyDispatch<'_> {
        ReadOnlyDispatch { loader: self }
    }

    /// Stop resolving and share the table.
    #[must_use]
    pub fn freeze(self) -> DispatchTable {
        DispatchTable {
            instance: self.instance,
            table: std::array::from_fn(|i| self.table[i].get()),
            stats: self.stats.copy(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> LoaderStatsSnapshot {
        self.stats.snapshot()
    }
}

// SAFETY: only hands out what the bound resolver wrote for that command's
// name, which the construction contract makes the command's entry point.
unsafe impl CommandResolver for DispatchLoaderDynamic {
    fn resolve(&self, command: Command) -> Result<VoidFunction, ResultCode> {
        let result = self.populate(command);
        if result.failed() {
            return Err(result);
        }
        self.table[command.index()]
            .get()
            .ok_or(ResultCode::ERROR_FUNCTION_UNSUPPORTED)
    }
}

impl fmt::Debug for DispatchLoaderDynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchLoaderDynamic")
            .field("instance", &self.instance)
            .field("populated", &self.populated_count())
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}

/// Non-populating view of a [`DispatchLoaderDynamic`].
#[derive(Clone, Copy)]
pub struct ReadOnlyDispatch<'a> {
    loader: &'a DispatchLoaderDynamic,
}

// SAFETY: reads the loader's slots, which only hold resolver output.
unsafe impl CommandResolver for ReadOnlyDispatch<'_> {
    fn resolve(&self, command: Command) -> Result<VoidFunction, ResultCode> {
        match self.loader.pfn_no_populate(command) {
            Some(pfn) => {
                self.loader.stats.record_hit();
                Ok(pfn)
            }
            None => {
                self.loader.stats.record_miss();
                Err(ResultCode::ERROR_FUNCTION_UNSUPPORTED)
            }
        }
    }
}

impl fmt::Debug for ReadOnlyDispatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadOnlyDispatch").field(self.loader).finish()
    }
}

/// Immutable dispatch table, safe to share across threads.
pub struct DispatchTable {
    instance: sys::Instance,
    table: [Option<VoidFunction>; Command::COUNT],
    stats: LoaderStats,
}

impl DispatchTable {
    #[must_use]
    pub fn instance(&self) -> sys::Instance {
        self.instance
    }

    #[must_use]
    pub fn is_populated(&self, command: Command) -> bool {
        self.table[command.index()].is_some()
    }

    #[must_use]
    pub fn populated_count(&self) -> usize {
        self.table.iter().filter(|slot| slot.is_some()).count()
    }

    #[must_use]
    pub fn pfn(&self, command: Command) -> Option<VoidFunction> {
        self.table[command.index()]
    }

    #[must_use]
    pub fn stats(&self) -> LoaderStatsSnapshot {
        self.stats.snapshot()
    }
}

// SAFETY: the slots were copied from a loader and only hold resolver output.
unsafe impl CommandResolver for DispatchTable {
    fn resolve(&self, command: Command) -> Result<VoidFunction, ResultCode> {
        match self.table[command.index()] {
            Some(pfn) => {
                self.stats.record_hit();
                Ok(pfn)
            }
            None => {
                self.stats.record_miss();
                Err(ResultCode::ERROR_FUNCTION_UNSUPPORTED)
            }
        }
    }
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("instance", &self.instance)
            .field("populated", &self.populated_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::ffi::{CStr, c_char};

    use super::*;

    thread_local! {
        static CALLS: RefCell<HashMap<String, usize>> = RefCell::new(HashMap::new());
    }

    unsafe extern "system" fn placeholder() {}

    /// Resolves every core command to a placeholder that is never called.
    unsafe extern "system" fn core_only(
        _instance: sys::Instance,
        name: *const c_char,
        function: *mut Option<VoidFunction>,
    ) -> ResultCode {
        // SAFETY: the loader passes a NUL-terminated command name.
        let name = unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned();
        let known = Command::from_name(&name).filter(|c| !c.is_extension());
        CALLS.with(|c| *c.borrow_mut().entry(name).or_default() += 1);
        // SAFETY: `function` is writable per the resolver contract.
        unsafe {
            *function = known.map(|_| placeholder as VoidFunction);
        }
        if known.is_some() {
            ResultCode::SUCCESS
        } else {
            ResultCode::ERROR_FUNCTION_UNSUPPORTED
        }
    }

    fn calls(command: Command) -> usize {
        CALLS.with(|c| c.borrow().get(command.name()).copied().unwrap_or(0))
    }

    fn loader() -> DispatchLoaderDynamic {
        CALLS.with(|c| c.borrow_mut().clear());
        // SAFETY: `core_only` follows the resolver contract and never hands
        // out a pointer that a test calls.
        unsafe { DispatchLoaderDynamic::new(sys::Instance::from_raw(1), core_only) }
    }

    #[test]
    fn populate_twice_resolves_once() {
        let d = loader();
        assert_eq!(d.populate(Command::LocateSpace), ResultCode::SUCCESS);
        assert_eq!(d.populate(Command::LocateSpace), ResultCode::SUCCESS);
        assert_eq!(calls(Command::LocateSpace), 1);
        assert_eq!(d.stats().hits, 1);
    }

    #[test]
    fn failed_resolution_returns_resolver_code_and_leaves_slot_empty() {
        let d = loader();
        assert_eq!(
            d.populate(Command::CreateHandTrackerEXT),
            ResultCode::ERROR_FUNCTION_UNSUPPORTED
        );
        assert!(!d.is_populated(Command::CreateHandTrackerEXT));
        assert!(d.pfn(Command::CreateHandTrackerEXT).is_none());
        assert_eq!(d.stats().failures, 2);
    }

    #[test]
    fn populate_fully_is_idempotent() {
        let d = loader();
        let core = Command::ALL.iter().filter(|c| !c.is_extension()).count();
        assert_eq!(d.populate_fully(), core);
        assert_eq!(d.populate_fully(), core);
        for command in Command::ALL.iter().filter(|c| !c.is_extension()) {
            assert_eq!(calls(*command), 1, "{command}");
        }
    }

    #[test]
    fn no_populate_paths_never_resolve() {
        let d = loader();
        assert!(d.pfn_no_populate(Command::GetSystem).is_none());
        assert!(d.read_only().resolve(Command::GetSystem).is_err());
        assert_eq!(calls(Command::GetSystem), 0);

        assert!(d.pfn(Command::GetSystem).is_some());
        assert!(d.read_only().resolve(Command::GetSystem).is_ok());
        assert_eq!(calls(Command::GetSystem), 1);
    }

    #[test]
    fn populate_by_unknown_name_fails_without_resolving() {
        let d = loader();
        assert_eq!(d.populate_by_name("xrNoSuchCommand"), ResultCode::ERROR_FUNCTION_UNSUPPORTED);
        assert_eq!(d.stats().resolutions, 0);
        assert_eq!(d.populate_by_name("xrEndSession"), ResultCode::SUCCESS);
        assert!(d.is_populated(Command::EndSession));
    }

    #[test]
    fn frozen_table_keeps_slots_and_is_shareable() {
        fn assert_sync<T: Send + Sync>(_: &T) {}

        let d = loader();
        let _ = d.pfn(Command::BeginSession);
        let table = d.freeze();
        assert_sync(&table);
        assert!(table.is_populated(Command::BeginSession));
        assert!(!table.is_populated(Command::EndSession));
        assert_eq!(table.resolve(Command::EndSession), Err(ResultCode::ERROR_FUNCTION_UNSUPPORTED));
    }

    #[test]
    fn rebinding_keeps_filled_slots() {
        let mut d = loader();
        let _ = d.pfn(Command::DestroySpace);
        // SAFETY: same resolver as construction.
        let filled = unsafe { d.populate_fully_with(sys::Instance::from_raw(2), core_only) };
        assert_eq!(d.instance(), sys::Instance::from_raw(2));
        assert_eq!(filled, d.populated_count());
        assert_eq!(calls(Command::DestroySpace), 1);
    }
}
