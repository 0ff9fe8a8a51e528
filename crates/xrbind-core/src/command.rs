//! Command descriptors.
//!
//! [`Command`] names every entry of the dispatch table. Its discriminant is the
//! table slot index, and [`CommandInfo`] records what kind of command it is,
//! which handle it is called on, and which feature provides it.

use std::ffi::CStr;
use std::fmt;

use crate::config::BindingConfig;

/// Handle types known to the binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HandleKind {
    Instance,
    Session,
    Space,
    HandTrackerEXT,
}

impl HandleKind {
    /// The handle this one is created from, if any.
    #[must_use]
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::Instance => None,
            Self::Session => Some(Self::Instance),
            Self::Space | Self::HandTrackerEXT => Some(Self::Session),
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Instance => "Instance",
            Self::Session => "Session",
            Self::Space => "Space",
            Self::HandTrackerEXT => "HandTrackerEXT",
        }
    }
}

/// Broad command shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Produces a new handle through an out parameter.
    Create,
    /// Releases the handle it is called on.
    Destroy,
    Other,
}

/// Where a command comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Core,
    /// An extension, by its registered name.
    Extension(&'static str),
}

impl Feature {
    #[must_use]
    pub const fn is_core(self) -> bool {
        matches!(self, Self::Core)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Extension(name) => name,
        }
    }
}

/// Registered name of the hand-tracking extension.
pub const EXT_HAND_TRACKING: &str = "XR_EXT_hand_tracking";

/// Static description of one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandInfo {
    pub command: Command,
    pub kind: CommandKind,
    /// Handle type of the first parameter, `None` for free functions.
    pub handle: Option<HandleKind>,
    /// Handle type created or destroyed, for create/destroy commands.
    pub object: Option<HandleKind>,
    pub feature: Feature,
}

impl CommandInfo {
    /// `true` if handle methods for this command may fall back to the default
    /// dispatcher in this build.
    #[must_use]
    pub const fn offers_default_dispatch(&self) -> bool {
        self.feature.is_core() && BindingConfig::ACTIVE.default_core_dispatch
    }
}

const fn nul_terminated(bytes: &'static [u8]) -> &'static CStr {
    match CStr::from_bytes_with_nul(bytes) {
        Ok(s) => s,
        Err(_) => panic!("command symbol must be NUL-terminated without interior NUL"),
    }
}

macro_rules! command_table {
    ($(
        $variant:ident = $symbol:literal {
            kind: $kind:ident,
            handle: $handle:expr,
            object: $object:expr,
            feature: $feature:expr $(,)?
        },
    )*) => {
        /// Every command in the dispatch table.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(usize)]
        pub enum Command {
            $( $variant, )*
        }

        impl Command {
            /// Every command, in slot order.
            pub const ALL: &'static [Command] = &[$( Command::$variant, )*];

            /// Number of table slots.
            pub const COUNT: usize = Self::ALL.len();

            const SYMBOLS: &'static [&'static str] = &[$( $symbol, )*];

            const C_SYMBOLS: &'static [&'static CStr] =
                &[$( nul_terminated(concat!($symbol, "\0").as_bytes()), )*];

            const INFOS: &'static [CommandInfo] = &[$(
                CommandInfo {
                    command: Command::$variant,
                    kind: CommandKind::$kind,
                    handle: $handle,
                    object: $object,
                    feature: $feature,
                },
            )*];
        }
    };
}

command_table! {
    CreateInstance = "xrCreateInstance" {
        kind: Create, handle: None, object: Some(HandleKind::Instance), feature: Feature::Core,
    },
    DestroyInstance = "xrDestroyInstance" {
        kind: Destroy, handle: Some(HandleKind::Instance), object: Some(HandleKind::Instance), feature: Feature::Core,
    },
    ResultToString = "xrResultToString" {
        kind: Other, handle: Some(HandleKind::Instance), object: None, feature: Feature::Core,
    },
    GetInstanceProperties = "xrGetInstanceProperties" {
        kind: Other, handle: Some(HandleKind::Instance), object: None, feature: Feature::Core,
    },
    GetSystem = "xrGetSystem" {
        kind: Other, handle: Some(HandleKind::Instance), object: None, feature: Feature::Core,
    },
    GetSystemProperties = "xrGetSystemProperties" {
        kind: Other, handle: Some(HandleKind::Instance), object: None, feature: Feature::Core,
    },
    CreateSession = "xrCreateSession" {
        kind: Create, handle: Some(HandleKind::Instance), object: Some(HandleKind::Session), feature: Feature::Core,
    },
    DestroySession = "xrDestroySession" {
        kind: Destroy, handle: Some(HandleKind::Session), object: Some(HandleKind::Session), feature: Feature::Core,
    },
    BeginSession = "xrBeginSession" {
        kind: Other, handle: Some(HandleKind::Session), object: None, feature: Feature::Core,
    },
    EndSession = "xrEndSession" {
        kind: Other, handle: Some(HandleKind::Session), object: None, feature: Feature::Core,
    },
    RequestExitSession = "xrRequestExitSession" {
        kind: Other, handle: Some(HandleKind::Session), object: None, feature: Feature::Core,
    },
    EnumerateReferenceSpaces = "xrEnumerateReferenceSpaces" {
        kind: Other, handle: Some(HandleKind::Session), object: None, feature: Feature::Core,
    },
    CreateReferenceSpace = "xrCreateReferenceSpace" {
        kind: Create, handle: Some(HandleKind::Session), object: Some(HandleKind::Space), feature: Feature::Core,
    },
    DestroySpace = "xrDestroySpace" {
        kind: Destroy, handle: Some(HandleKind::Space), object: Some(HandleKind::Space), feature: Feature::Core,
    },
    LocateSpace = "xrLocateSpace" {
        kind: Other, handle: Some(HandleKind::Space), object: None, feature: Feature::Core,
    },
    CreateHandTrackerEXT = "xrCreateHandTrackerEXT" {
        kind: Create, handle: Some(HandleKind::Session), object: Some(HandleKind::HandTrackerEXT),
        feature: Feature::Extension(EXT_HAND_TRACKING),
    },
    DestroyHandTrackerEXT = "xrDestroyHandTrackerEXT" {
        kind: Destroy, handle: Some(HandleKind::HandTrackerEXT), object: Some(HandleKind::HandTrackerEXT),
        feature: Feature::Extension(EXT_HAND_TRACKING),
    },
}

impl Command {
    /// Table slot of this command.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The C symbol, e.g. `"xrCreateSession"`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        Self::SYMBOLS[self.index()]
    }

    /// The C symbol with its terminating NUL, ready to pass to a resolver.
    #[must_use]
    pub const fn c_name(self) -> &'static CStr {
        Self::C_SYMBOLS[self.index()]
    }

    #[must_use]
    pub const fn info(self) -> &'static CommandInfo {
        &Self::INFOS[self.index()]
    }

    /// Look up a command by its C symbol.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::SYMBOLS
            .iter()
            .position(|s| *s == name)
            .map(|i| Self::ALL[i])
    }

    #[must_use]
    pub const fn is_extension(self) -> bool {
        !self.info().feature.is_core()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
