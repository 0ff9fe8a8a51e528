//! Build and tooling configuration.
//!
//! Binding behavior is fixed at build time by Cargo features:
//! - `status-pairs`: results are returned as (code, value) pairs instead of
//!   `Result`. Off by default.
//! - `typesafe-conversion`: implicit `From` conversions between raw handles and
//!   their wrappers. Enabled by `xrbind-abi` defaults.
//! - `smart-handle`: the `_unique` projections and `UniqueHandle` aliases.
//! - `static-loader`: link the loader's exported symbols directly.
//! - `no-default-dispatch`: suppress the default core dispatcher.
//!
//! Dispatch-table population is the one runtime knob, read from
//! `XRBIND_POPULATE` by tooling.

/// How command failures reach the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorMode {
    /// Failures are `Err(Error)`.
    Exceptions,
    /// Failures are returned as codes; debug builds assert.
    StatusPairs,
}

impl ErrorMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exceptions => "exceptions",
            Self::StatusPairs => "status-pairs",
        }
    }
}

/// Snapshot of the build-time switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingConfig {
    pub error_mode: ErrorMode,
    pub typesafe_conversion: bool,
    pub smart_handles: bool,
    pub static_loader: bool,
    pub default_core_dispatch: bool,
}

impl BindingConfig {
    /// The configuration this build was compiled with.
    pub const ACTIVE: Self = Self {
        error_mode: if cfg!(feature = "status-pairs") {
            ErrorMode::StatusPairs
        } else {
            ErrorMode::Exceptions
        },
        typesafe_conversion: cfg!(feature = "typesafe-conversion"),
        smart_handles: cfg!(feature = "smart-handle"),
        static_loader: cfg!(feature = "static-loader"),
        default_core_dispatch: cfg!(feature = "static-loader")
            && !cfg!(feature = "no-default-dispatch"),
    };

    #[must_use]
    pub const fn exceptions_enabled(&self) -> bool {
        matches!(self.error_mode, ErrorMode::Exceptions)
    }
}

/// When a dynamic dispatch table resolves its entries.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PopulationMode {
    /// Resolve each command on first use.
    #[default]
    Lazy,
    /// Resolve every command up front.
    Eager,
}

/// Environment variable consulted by [`PopulationMode::from_env`].
pub const POPULATE_ENV: &str = "XRBIND_POPULATE";

impl PopulationMode {
    /// Parse from string (case-insensitive). Unrecognized input is `Lazy`.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "eager" | "full" | "fully" | "all" | "prepopulate" => Self::Eager,
            _ => Self::Lazy,
        }
    }

    /// Read [`POPULATE_ENV`]; absent means `Lazy`.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var(POPULATE_ENV)
            .map(|v| Self::from_str_loose(&v))
            .unwrap_or_default()
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lazy => "lazy",
            Self::Eager => "eager",
        }
    }

    #[must_use]
    pub const fn is_eager(self) -> bool {
        matches!(self, Self::Eager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_population_modes() {
        assert_eq!(PopulationMode::from_str_loose("eager"), PopulationMode::Eager);
        assert_eq!(PopulationMode::from_str_loose("EAGER"), PopulationMode::Eager);
        assert_eq!(PopulationMode::from_str_loose("full"), PopulationMode::Eager);
        assert_eq!(PopulationMode::from_str_loose(" all "), PopulationMode::Eager);
        assert_eq!(PopulationMode::from_str_loose("lazy"), PopulationMode::Lazy);
        assert_eq!(PopulationMode::from_str_loose("bogus"), PopulationMode::Lazy);
        assert_eq!(PopulationMode::from_str_loose(""), PopulationMode::Lazy);
    }

    #[test]
    fn default_is_lazy() {
        assert_eq!(PopulationMode::default(), PopulationMode::Lazy);
        assert!(!PopulationMode::Lazy.is_eager());
        assert!(PopulationMode::Eager.is_eager());
    }

    #[test]
    fn active_config_tracks_features() {
        let cfg = BindingConfig::ACTIVE;
        assert_eq!(cfg.exceptions_enabled(), !cfg!(feature = "status-pairs"));
        assert_eq!(cfg.smart_handles, cfg!(feature = "smart-handle"));
        if !cfg.static_loader {
            assert!(!cfg.default_core_dispatch);
        }
    }

    #[test]
    fn mode_names_are_stable() {
        assert_eq!(ErrorMode::Exceptions.as_str(), "exceptions");
        assert_eq!(ErrorMode::StatusPairs.as_str(), "status-pairs");
        assert_eq!(PopulationMode::Eager.as_str(), "eager");
    }
}
