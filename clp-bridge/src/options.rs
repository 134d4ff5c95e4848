//! Engine option identifiers, option values and the [`EngineConfig`]
//! loaded from the environment.
//!
//! Options configure the engine before [`Bridge::init`]; the bridge only
//! forwards the sizing options and the installation directory.
//! [`EngineOption::Io`] is reserved: `init` always selects memory queues.
//!
//! [`Bridge::init`]: crate::Bridge::init

use crate::BridgeError;
use smartstring::alias::String;

/// Engine option identifiers with their native numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum EngineOption {
    MapFile = 0,
    ParallelWorker = 1,
    Argc = 2,
    Argv = 3,
    LocalSize = 4,
    GlobalSize = 5,
    PrivateSize = 6,
    SharedSize = 7,
    Panic = 8,
    Allocation = 9,
    DefaultModule = 10,
    EclipseDir = 11,
    Io = 12,
    Init = 13,
    DebugLevel = 14,
    CwdSeparate = 15,
}

/// Kind of value an option accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    Int,
    Str,
}

impl EngineOption {
    const ALL: [EngineOption; 16] = [
        EngineOption::MapFile,
        EngineOption::ParallelWorker,
        EngineOption::Argc,
        EngineOption::Argv,
        EngineOption::LocalSize,
        EngineOption::GlobalSize,
        EngineOption::PrivateSize,
        EngineOption::SharedSize,
        EngineOption::Panic,
        EngineOption::Allocation,
        EngineOption::DefaultModule,
        EngineOption::EclipseDir,
        EngineOption::Io,
        EngineOption::Init,
        EngineOption::DebugLevel,
        EngineOption::CwdSeparate,
    ];

    /// Returns the option for a native code, if the code exists.
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|o| *o as i32 == code)
    }

    /// Returns the native code.
    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Returns the option name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            EngineOption::MapFile => "mapfile",
            EngineOption::ParallelWorker => "parallel_worker",
            EngineOption::Argc => "argc",
            EngineOption::Argv => "argv",
            EngineOption::LocalSize => "localsize",
            EngineOption::GlobalSize => "globalsize",
            EngineOption::PrivateSize => "privatesize",
            EngineOption::SharedSize => "sharedsize",
            EngineOption::Panic => "panic",
            EngineOption::Allocation => "allocation",
            EngineOption::DefaultModule => "default_module",
            EngineOption::EclipseDir => "eclipsedir",
            EngineOption::Io => "io",
            EngineOption::Init => "init",
            EngineOption::DebugLevel => "debug_level",
            EngineOption::CwdSeparate => "cwd_separate",
        }
    }

    /// Returns the value type if the bridge accepts this option through
    /// [`Bridge::set_option`](crate::Bridge::set_option).
    pub fn settable(self) -> Option<OptionType> {
        match self {
            EngineOption::LocalSize
            | EngineOption::GlobalSize
            | EngineOption::PrivateSize
            | EngineOption::SharedSize => Some(OptionType::Int),
            EngineOption::EclipseDir => Some(OptionType::Str),
            _ => None,
        }
    }
}

impl TryFrom<i32> for EngineOption {
    type Error = BridgeError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(BridgeError::UnsupportedOption(code))
    }
}

/// A value passed to [`Bridge::set_option`](crate::Bridge::set_option).
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Int(i64),
    Str(String),
}

impl OptionValue {
    pub fn kind(&self) -> OptionType {
        match self {
            OptionValue::Int(_) => OptionType::Int,
            OptionValue::Str(_) => OptionType::Str,
        }
    }
}

macro_rules! impl_from_integers_for_option_value {
    ($($t:ty),* $(,)?) => {$(
        impl From<$t> for OptionValue {
            #[inline]
            fn from(v: $t) -> Self { OptionValue::Int(v as i64) }
        }
    )*};
}
impl_from_integers_for_option_value!(i8, i16, i32, i64, u8, u16, u32);

impl From<&str> for OptionValue {
    #[inline]
    fn from(v: &str) -> Self {
        OptionValue::Str(v.into())
    }
}

impl From<String> for OptionValue {
    #[inline]
    fn from(v: String) -> Self {
        OptionValue::Str(v)
    }
}

impl From<std::string::String> for OptionValue {
    #[inline]
    fn from(v: std::string::String) -> Self {
        OptionValue::Str(v.into())
    }
}

/// Engine configuration applied with
/// [`Bridge::configure`](crate::Bridge::configure) before `init`.
///
/// Every field is optional; unset fields leave the engine default.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Installation directory of the engine.
    pub eclipse_dir: Option<std::string::String>,
    /// Local stack size in bytes.
    pub local_size: Option<i64>,
    /// Global stack size in bytes.
    pub global_size: Option<i64>,
    /// Private heap size in bytes.
    pub private_size: Option<i64>,
    /// Shared heap size in bytes.
    pub shared_size: Option<i64>,
}

impl EngineConfig {
    /// Environment variable naming the installation directory.
    pub const ECLIPSEDIR: &'static str = "ECLIPSEDIR";
    pub const LOCALSIZE: &'static str = "CLP_BRIDGE_LOCALSIZE";
    pub const GLOBALSIZE: &'static str = "CLP_BRIDGE_GLOBALSIZE";
    pub const PRIVATESIZE: &'static str = "CLP_BRIDGE_PRIVATESIZE";
    pub const SHAREDSIZE: &'static str = "CLP_BRIDGE_SHAREDSIZE";

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, BridgeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable
    /// name to its value.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<std::string::String>,
    ) -> Result<Self, BridgeError> {
        let size = |key: &'static str| -> Result<Option<i64>, BridgeError> {
            match lookup(key) {
                None => Ok(None),
                Some(v) => v.trim().parse::<i64>().map(Some).map_err(|_| {
                    BridgeError::InvalidOptionType {
                        option: key,
                        expected: "integer",
                    }
                }),
            }
        };
        Ok(Self {
            eclipse_dir: lookup(Self::ECLIPSEDIR).filter(|d| !d.is_empty()),
            local_size: size(Self::LOCALSIZE)?,
            global_size: size(Self::GLOBALSIZE)?,
            private_size: size(Self::PRIVATESIZE)?,
            shared_size: size(Self::SHAREDSIZE)?,
        })
    }

    /// Returns the configured options in the order they are applied.
    pub fn options(&self) -> Vec<(EngineOption, OptionValue)> {
        let mut out = Vec::new();
        if let Some(dir) = &self.eclipse_dir {
            out.push((EngineOption::EclipseDir, OptionValue::from(dir.as_str())));
        }
        let sizes = [
            (EngineOption::LocalSize, self.local_size),
            (EngineOption::GlobalSize, self.global_size),
            (EngineOption::PrivateSize, self.private_size),
            (EngineOption::SharedSize, self.shared_size),
        ];
        for (option, size) in sizes {
            if let Some(size) = size {
                out.push((option, OptionValue::Int(size)));
            }
        }
        out
    }
}
