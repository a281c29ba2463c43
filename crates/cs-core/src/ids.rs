use core::fmt;
use core::num::NonZeroU32;

/// Compact identifier for a system, derived from its registration index.
///
/// - `u32` keeps memory small
/// - `NonZero` enables `Option<SystemId>` to be pointer-optimized
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemId(NonZeroU32);

impl SystemId {
    /// Create an id from a 0-based registration index by storing index+1.
    pub fn from_index(index: usize) -> Self {
        let raw = u32::try_from(index).unwrap_or(u32::MAX - 1) + 1;
        // raw >= 1
        Self(NonZeroU32::new(raw).unwrap_or(NonZeroU32::MIN))
    }

    /// Recover the 0-based registration index.
    pub fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl fmt::Debug for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SystemId({})", self.index())
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// A parameter of a named system, e.g. `plant.y`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SystemParameter {
    pub system: String,
    pub parameter: String,
}

impl SystemParameter {
    pub fn new(system: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            parameter: parameter.into(),
        }
    }

    /// Column name used in results: `"<system>.<parameter>"`.
    pub fn log_name(&self) -> String {
        format!("{}.{}", self.system, self.parameter)
    }
}

impl fmt::Display for SystemParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.system, self.parameter)
    }
}
