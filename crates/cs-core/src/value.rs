//! Parameter values exchanged between simulation entities.

use core::fmt;

use indexmap::IndexMap;

/// Kind of a parameter value. Used for declared parameter types and for
/// type-mismatch reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ValueKind {
    Real,
    Integer,
    Boolean,
    String,
    RealArray,
}

impl ValueKind {
    /// Whether a parameter declared with this kind accepts a value of `other`.
    ///
    /// Equal kinds are accepted; integers widen into reals.
    pub fn accepts(self, other: ValueKind) -> bool {
        self == other || (self == ValueKind::Real && other == ValueKind::Integer)
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Real => "real",
            ValueKind::Integer => "integer",
            ValueKind::Boolean => "boolean",
            ValueKind::String => "string",
            ValueKind::RealArray => "real array",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value read from or written to a simulation entity.
///
/// Values carry no unit; units are attached per (system, parameter) by the
/// owning entity.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum ParameterValue {
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(String),
    RealArray(Vec<f64>),
}

impl ParameterValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Integer(_) => ValueKind::Integer,
            Self::Real(_) => ValueKind::Real,
            Self::String(_) => ValueKind::String,
            Self::RealArray(_) => ValueKind::RealArray,
        }
    }

    /// Get the value as a real, widening integers.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_real_array(&self) -> Option<&[f64]> {
        match self {
            Self::RealArray(v) => Some(v),
            _ => None,
        }
    }

    /// Convert into the representation of `kind`, if `kind` accepts this value.
    pub fn coerce_to(self, kind: ValueKind) -> Option<ParameterValue> {
        if !kind.accepts(self.kind()) {
            return None;
        }
        match (kind, self) {
            (ValueKind::Real, Self::Integer(v)) => Some(Self::Real(v as f64)),
            (_, v) => Some(v),
        }
    }

    /// Zero value of a kind, used for declared parameters without a default.
    pub fn zero(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Real => Self::Real(0.0),
            ValueKind::Integer => Self::Integer(0),
            ValueKind::Boolean => Self::Boolean(false),
            ValueKind::String => Self::String(String::new()),
            ValueKind::RealArray => Self::RealArray(Vec::new()),
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::RealArray(values) => {
                f.write_str("[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(";")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<f64>> for ParameterValue {
    fn from(value: Vec<f64>) -> Self {
        Self::RealArray(value)
    }
}

/// A start value, optionally annotated with a unit.
///
/// The unit is informational only; no conversion is performed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "StartValueRepr", into = "StartValueRepr"))]
pub struct StartValue {
    pub value: ParameterValue,
    pub unit: Option<String>,
}

impl StartValue {
    pub fn new(value: impl Into<ParameterValue>) -> Self {
        Self {
            value: value.into(),
            unit: None,
        }
    }

    pub fn with_unit(value: impl Into<ParameterValue>, unit: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            unit: Some(unit.into()),
        }
    }
}

impl From<ParameterValue> for StartValue {
    fn from(value: ParameterValue) -> Self {
        Self::new(value)
    }
}

/// Serialized form: a bare value, or `{ value, unit }`.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
enum StartValueRepr {
    WithUnit {
        value: ParameterValue,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
    Bare(ParameterValue),
}

#[cfg(feature = "serde")]
impl From<StartValueRepr> for StartValue {
    fn from(repr: StartValueRepr) -> Self {
        match repr {
            StartValueRepr::WithUnit { value, unit } => Self { value, unit },
            StartValueRepr::Bare(value) => Self { value, unit: None },
        }
    }
}

#[cfg(feature = "serde")]
impl From<StartValue> for StartValueRepr {
    fn from(start: StartValue) -> Self {
        match start.unit {
            Some(unit) => Self::WithUnit {
                value: start.value,
                unit: Some(unit),
            },
            None => Self::Bare(start.value),
        }
    }
}

/// Start values of one system, keyed by parameter name in application order.
pub type StartValues = IndexMap<String, StartValue>;
