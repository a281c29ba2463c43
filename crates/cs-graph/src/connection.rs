//! Connection records.

use core::fmt;

use cs_core::SystemParameter;

/// Input `consumer_parameter` of `consumer_system` is driven by output
/// `producer_parameter` of `producer_system`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Connection {
    pub consumer_system: String,
    pub consumer_parameter: String,
    pub producer_system: String,
    pub producer_parameter: String,
}

impl Connection {
    pub fn new(
        consumer_system: impl Into<String>,
        consumer_parameter: impl Into<String>,
        producer_system: impl Into<String>,
        producer_parameter: impl Into<String>,
    ) -> Self {
        Self {
            consumer_system: consumer_system.into(),
            consumer_parameter: consumer_parameter.into(),
            producer_system: producer_system.into(),
            producer_parameter: producer_parameter.into(),
        }
    }

    pub fn consumer(&self) -> SystemParameter {
        SystemParameter::new(&self.consumer_system, &self.consumer_parameter)
    }

    pub fn producer(&self) -> SystemParameter {
        SystemParameter::new(&self.producer_system, &self.producer_parameter)
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} <- {}.{}",
            self.consumer_system,
            self.consumer_parameter,
            self.producer_system,
            self.producer_parameter
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_reads_consumer_first() {
        let c = Connection::new("plant", "u", "pid", "u");
        assert_eq!(c.to_string(), "plant.u <- pid.u");
        assert_eq!(c.producer().log_name(), "pid.u");
    }
}
