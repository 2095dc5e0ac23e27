//! Decoded parameter records.
//!
//! Record names are a stable downstream contract:
//!
//! | kind       | name                                   | value            |
//! |------------|----------------------------------------|------------------|
//! | `sensor`   | `<type>_<id>` (`_<subtype>` if ≠ 0)    | 16-bit reading   |
//! | `relay`    | `relay_<id>`                           | on/off byte      |
//! | `overview` | `<period>_<id>`                        | heat yield       |

use std::fmt;

/// Parameter kind. The published strings are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    Sensor,
    Relay,
    Overview,
}

impl ParameterKind {
    pub const ALL: [ParameterKind; 3] = [
        ParameterKind::Sensor,
        ParameterKind::Relay,
        ParameterKind::Overview,
    ];

    /// Kind name as published downstream.
    pub fn as_str(self) -> &'static str {
        match self {
            ParameterKind::Sensor => "sensor",
            ParameterKind::Relay => "relay",
            ParameterKind::Overview => "overview",
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded, named, typed numeric reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterRecord {
    pub kind: ParameterKind,
    pub name: String,
    pub value: i64,
}

impl ParameterRecord {
    pub fn new(kind: ParameterKind, name: impl Into<String>, value: i64) -> Self {
        Self {
            kind,
            name: name.into(),
            value,
        }
    }
}

impl fmt::Display for ParameterRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}={}", self.kind, self.name, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_wire_names() {
        let names: Vec<_> = ParameterKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(names, ["sensor", "relay", "overview"]);
    }

    #[test]
    fn test_record_display() {
        let record = ParameterRecord::new(ParameterKind::Relay, "relay_1", 1);
        assert_eq!(record.to_string(), "relay/relay_1=1");
    }
}
