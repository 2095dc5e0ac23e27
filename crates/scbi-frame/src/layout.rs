//! Basic-variant payload layouts.
//!
//! All multi-byte fields are little-endian and the layouts are packed:
//!
//! ```text
//! sensor:   id u8 | value u16 | type u8 | subtype u8
//! relay:    id u8 | mode u8   | on u8   | ext_func[0] u8 | ext_func[1] u8
//! overview: id:5 + period:3   | hours u16 | heat_yield u32
//! ```

use bytes::Buf;

use crate::error::{PayloadError, Result};
use crate::id::{Envelope, Function, ProtocolVariant};
use crate::param::{ParameterKind, ParameterRecord};

/// Payload length every fixed layout requires.
pub const FIXED_LAYOUT_LEN: usize = 8;

/// Physical quantity reported by a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorType {
    Unknown,
    Flow,
    RelPressure,
    DiffPressure,
    Temperature,
    Humidity,
    RoomWheel,
    RoomSwitch,
    Other(u8),
}

impl SensorType {
    /// Name fragment used in published parameter names.
    pub fn slug(self) -> String {
        match self {
            SensorType::Unknown => "unknown".to_string(),
            SensorType::Flow => "flow".to_string(),
            SensorType::RelPressure => "rel_pressure".to_string(),
            SensorType::DiffPressure => "diff_pressure".to_string(),
            SensorType::Temperature => "temperature".to_string(),
            SensorType::Humidity => "humidity".to_string(),
            SensorType::RoomWheel => "room_wheel".to_string(),
            SensorType::RoomSwitch => "room_switch".to_string(),
            SensorType::Other(code) => format!("type{code:02x}"),
        }
    }
}

impl From<u8> for SensorType {
    fn from(code: u8) -> Self {
        match code {
            0x00 => SensorType::Unknown,
            0x01 => SensorType::Flow,
            0x02 => SensorType::RelPressure,
            0x03 => SensorType::DiffPressure,
            0x04 => SensorType::Temperature,
            0x05 => SensorType::Humidity,
            0x06 => SensorType::RoomWheel,
            0x07 => SensorType::RoomSwitch,
            other => SensorType::Other(other),
        }
    }
}

/// How a relay output is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayMode {
    Switched,
    Phase,
    Pwm,
    Voltage,
    Other(u8),
}

impl RelayMode {
    pub fn name(self) -> &'static str {
        match self {
            RelayMode::Switched => "switched",
            RelayMode::Phase => "phase",
            RelayMode::Pwm => "pwm",
            RelayMode::Voltage => "voltage",
            RelayMode::Other(_) => "unknown",
        }
    }
}

impl From<u8> for RelayMode {
    fn from(code: u8) -> Self {
        match code {
            0x00 => RelayMode::Switched,
            0x01 => RelayMode::Phase,
            0x02 => RelayMode::Pwm,
            0x03 => RelayMode::Voltage,
            other => RelayMode::Other(other),
        }
    }
}

/// Known relay extended-function codes.
const EXT_FUNCTION_NAMES: &[(u8, &str)] = &[
    (0x00, "solar_bypass"),
    (0x01, "heating"),
    (0x02, "heating2"),
    (0x03, "cooling"),
    (0x04, "ret_flow_increase"),
    (0x05, "dissipation"),
    (0x06, "antilegio"),
    (0x07, "reverse_loading"),
    (0x08, "difference"),
    (0x09, "wood_boiler"),
    (0x10, "safety_fct"),
    (0x11, "pressure_ctrl"),
    (0x12, "booster"),
    (0x13, "r1_parallel_op"),
    (0x14, "r2_parallel_op"),
    (0x15, "always_on"),
    (0x16, "heating_circuit_rc21"),
    (0x17, "circulation"),
    (0x18, "storage_heating"),
    (0x19, "storage_stacking"),
    (0x20, "r_v1_parallel"),
    (0x21, "r_v2_parallel"),
    (0x22, "r1_permanently_on"),
    (0x23, "r2_permanently_on"),
    (0x24, "r3_permanently_on"),
    (0x25, "v2_permanently_on"),
    (0x26, "external_heating"),
    (0x27, "new_log_message"),
    (0x28, "extra_pump"),
    (0x29, "primary_mixer_up"),
    (0x30, "primary_mixer_down"),
    (0x31, "solar"),
    (0x32, "cascade"),
];

/// One of the two extended-function slots of a relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayExtFunction {
    /// A function code, known or not.
    Function(u8),
    Disabled,
    Unselected,
}

impl RelayExtFunction {
    pub fn code(self) -> u8 {
        match self {
            RelayExtFunction::Function(code) => code,
            RelayExtFunction::Disabled => 0xFE,
            RelayExtFunction::Unselected => 0xFF,
        }
    }

    /// Name of the slot, `None` for function codes outside the known table.
    pub fn name(self) -> Option<&'static str> {
        match self {
            RelayExtFunction::Disabled => Some("disabled"),
            RelayExtFunction::Unselected => Some("unselected"),
            RelayExtFunction::Function(code) => EXT_FUNCTION_NAMES
                .iter()
                .find(|(known, _)| *known == code)
                .map(|(_, name)| *name),
        }
    }
}

impl From<u8> for RelayExtFunction {
    fn from(code: u8) -> Self {
        match code {
            0xFE => RelayExtFunction::Disabled,
            0xFF => RelayExtFunction::Unselected,
            other => RelayExtFunction::Function(other),
        }
    }
}

/// Aggregation period of an overview statistic (3 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverviewPeriod {
    Days,
    Weeks,
    Months,
    Years,
    Total,
    Status,
    Other(u8),
}

impl OverviewPeriod {
    /// Name fragment used in published parameter names.
    pub fn slug(self) -> String {
        match self {
            OverviewPeriod::Days => "days".to_string(),
            OverviewPeriod::Weeks => "weeks".to_string(),
            OverviewPeriod::Months => "months".to_string(),
            OverviewPeriod::Years => "years".to_string(),
            OverviewPeriod::Total => "total".to_string(),
            OverviewPeriod::Status => "status".to_string(),
            OverviewPeriod::Other(code) => format!("period{code}"),
        }
    }
}

impl From<u8> for OverviewPeriod {
    fn from(code: u8) -> Self {
        match code & 0x07 {
            0x01 => OverviewPeriod::Days,
            0x02 => OverviewPeriod::Weeks,
            0x03 => OverviewPeriod::Months,
            0x04 => OverviewPeriod::Years,
            0x05 => OverviewPeriod::Total,
            0x06 => OverviewPeriod::Status,
            other => OverviewPeriod::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorReading {
    pub id: u8,
    pub value: u16,
    pub sensor_type: SensorType,
    pub subtype: u8,
}

impl SensorReading {
    /// `<type>_<id>`, plus `_<subtype>` when the subtype is non-zero.
    pub fn name(&self) -> String {
        let base = format!("{}_{}", self.sensor_type.slug(), self.id);
        if self.subtype == 0 {
            base
        } else {
            format!("{base}_{}", self.subtype)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayState {
    pub id: u8,
    pub mode: RelayMode,
    /// Raw on/off byte; zero is off.
    pub is_on: u8,
    pub ext_functions: [RelayExtFunction; 2],
}

impl RelayState {
    pub fn on(&self) -> bool {
        self.is_on != 0
    }

    pub fn name(&self) -> String {
        format!("relay_{}", self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverviewStat {
    /// Five-bit slot index.
    pub id: u8,
    pub period: OverviewPeriod,
    pub hours: u16,
    pub heat_yield: u32,
}

impl OverviewStat {
    pub fn name(&self) -> String {
        format!("{}_{}", self.period.slug(), self.id)
    }
}

/// The closed set of basic-variant payload interpretations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    Sensor(SensorReading),
    Relay(RelayState),
    Overview(OverviewStat),
}

impl Payload {
    /// Interpret `data` according to the envelope.
    ///
    /// Returns `Ok(None)` for functions without a fixed layout and for
    /// remote-request frames; those are expected and not anomalies.
    pub fn parse(envelope: &Envelope, data: &[u8]) -> Result<Option<Payload>> {
        if envelope.protocol != ProtocolVariant::Basic {
            return Err(PayloadError::UnsupportedVariant(envelope.protocol));
        }
        if !matches!(
            envelope.function,
            Function::Sensor | Function::Relay | Function::Overview
        ) {
            return Ok(None);
        }
        if envelope.remote_request {
            return Ok(None);
        }
        if data.len() < FIXED_LAYOUT_LEN {
            return Err(PayloadError::ShortPayload {
                function: envelope.function,
                len: data.len(),
                required: FIXED_LAYOUT_LEN,
            });
        }

        let mut buf = data;
        let payload = match envelope.function {
            Function::Sensor => Payload::Sensor(SensorReading {
                id: buf.get_u8(),
                value: buf.get_u16_le(),
                sensor_type: SensorType::from(buf.get_u8()),
                subtype: buf.get_u8(),
            }),
            Function::Relay => Payload::Relay(RelayState {
                id: buf.get_u8(),
                mode: RelayMode::from(buf.get_u8()),
                is_on: buf.get_u8(),
                ext_functions: [
                    RelayExtFunction::from(buf.get_u8()),
                    RelayExtFunction::from(buf.get_u8()),
                ],
            }),
            Function::Overview => {
                let head = buf.get_u8();
                Payload::Overview(OverviewStat {
                    id: head & 0x1F,
                    period: OverviewPeriod::from(head >> 5),
                    hours: buf.get_u16_le(),
                    heat_yield: buf.get_u32_le(),
                })
            }
            _ => return Ok(None),
        };
        Ok(Some(payload))
    }

    pub fn kind(&self) -> ParameterKind {
        match self {
            Payload::Sensor(_) => ParameterKind::Sensor,
            Payload::Relay(_) => ParameterKind::Relay,
            Payload::Overview(_) => ParameterKind::Overview,
        }
    }

    /// Normalize into the published record.
    ///
    /// Sensors publish the reading, relays the on/off byte and overview
    /// statistics the accumulated heat yield.
    pub fn to_record(&self) -> ParameterRecord {
        match self {
            Payload::Sensor(s) => ParameterRecord::new(self.kind(), s.name(), i64::from(s.value)),
            Payload::Relay(r) => ParameterRecord::new(self.kind(), r.name(), i64::from(r.is_on)),
            Payload::Overview(o) => {
                ParameterRecord::new(self.kind(), o.name(), i64::from(o.heat_yield))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{MessageKind, Program};

    fn envelope(function: Function) -> Envelope {
        Envelope {
            program: Program::DataloggerNamedSensors,
            sender: 1,
            function,
            protocol: ProtocolVariant::Basic,
            kind: MessageKind::Response,
            error: false,
            remote_request: false,
            extended: true,
        }
    }

    #[test]
    fn parses_sensor_layout() {
        let data = [3, 0xD7, 0x00, 0x04, 0x00, 0, 0, 0];
        let payload = Payload::parse(&envelope(Function::Sensor), &data)
            .unwrap()
            .unwrap();

        assert_eq!(
            payload,
            Payload::Sensor(SensorReading {
                id: 3,
                value: 215,
                sensor_type: SensorType::Temperature,
                subtype: 0,
            })
        );
    }

    #[test]
    fn sensor_value_is_little_endian() {
        let data = [1, 0x34, 0x12, 0x01, 0x00, 0, 0, 0];
        let Some(Payload::Sensor(s)) = Payload::parse(&envelope(Function::Sensor), &data).unwrap()
        else {
            panic!("expected sensor payload");
        };
        assert_eq!(s.value, 0x1234);
        assert_eq!(s.sensor_type, SensorType::Flow);
    }

    #[test]
    fn parses_relay_layout() {
        let data = [1, 0x02, 0x01, 0xFE, 0xFF, 0, 0, 0];
        let Some(Payload::Relay(r)) = Payload::parse(&envelope(Function::Relay), &data).unwrap()
        else {
            panic!("expected relay payload");
        };

        assert_eq!(r.id, 1);
        assert_eq!(r.mode, RelayMode::Pwm);
        assert!(r.on());
        assert_eq!(
            r.ext_functions,
            [RelayExtFunction::Disabled, RelayExtFunction::Unselected]
        );
    }

    #[test]
    fn parses_overview_bitfield() {
        // id 2, period months (3): 0b011_00010
        let head: u8 = (3 << 5) | 2;
        let data = [head, 0x10, 0x00, 0x40, 0x42, 0x0F, 0x00, 0x00];
        let Some(Payload::Overview(o)) =
            Payload::parse(&envelope(Function::Overview), &data).unwrap()
        else {
            panic!("expected overview payload");
        };

        assert_eq!(o.id, 2);
        assert_eq!(o.period, OverviewPeriod::Months);
        assert_eq!(o.hours, 16);
        assert_eq!(o.heat_yield, 1_000_000);
        assert_eq!(o.name(), "months_2");
    }

    #[test]
    fn layoutless_function_yields_nothing() {
        let data = [0u8; 8];
        for function in [
            Function::Undefined,
            Function::HydraulicProgram,
            Function::Statistic,
            Function::Other(0x42),
        ] {
            assert_eq!(Payload::parse(&envelope(function), &data).unwrap(), None);
        }
    }

    #[test]
    fn remote_request_is_not_short() {
        let mut env = envelope(Function::Sensor);
        env.remote_request = true;
        assert_eq!(Payload::parse(&env, &[]).unwrap(), None);
    }

    #[test]
    fn short_payload_is_reported() {
        let err = Payload::parse(&envelope(Function::Relay), &[1, 2, 3, 4, 5]).unwrap_err();
        assert!(matches!(
            err,
            PayloadError::ShortPayload {
                function: Function::Relay,
                len: 5,
                required: FIXED_LAYOUT_LEN,
            }
        ));
    }

    #[test]
    fn sensor_names_follow_scheme() {
        let mut reading = SensorReading {
            id: 7,
            value: 0,
            sensor_type: SensorType::DiffPressure,
            subtype: 0,
        };
        assert_eq!(reading.name(), "diff_pressure_7");

        reading.subtype = 2;
        assert_eq!(reading.name(), "diff_pressure_7_2");

        reading.sensor_type = SensorType::Other(0x4a);
        assert_eq!(reading.name(), "type4a_7_2");
    }

    #[test]
    fn ext_function_names() {
        assert_eq!(RelayExtFunction::from(0x17).name(), Some("circulation"));
        assert_eq!(
            RelayExtFunction::from(0x30).name(),
            Some("primary_mixer_down")
        );
        assert_eq!(RelayExtFunction::from(0x0A).name(), None);
        assert_eq!(RelayExtFunction::from(0xFE).code(), 0xFE);
    }

    #[test]
    fn overview_record_publishes_heat_yield() {
        let payload = Payload::Overview(OverviewStat {
            id: 0,
            period: OverviewPeriod::Total,
            hours: 1200,
            heat_yield: 4_000_000_000,
        });
        let record = payload.to_record();
        assert_eq!(record.kind, ParameterKind::Overview);
        assert_eq!(record.name, "total_0");
        assert_eq!(record.value, 4_000_000_000);
    }
}
