//! Identifier codec.
//!
//! The 32-bit CAN identifier word carries every routing discriminator of an
//! SCBI frame. Bit 0 is the least significant bit:
//!
//! ```text
//!  31   30   29   28..27  26..24   23..16     15..8     7..0
//! ┌────┬────┬────┬───────┬────────┬──────────┬─────────┬─────────┐
//! │EFF │RTR │ERR │ msg   │ prot   │ function │ sender  │ program │
//! └────┴────┴────┴───────┴────────┴──────────┴─────────┴─────────┘
//! ```
//!
//! The three flag bits coincide with the Linux `CAN_EFF_FLAG`,
//! `CAN_RTR_FLAG` and `CAN_ERR_FLAG`. Decoding is total: codes outside the
//! known tables are kept as `Other(code)` so that [`Envelope::encode`] always
//! reproduces the original word.

use std::fmt;

const PROGRAM_SHIFT: u32 = 0;
const SENDER_SHIFT: u32 = 8;
const FUNCTION_SHIFT: u32 = 16;
const PROTOCOL_SHIFT: u32 = 24;
const KIND_SHIFT: u32 = 27;
const ERROR_BIT: u32 = 1 << 29;
const RTR_BIT: u32 = 1 << 30;
const EFF_BIT: u32 = 1 << 31;

const BYTE_MASK: u32 = 0xFF;
const PROTOCOL_MASK: u32 = 0x07;
const KIND_MASK: u32 = 0x03;

/// Device/program class originating or addressed by a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Program {
    Controller,
    DataloggerMonitor,
    RemoteSensor,
    /// Alias of the remote-sensor program kept for older dataloggers.
    DataloggerNamedSensors,
    Hcc,
    AvailableResources,
    ParameterSyncConfig,
    RoomSync,
    MsgLog,
    Cbcs,
    Other(u8),
}

impl Program {
    /// Human-readable program name.
    pub fn name(self) -> &'static str {
        match self {
            Program::Controller => "controller",
            Program::DataloggerMonitor => "datalogger_monitor",
            Program::RemoteSensor => "remote_sensor",
            Program::DataloggerNamedSensors => "datalogger_named_sensors",
            Program::Hcc => "hcc",
            Program::AvailableResources => "available_resources",
            Program::ParameterSyncConfig => "parameter_sync_config",
            Program::RoomSync => "room_sync",
            Program::MsgLog => "msg_log",
            Program::Cbcs => "cbcs",
            Program::Other(_) => "unknown",
        }
    }
}

impl From<u8> for Program {
    fn from(code: u8) -> Self {
        match code {
            0x0B => Program::Controller,
            0x80 => Program::DataloggerMonitor,
            0x83 => Program::RemoteSensor,
            0x84 => Program::DataloggerNamedSensors,
            0x85 => Program::Hcc,
            0x8C => Program::AvailableResources,
            0x90 => Program::ParameterSyncConfig,
            0x91 => Program::RoomSync,
            0x94 => Program::MsgLog,
            0x95 => Program::Cbcs,
            other => Program::Other(other),
        }
    }
}

impl From<Program> for u8 {
    fn from(program: Program) -> Self {
        match program {
            Program::Controller => 0x0B,
            Program::DataloggerMonitor => 0x80,
            Program::RemoteSensor => 0x83,
            Program::DataloggerNamedSensors => 0x84,
            Program::Hcc => 0x85,
            Program::AvailableResources => 0x8C,
            Program::ParameterSyncConfig => 0x90,
            Program::RoomSync => 0x91,
            Program::MsgLog => 0x94,
            Program::Cbcs => 0x95,
            Program::Other(code) => code,
        }
    }
}

/// Payload interpretation selector within a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Undefined,
    Sensor,
    Relay,
    HydraulicProgram,
    ErrorMessage,
    ParamMonitoring,
    Statistic,
    Overview,
    HydraulicConfig,
    Other(u8),
}

impl Function {
    /// Human-readable function name.
    pub fn name(self) -> &'static str {
        match self {
            Function::Undefined => "undefined",
            Function::Sensor => "sensor",
            Function::Relay => "relay",
            Function::HydraulicProgram => "hydraulic_program",
            Function::ErrorMessage => "error_message",
            Function::ParamMonitoring => "param_monitoring",
            Function::Statistic => "statistic",
            Function::Overview => "overview",
            Function::HydraulicConfig => "hydraulic_config",
            Function::Other(_) => "unknown",
        }
    }
}

impl From<u8> for Function {
    fn from(code: u8) -> Self {
        match code {
            0x00 => Function::Undefined,
            0x01 => Function::Sensor,
            0x02 => Function::Relay,
            0x03 => Function::HydraulicProgram,
            0x04 => Function::ErrorMessage,
            0x05 => Function::ParamMonitoring,
            0x06 => Function::Statistic,
            0x07 => Function::Overview,
            0x08 => Function::HydraulicConfig,
            other => Function::Other(other),
        }
    }
}

impl From<Function> for u8 {
    fn from(function: Function) -> Self {
        match function {
            Function::Undefined => 0x00,
            Function::Sensor => 0x01,
            Function::Relay => 0x02,
            Function::HydraulicProgram => 0x03,
            Function::ErrorMessage => 0x04,
            Function::ParamMonitoring => 0x05,
            Function::Statistic => 0x06,
            Function::Overview => 0x07,
            Function::HydraulicConfig => 0x08,
            Function::Other(code) => code,
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02x})", self.name(), u8::from(*self))
    }
}

/// Payload framing variant (3 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolVariant {
    /// Payload fits a single frame and uses a fixed layout.
    Basic,
    /// Multi-frame payload larger than eight bytes.
    Bulk,
    /// Firmware update transfer.
    Update,
    /// Reserved codes 3..=7.
    Other(u8),
}

impl ProtocolVariant {
    pub fn name(self) -> &'static str {
        match self {
            ProtocolVariant::Basic => "basic",
            ProtocolVariant::Bulk => "bulk",
            ProtocolVariant::Update => "update",
            ProtocolVariant::Other(_) => "reserved",
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits & PROTOCOL_MASK as u8 {
            0 => ProtocolVariant::Basic,
            1 => ProtocolVariant::Bulk,
            2 => ProtocolVariant::Update,
            other => ProtocolVariant::Other(other),
        }
    }

    fn bits(self) -> u8 {
        match self {
            ProtocolVariant::Basic => 0,
            ProtocolVariant::Bulk => 1,
            ProtocolVariant::Update => 2,
            ProtocolVariant::Other(code) => code & PROTOCOL_MASK as u8,
        }
    }
}

impl fmt::Display for ProtocolVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.bits())
    }
}

/// Message kind (2 bits, every value defined).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Request,
    Reserve,
    Response,
    Error,
}

impl MessageKind {
    pub fn name(self) -> &'static str {
        match self {
            MessageKind::Request => "request",
            MessageKind::Reserve => "reserve",
            MessageKind::Response => "response",
            MessageKind::Error => "error",
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits & KIND_MASK as u8 {
            0 => MessageKind::Request,
            1 => MessageKind::Reserve,
            2 => MessageKind::Response,
            _ => MessageKind::Error,
        }
    }

    fn bits(self) -> u8 {
        match self {
            MessageKind::Request => 0,
            MessageKind::Reserve => 1,
            MessageKind::Response => 2,
            MessageKind::Error => 3,
        }
    }
}

/// Decoded view of a 32-bit frame identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Envelope {
    pub program: Program,
    pub sender: u8,
    pub function: Function,
    pub protocol: ProtocolVariant,
    pub kind: MessageKind,
    /// Frame signals an error condition.
    pub error: bool,
    /// Remote transmission request; such frames carry no payload.
    pub remote_request: bool,
    /// Identifier uses extended (29-bit) addressing.
    pub extended: bool,
}

impl Envelope {
    /// Decode an identifier word. Total: every input yields an envelope.
    pub fn decode(id: u32) -> Self {
        let byte = |shift: u32| ((id >> shift) & BYTE_MASK) as u8;
        Self {
            program: Program::from(byte(PROGRAM_SHIFT)),
            sender: byte(SENDER_SHIFT),
            function: Function::from(byte(FUNCTION_SHIFT)),
            protocol: ProtocolVariant::from_bits(((id >> PROTOCOL_SHIFT) & PROTOCOL_MASK) as u8),
            kind: MessageKind::from_bits(((id >> KIND_SHIFT) & KIND_MASK) as u8),
            error: id & ERROR_BIT != 0,
            remote_request: id & RTR_BIT != 0,
            extended: id & EFF_BIT != 0,
        }
    }

    /// Assemble the identifier word; exact inverse of [`Envelope::decode`].
    pub fn encode(&self) -> u32 {
        let mut id = u32::from(u8::from(self.program)) << PROGRAM_SHIFT
            | u32::from(self.sender) << SENDER_SHIFT
            | u32::from(u8::from(self.function)) << FUNCTION_SHIFT
            | u32::from(self.protocol.bits()) << PROTOCOL_SHIFT
            | u32::from(self.kind.bits()) << KIND_SHIFT;
        if self.error {
            id |= ERROR_BIT;
        }
        if self.remote_request {
            id |= RTR_BIT;
        }
        if self.extended {
            id |= EFF_BIT;
        }
        id
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "prog=0x{:02x} sender=0x{:02x} func=0x{:02x} prot={} msg={}",
            u8::from(self.program),
            self.sender,
            u8::from(self.function),
            self.protocol.name(),
            self.kind.name()
        )?;
        if self.error {
            f.write_str(" err")?;
        }
        if self.remote_request {
            f.write_str(" rtr")?;
        }
        if self.extended {
            f.write_str(" eff")?;
        }
        Ok(())
    }
}

/// Decode an identifier word into its envelope.
pub fn decode_id(id: u32) -> Envelope {
    Envelope::decode(id)
}

/// Encode an envelope back into its identifier word.
pub fn encode_id(envelope: &Envelope) -> u32 {
    envelope.encode()
}
