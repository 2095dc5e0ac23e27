use std::fmt;

use tracing::trace;

use crate::error::Result;
use crate::id::Envelope;
use crate::layout::Payload;
use crate::param::ParameterRecord;

/// Maximum payload bytes carried by one frame.
pub const MAX_PAYLOAD: usize = 8;

/// A received frame, stamped relative to the start of the receive loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame {
    pub id: u32,
    pub data: [u8; MAX_PAYLOAD],
    pub len: u8,
    /// Milliseconds between loop start and receipt.
    pub received_ms: u64,
}

impl RawFrame {
    /// Create a frame; payload bytes beyond the eighth are ignored.
    pub fn new(id: u32, payload: &[u8], received_ms: u64) -> Self {
        let len = payload.len().min(MAX_PAYLOAD);
        let mut data = [0u8; MAX_PAYLOAD];
        data[..len].copy_from_slice(&payload[..len]);
        Self {
            id,
            data,
            len: len as u8,
            received_ms,
        }
    }

    pub fn envelope(&self) -> Envelope {
        Envelope::decode(self.id)
    }

    /// The valid payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.data[..usize::from(self.len)]
    }
}

impl fmt::Display for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:>8}ms] id=0x{:08x} {} len={} data=",
            self.received_ms,
            self.id,
            self.envelope(),
            self.len
        )?;
        for (i, byte) in self.payload().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Decode a payload into parameter records.
///
/// Functions without a fixed layout produce no records. Non-basic protocol
/// variants and payloads shorter than the fixed layout are reported as
/// [`PayloadError`](crate::PayloadError) and also produce no records.
pub fn decode_payload(envelope: &Envelope, data: &[u8]) -> Result<Vec<ParameterRecord>> {
    match Payload::parse(envelope, data)? {
        Some(payload) => Ok(vec![payload.to_record()]),
        None => {
            trace!(function = %envelope.function, "no payload layout for frame");
            Ok(Vec::new())
        }
    }
}

/// Decode identifier and payload of a received frame in one step.
pub fn decode_frame(frame: &RawFrame) -> (Envelope, Result<Vec<ParameterRecord>>) {
    let envelope = frame.envelope();
    let records = decode_payload(&envelope, frame.payload());
    (envelope, records)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::error::PayloadError;
    use crate::id::{Function, MessageKind, Program, ProtocolVariant};
    use crate::param::ParameterKind;

    fn envelope(function: u8, protocol: ProtocolVariant) -> Envelope {
        Envelope {
            program: Program::DataloggerNamedSensors,
            sender: 0x01,
            function: Function::from(function),
            protocol,
            kind: MessageKind::Response,
            error: false,
            remote_request: false,
            extended: true,
        }
    }

    #[test]
    fn test_sensor_frame_yields_one_record() {
        let env = envelope(0x01, ProtocolVariant::Basic);
        let data = [3, 0xD7, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00];

        let records = decode_payload(&env, &data).unwrap();

        assert_eq!(
            records,
            vec![ParameterRecord::new(
                ParameterKind::Sensor,
                "temperature_3",
                215
            )]
        );
    }

    #[test]
    fn test_relay_frame_publishes_on_state() {
        let env = envelope(0x02, ProtocolVariant::Basic);
        let data = [1, 0x02, 0x01, 0xFE, 0xFF, 0x00, 0x00, 0x00];

        let records = decode_payload(&env, &data).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ParameterKind::Relay);
        assert_eq!(records[0].name, "relay_1");
        assert_eq!(records[0].value, 1);
    }

    #[test]
    fn test_bulk_variant_yields_no_records() {
        let env = envelope(0x01, ProtocolVariant::Bulk);
        let data = [3, 0xD7, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00];

        let result = decode_payload(&env, &data);
        assert_eq!(
            result,
            Err(PayloadError::UnsupportedVariant(ProtocolVariant::Bulk))
        );
    }

    #[test]
    fn test_update_variant_yields_no_records() {
        let env = envelope(0x07, ProtocolVariant::Update);
        assert!(decode_payload(&env, &[0u8; 8]).is_err());
    }

    #[test]
    fn test_short_payload_reported() {
        let env = envelope(0x01, ProtocolVariant::Basic);
        let result = decode_payload(&env, &[3, 0xD7, 0x00, 0x04, 0x00]);
        assert!(matches!(
            result,
            Err(PayloadError::ShortPayload {
                len: 5,
                required: 8,
                ..
            })
        ));
    }

    #[test]
    fn test_decode_frame_uses_identifier() {
        let frame = RawFrame::new(0x9001_0184, &[3, 0xD7, 0x00, 0x04, 0, 0, 0, 0], 12);
        let (env, records) = decode_frame(&frame);

        assert_eq!(env.function, Function::Sensor);
        assert_eq!(records.unwrap()[0].value, 215);
    }

    #[test]
    fn test_raw_frame_display() {
        let frame = RawFrame::new(0x9002_0184, &[0x01, 0xAB], 1500);
        assert_eq!(
            frame.to_string(),
            "[    1500ms] id=0x90020184 prog=0x84 sender=0x01 func=0x02 prot=basic msg=response eff len=2 data=01 ab"
        );
    }

    proptest! {
        #[test]
        fn decoding_is_deterministic(id in any::<u32>(), data in proptest::collection::vec(any::<u8>(), 0..=8)) {
            let env = Envelope::decode(id);
            prop_assert_eq!(decode_payload(&env, &data), decode_payload(&env, &data));
        }

        #[test]
        fn unknown_functions_yield_nothing(function in 0x08u8..=0xFF, data in proptest::collection::vec(any::<u8>(), 0..=8)) {
            let env = envelope(function, ProtocolVariant::Basic);
            prop_assert_eq!(decode_payload(&env, &data), Ok(Vec::new()));
        }

        #[test]
        fn short_payloads_never_produce_records(len in 0usize..8, function in prop::sample::select(vec![0x01u8, 0x02, 0x07])) {
            let env = envelope(function, ProtocolVariant::Basic);
            let data = vec![0xA5u8; len];
            let is_short = matches!(
                decode_payload(&env, &data),
                Err(PayloadError::ShortPayload { .. })
            );
            prop_assert!(is_short);
        }
    }
}
