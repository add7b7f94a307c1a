//! Wire format for pump controller requests and responses.
//!
//! Each exchange is one JSON object per line in each direction:
//!
//! ```text
//! -> {"channel":2,"instruction":"get_voltage","data":0,"id":17}
//! <- {"id":17,"channel":2,"instruction":"get_voltage","success":true,"data":1.42,"message":""}
//! ```
//!
//! Responses are decoded through an untyped [`serde_json::Value`] first so
//! that a missing key and an unknown instruction can be reported as distinct
//! errors rather than a generic parse failure.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::ProtocolError;

/// Line terminator written after every request frame.
pub const FRAME_DELIMITER: char = '\n';

/// Operations understood by the pump controller firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    /// Run the pump for `data` milliseconds.
    TurnOn,
    /// Stop the pump.
    TurnOff,
    /// Read the moisture sensor voltage.
    GetVoltage,
    /// Read whether the pump is running (non-zero = running).
    GetState,
}

impl Instruction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Instruction::TurnOn => "turn_on",
            Instruction::TurnOff => "turn_off",
            Instruction::GetVoltage => "get_voltage",
            Instruction::GetState => "get_state",
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Instruction {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "turn_on" => Ok(Instruction::TurnOn),
            "turn_off" => Ok(Instruction::TurnOff),
            "get_voltage" => Ok(Instruction::GetVoltage),
            "get_state" => Ok(Instruction::GetState),
            other => Err(ProtocolError::UnknownInstruction(other.to_string())),
        }
    }
}

/// A request addressed to one channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    pub channel: u32,
    pub instruction: Instruction,
    pub data: i64,
    pub id: u64,
}

impl Request {
    pub fn new(channel: u32, instruction: Instruction, data: i64, id: u64) -> Self {
        Self {
            channel,
            instruction,
            data,
            id,
        }
    }
}

/// A decoded device response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub id: u64,
    pub channel: u32,
    pub instruction: Instruction,
    pub success: bool,
    pub data: f64,
    pub message: String,
}

/// Encode a request into a single delimited frame.
pub fn encode(request: &Request) -> String {
    // Serializing a plain struct of integers and a unit enum cannot fail.
    let mut frame = serde_json::to_string(request).unwrap_or_default();
    frame.push(FRAME_DELIMITER);
    frame
}

/// Decode one raw response frame as read from the link.
pub fn decode_frame(frame: &[u8]) -> Result<Response, ProtocolError> {
    let line = std::str::from_utf8(frame)
        .map_err(|e| ProtocolError::Deserialize(format!("frame is not valid UTF-8: {}", e)))?;
    decode(line)
}

/// Decode one response line.
///
/// Trailing `\r`/`\n` are ignored.
pub fn decode(line: &str) -> Result<Response, ProtocolError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let value: Value =
        serde_json::from_str(line).map_err(|e| ProtocolError::Deserialize(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| ProtocolError::Deserialize(format!("expected an object, got '{}'", line)))?;

    let id = required(object, "id")?
        .as_u64()
        .ok_or_else(|| invalid("id", "a non-negative integer"))?;
    let channel = required(object, "channel")?
        .as_u64()
        .and_then(|c| u32::try_from(c).ok())
        .ok_or_else(|| invalid("channel", "a non-negative integer"))?;
    let instruction = required(object, "instruction")?
        .as_str()
        .ok_or_else(|| invalid("instruction", "a string"))?;
    let success = required(object, "success")?
        .as_bool()
        .ok_or_else(|| invalid("success", "a boolean"))?;
    let data = required(object, "data")?
        .as_f64()
        .ok_or_else(|| invalid("data", "a number"))?;
    let message = required(object, "message")?
        .as_str()
        .ok_or_else(|| invalid("message", "a string"))?
        .to_string();

    Ok(Response {
        id,
        channel,
        instruction: instruction.parse()?,
        success,
        data,
        message,
    })
}

/// Fail unless `response` answers `request`.
pub fn verify_correlation(request: &Request, response: &Response) -> Result<(), ProtocolError> {
    if response.id != request.id {
        return Err(ProtocolError::CorrelationMismatch {
            expected: request.id,
            actual: response.id,
        });
    }
    Ok(())
}

fn required<'a>(
    object: &'a Map<String, Value>,
    key: &'static str,
) -> Result<&'a Value, ProtocolError> {
    object.get(key).ok_or(ProtocolError::MissingField(key))
}

fn invalid(key: &str, expected: &str) -> ProtocolError {
    ProtocolError::Deserialize(format!("field '{}' must be {}", key, expected))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_line(id: u64, instruction: &str) -> String {
        format!(
            r#"{{"id":{},"channel":1,"instruction":"{}","success":true,"data":1.5,"message":""}}"#,
            id, instruction
        )
    }

    #[test]
    fn test_encode_is_single_delimited_line() {
        let frame = encode(&Request::new(1, Instruction::TurnOn, 100, 7));
        assert!(frame.ends_with('\n'));
        assert_eq!(frame.matches('\n').count(), 1);

        let value: Value = serde_json::from_str(frame.trim_end()).unwrap();
        assert_eq!(value["channel"], 1);
        assert_eq!(value["instruction"], "turn_on");
        assert_eq!(value["data"], 100);
        assert_eq!(value["id"], 7);
    }

    #[test]
    fn test_decode_valid_response() {
        let response = decode(&format!("{}\r\n", response_line(3, "get_voltage"))).unwrap();
        assert_eq!(response.id, 3);
        assert_eq!(response.channel, 1);
        assert_eq!(response.instruction, Instruction::GetVoltage);
        assert!(response.success);
        assert_eq!(response.data, 1.5);
        assert!(response.message.is_empty());
    }

    #[test]
    fn test_decode_integer_data() {
        let line = r#"{"id":1,"channel":0,"instruction":"get_state","success":true,"data":1,"message":""}"#;
        assert_eq!(decode(line).unwrap().data, 1.0);
    }

    #[test]
    fn test_decode_malformed_frame() {
        assert!(matches!(
            decode(r#"{"id":1,"channel""#),
            Err(ProtocolError::Deserialize(_))
        ));
        assert!(matches!(decode("Arduino ready"), Err(ProtocolError::Deserialize(_))));
        assert!(matches!(decode("[1,2,3]"), Err(ProtocolError::Deserialize(_))));
    }

    #[test]
    fn test_decode_frame_rejects_invalid_utf8() {
        assert!(matches!(
            decode_frame(b"{\"id\":1,\xff\xfe}"),
            Err(ProtocolError::Deserialize(_))
        ));
        let frame = response_line(4, "get_state");
        assert_eq!(decode_frame(frame.as_bytes()).unwrap().id, 4);
    }

    #[test]
    fn test_decode_missing_field() {
        let line = r#"{"id":1,"channel":0,"instruction":"get_state","data":1,"message":""}"#;
        assert!(matches!(
            decode(line),
            Err(ProtocolError::MissingField("success"))
        ));
    }

    #[test]
    fn test_decode_unknown_instruction() {
        match decode(&response_line(1, "self_destruct")) {
            Err(ProtocolError::UnknownInstruction(name)) => assert_eq!(name, "self_destruct"),
            other => panic!("expected UnknownInstruction, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_wrong_type_is_deserialize_error() {
        let line = r#"{"id":"one","channel":0,"instruction":"get_state","success":true,"data":1,"message":""}"#;
        assert!(matches!(decode(line), Err(ProtocolError::Deserialize(_))));
    }

    #[test]
    fn test_correlation_mismatch() {
        let request = Request::new(1, Instruction::GetVoltage, 0, 10);
        let response = decode(&response_line(11, "get_voltage")).unwrap();
        match verify_correlation(&request, &response) {
            Err(ProtocolError::CorrelationMismatch { expected, actual }) => {
                assert_eq!(expected, 10);
                assert_eq!(actual, 11);
            }
            other => panic!("expected CorrelationMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_correlation_match() {
        let request = Request::new(1, Instruction::GetVoltage, 0, 10);
        let response = decode(&response_line(10, "get_voltage")).unwrap();
        assert!(verify_correlation(&request, &response).is_ok());
    }

    #[test]
    fn test_instruction_parse() {
        for instruction in [
            Instruction::TurnOn,
            Instruction::TurnOff,
            Instruction::GetVoltage,
            Instruction::GetState,
        ] {
            assert_eq!(instruction.as_str().parse::<Instruction>().unwrap(), instruction);
        }
    }
}
