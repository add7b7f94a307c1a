//! Synthetic responses for running without hardware.

use tracing::debug;

use super::protocol::{Instruction, Request, Response};

/// Plausible sensor voltage range for synthetic readings.
const SYNTHETIC_VOLTAGE_RANGE: (f64, f64) = (0.5, 3.0);

/// Build a successful response that echoes `request`.
///
/// Channel, instruction and id are copied from the request. Voltage reads
/// return a random value in a plausible range; everything else returns 0.
/// Statuses built from these responses carry `synthetic = true`.
pub fn synthesize(request: &Request) -> Response {
    let data = match request.instruction {
        Instruction::GetVoltage => {
            let (low, high) = SYNTHETIC_VOLTAGE_RANGE;
            low + rand::random::<f64>() * (high - low)
        }
        Instruction::GetState | Instruction::TurnOn | Instruction::TurnOff => 0.0,
    };

    debug!(
        synthetic = true,
        channel = request.channel,
        instruction = %request.instruction,
        id = request.id,
        data,
        "Synthesized device response"
    );

    Response {
        id: request.id,
        channel: request.channel,
        instruction: request.instruction,
        success: true,
        data,
        message: String::new(),
    }
}
