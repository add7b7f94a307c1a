//! Shared helpers for integration tests.
//!
//! [`SimulatedDevice`] speaks the controller's newline-delimited JSON
//! protocol over an in-memory duplex stream. Each channel has a settable
//! sensor voltage and a pump that stays on until its run time elapses.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::time::Instant;
use waterer::device::{DeviceSession, SessionConfig, SharedSession, StreamConnector};

#[derive(Debug, Default)]
struct Channel {
    voltage: f64,
    pump_until: Option<Instant>,
    turn_on_count: usize,
    last_run_ms: Option<i64>,
}

/// In-process pump controller.
#[derive(Clone)]
pub struct SimulatedDevice {
    channels: Arc<Mutex<Vec<Channel>>>,
}

impl SimulatedDevice {
    pub fn new(num_channels: usize, voltage: f64) -> Self {
        let channels = (0..num_channels)
            .map(|_| Channel {
                voltage,
                ..Channel::default()
            })
            .collect();
        Self {
            channels: Arc::new(Mutex::new(channels)),
        }
    }

    pub fn set_voltage(&self, channel: usize, voltage: f64) {
        self.channels.lock()[channel].voltage = voltage;
    }

    pub fn turn_on_count(&self, channel: usize) -> usize {
        self.channels.lock()[channel].turn_on_count
    }

    pub fn last_run_ms(&self, channel: usize) -> Option<i64> {
        self.channels.lock()[channel].last_run_ms
    }

    /// Spawn the device task and return a connected session.
    pub async fn connect(&self, config: SessionConfig) -> SharedSession {
        let (local, remote) = tokio::io::duplex(4096);
        let device = self.clone();
        tokio::spawn(async move {
            let (read, mut write) = tokio::io::split(remote);
            if write.write_all(b"Arduino ready\n").await.is_err() {
                return;
            }
            let mut lines = BufReader::new(read).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let reply = device.handle(&line);
                let frame = format!("{}\n", reply);
                if write.write_all(frame.as_bytes()).await.is_err() {
                    break;
                }
            }
        });

        let session = Arc::new(DeviceSession::new(
            config,
            Arc::new(StreamConnector::new("simulated", Box::new(local))),
        ));
        session.connect().await.unwrap();
        session
    }

    fn handle(&self, line: &str) -> Value {
        let request: Value = serde_json::from_str(line).unwrap();
        let channel = request["channel"].as_u64().unwrap() as usize;
        let instruction = request["instruction"].as_str().unwrap_or_default();

        let mut channels = self.channels.lock();
        let Some(state) = channels.get_mut(channel) else {
            return reply(&request, false, 0.0, &format!("Channel {} not found", channel));
        };

        let now = Instant::now();
        let data = match instruction {
            "get_voltage" => state.voltage,
            "get_state" => {
                let running = state.pump_until.is_some_and(|until| now < until);
                f64::from(u8::from(running))
            }
            "turn_on" => {
                let ms = request["data"].as_i64().unwrap_or(0);
                state.pump_until = Some(now + Duration::from_millis(ms as u64));
                state.turn_on_count += 1;
                state.last_run_ms = Some(ms);
                0.0
            }
            "turn_off" => {
                state.pump_until = None;
                0.0
            }
            other => return reply(&request, false, 0.0, &format!("Unknown instruction {}", other)),
        };
        reply(&request, true, data, "")
    }
}

fn reply(request: &Value, success: bool, data: f64, message: &str) -> Value {
    json!({
        "id": request["id"],
        "channel": request["channel"],
        "instruction": request["instruction"],
        "success": success,
        "data": data,
        "message": message,
    })
}
