//! Line-oriented byte link to the pump controller.
//!
//! [`LineTransport`] wraps any async byte stream (a serial port in
//! production, an in-memory duplex pipe in tests) and provides the three
//! primitives an exchange needs: drop stale input, write a frame, read one
//! line with a deadline.
//!
//! Opening the stream is delegated to a [`Connector`]; [`SerialConnector`]
//! opens a tokio-serial port and can pick one automatically.

use std::time::Duration;

use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf,
    WriteHalf,
};
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info};

use super::error::TransportError;

/// Upper bound on how long stale-input draining waits for more bytes.
const STALE_DRAIN_WINDOW: Duration = Duration::from_millis(2);

/// Any bidirectional async byte stream usable as a device link.
pub trait SerialPortIO: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> SerialPortIO for T {}

/// Boxed device stream.
pub type DynSerial = Box<dyn SerialPortIO>;

/// Opens the byte stream for a device session.
///
/// Destination resolution lives here so the session stays agnostic of
/// port naming and discovery.
pub trait Connector: Send + Sync {
    /// Human readable destination, for logs.
    fn destination(&self) -> String;

    /// Open the stream at the given baud rate.
    fn open(&self, baud_rate: u32) -> Result<DynSerial, TransportError>;
}

/// Connector for a USB serial port.
#[derive(Debug, Clone, Default)]
pub struct SerialConnector {
    port: Option<String>,
}

impl SerialConnector {
    /// Use an explicit port path, or `None` to auto-detect.
    pub fn new(port: Option<String>) -> Self {
        Self { port }
    }

    /// Resolve the port path, auto-detecting the first USB serial port when
    /// none was configured.
    pub fn resolve(&self) -> Result<String, TransportError> {
        if let Some(port) = &self.port {
            return Ok(port.clone());
        }

        let ports =
            tokio_serial::available_ports().map_err(|e| TransportError::Open(e.to_string()))?;
        let usb = ports
            .iter()
            .find(|p| matches!(p.port_type, tokio_serial::SerialPortType::UsbPort(_)));

        match usb {
            Some(found) => {
                info!(port = %found.port_name, "Auto-detected USB serial port");
                Ok(found.port_name.clone())
            }
            None => Err(TransportError::Open(format!(
                "no USB serial port found ({} ports scanned)",
                ports.len()
            ))),
        }
    }
}

impl Connector for SerialConnector {
    fn destination(&self) -> String {
        self.port.clone().unwrap_or_else(|| "auto".to_string())
    }

    fn open(&self, baud_rate: u32) -> Result<DynSerial, TransportError> {
        let path = self.resolve()?;
        let port = tokio_serial::new(&path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| TransportError::Open(format!("{}: {}", path, e)))?;
        debug!(port = %path, baud_rate, "Serial port opened");
        Ok(Box::new(port))
    }
}

/// Connector handing out a stream that was opened elsewhere.
///
/// Useful for bridged links (e.g. a TCP serial server) and for driving a
/// session against an in-process device. The stream can be taken once;
/// reconnecting after that fails with [`TransportError::Open`].
pub struct StreamConnector {
    label: String,
    stream: parking_lot::Mutex<Option<DynSerial>>,
}

impl StreamConnector {
    pub fn new(label: impl Into<String>, stream: DynSerial) -> Self {
        Self {
            label: label.into(),
            stream: parking_lot::Mutex::new(Some(stream)),
        }
    }
}

impl Connector for StreamConnector {
    fn destination(&self) -> String {
        self.label.clone()
    }

    fn open(&self, _baud_rate: u32) -> Result<DynSerial, TransportError> {
        self.stream
            .lock()
            .take()
            .ok_or_else(|| TransportError::Open(format!("{}: stream already consumed", self.label)))
    }
}

/// Newline-delimited reader/writer over a device stream.
pub struct LineTransport {
    reader: BufReader<ReadHalf<DynSerial>>,
    writer: WriteHalf<DynSerial>,
}

impl LineTransport {
    pub fn new(stream: DynSerial) -> Self {
        let (read, write) = tokio::io::split(stream);
        Self {
            reader: BufReader::new(read),
            writer: write,
        }
    }

    /// Discard buffered and immediately available input.
    ///
    /// Best effort: bytes the device is still transmitting may arrive after
    /// this returns.
    pub async fn clear_stale(&mut self) -> Result<usize, TransportError> {
        let mut discarded = self.reader.buffer().len();
        self.reader.consume(discarded);

        let mut scratch = [0u8; 256];
        loop {
            match tokio::time::timeout(STALE_DRAIN_WINDOW, self.reader.read(&mut scratch)).await {
                Ok(Ok(0)) => return Err(TransportError::Disconnected),
                Ok(Ok(n)) => discarded += n,
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => break,
            }
        }

        if discarded > 0 {
            debug!(bytes = discarded, "Discarded stale input");
        }
        Ok(discarded)
    }

    /// Write one frame and flush it.
    pub async fn write_frame(&mut self, frame: &str) -> Result<(), TransportError> {
        self.writer.write_all(frame.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Read one raw frame, without its terminator.
    ///
    /// Bytes are returned as received; decoding is left to the protocol.
    pub async fn read_frame(&mut self, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        let mut frame = Vec::new();
        match tokio::time::timeout(timeout, self.reader.read_until(b'\n', &mut frame)).await {
            Ok(Ok(0)) => Err(TransportError::Disconnected),
            Ok(Ok(_)) => {
                while matches!(frame.last(), Some(b'\n' | b'\r')) {
                    frame.pop();
                }
                Ok(frame)
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(TransportError::Timeout(timeout)),
        }
    }

    /// Read lines until one equals `sentinel`, or `timeout` passes.
    ///
    /// Returns `Ok(false)` on timeout.
    pub async fn wait_for_line(
        &mut self,
        sentinel: &str,
        timeout: Duration,
    ) -> Result<bool, TransportError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }
            match self.read_frame(remaining).await {
                Ok(frame) => {
                    let line = String::from_utf8_lossy(&frame);
                    if line.trim() == sentinel {
                        return Ok(true);
                    }
                    debug!(line = %line, "Ignoring line before ready sentinel");
                }
                Err(TransportError::Timeout(_)) => return Ok(false),
                Err(e) => return Err(e),
            }
        }
    }

    /// Flush and shut down the write side.
    pub async fn shutdown(&mut self) -> Result<(), TransportError> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    fn pair() -> (LineTransport, tokio::io::DuplexStream) {
        let (local, remote) = tokio::io::duplex(1024);
        (LineTransport::new(Box::new(local)), remote)
    }

    #[tokio::test]
    async fn test_read_frame_strips_terminator() {
        let (mut transport, mut remote) = pair();
        remote.write_all(b"hello\r\n").await.unwrap();

        let frame = transport.read_frame(Duration::from_secs(1)).await.unwrap();
        assert_eq!(frame, b"hello");
    }

    #[tokio::test]
    async fn test_read_frame_passes_invalid_utf8_through() {
        let (mut transport, mut remote) = pair();
        remote.write_all(b"{\"id\":1,\xff\xfe}\n").await.unwrap();

        let frame = transport.read_frame(Duration::from_secs(1)).await.unwrap();
        assert_eq!(frame, b"{\"id\":1,\xff\xfe}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_frame_times_out() {
        let (mut transport, _remote) = pair();
        let result = transport.read_frame(Duration::from_millis(100)).await;
        assert!(matches!(result, Err(TransportError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_read_frame_reports_disconnect() {
        let (mut transport, remote) = pair();
        drop(remote);
        let result = transport.read_frame(Duration::from_secs(1)).await;
        assert!(matches!(result, Err(TransportError::Disconnected)));
    }

    #[tokio::test]
    async fn test_clear_stale_discards_pending_input() {
        let (mut transport, mut remote) = pair();
        remote.write_all(b"late reply\nanother\n").await.unwrap();

        let discarded = transport.clear_stale().await.unwrap();
        assert_eq!(discarded, "late reply\nanother\n".len());

        remote.write_all(b"fresh\n").await.unwrap();
        assert_eq!(transport.read_frame(Duration::from_secs(1)).await.unwrap(), b"fresh");
    }

    #[tokio::test]
    async fn test_wait_for_line_skips_noise() {
        let (mut transport, mut remote) = pair();
        remote.write_all(b"boot v1.2\nArduino ready\n").await.unwrap();

        let found = transport
            .wait_for_line("Arduino ready", Duration::from_secs(1))
            .await
            .unwrap();
        assert!(found);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_line_times_out() {
        let (mut transport, mut remote) = pair();
        remote.write_all(b"boot v1.2\n").await.unwrap();

        let found = transport
            .wait_for_line("Arduino ready", Duration::from_secs(5))
            .await
            .unwrap();
        assert!(!found);
    }

    #[test]
    fn test_stream_connector_is_single_use() {
        let (local, _remote) = tokio::io::duplex(64);
        let connector = StreamConnector::new("sim", Box::new(local));
        assert!(connector.open(9600).is_ok());
        assert!(matches!(connector.open(9600), Err(TransportError::Open(_))));
    }

    #[test]
    fn test_serial_connector_destination() {
        assert_eq!(SerialConnector::new(None).destination(), "auto");
        assert_eq!(
            SerialConnector::new(Some("/dev/ttyACM0".to_string())).destination(),
            "/dev/ttyACM0"
        );
    }
}
