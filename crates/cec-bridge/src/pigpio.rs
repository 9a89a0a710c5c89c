//! `pigpiod` socket client
//!
//! The pigpio daemon exposes its API over TCP (port 8888 by default).
//!
//! # Format
//! - Request: four little-endian `u32` words `cmd, p1, p2, p3`, followed by
//!   `p3` bytes of extension data
//! - Response: four little-endian words; the first three echo the request,
//!   the fourth is the signed result (negative values are error codes)
//!
//! Only the waveform subset of the API is implemented.

use rc5_protocol::{EdgeTransition, GpioPin};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::error::HardwareError;
use crate::hardware::{WaveHardware, WaveformId};

/// Default daemon port
pub const DEFAULT_PORT: u16 = 8888;

const CMD_MODES: u32 = 0;
const CMD_WVCLR: u32 = 27;
const CMD_WVAG: u32 = 28;
const CMD_WVBSY: u32 = 32;
const CMD_WVCRE: u32 = 49;
const CMD_WVDEL: u32 = 50;
const CMD_WVTX: u32 = 51;
const CMD_WVNEW: u32 = 53;

const MODE_OUTPUT: u32 = 1;

/// No more DMA control blocks for the waveform
const PI_TOO_MANY_CBS: i32 = -67;
/// No more off-line memory for the waveform
const PI_TOO_MANY_OOL: i32 = -68;
/// No free waveform ids
const PI_NO_WAVEFORM_ID: i32 = -70;

/// Bytes per pulse in a WVAG extension: gpio_on, gpio_off, us_delay
const PULSE_SIZE: usize = 12;

/// Client for a running `pigpiod`
///
/// Generic over the stream so tests can run it against an in-memory daemon.
pub struct PigpioClient<T> {
    io: T,
}

impl PigpioClient<TcpStream> {
    /// Connect to a daemon
    pub async fn connect(host: &str, port: u16) -> Result<Self, HardwareError> {
        let stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;
        info!("Connected to pigpiod at {}:{}", host, port);
        Ok(Self::new(stream))
    }
}

impl<T> PigpioClient<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an established connection
    pub fn new(io: T) -> Self {
        Self { io }
    }

    /// Issue one command and return its non-negative result
    async fn command(
        &mut self,
        name: &'static str,
        cmd: u32,
        p1: u32,
        p2: u32,
        ext: &[u8],
    ) -> Result<u32, HardwareError> {
        let mut request = Vec::with_capacity(16 + ext.len());
        for word in [cmd, p1, p2, ext.len() as u32] {
            request.extend_from_slice(&word.to_le_bytes());
        }
        request.extend_from_slice(ext);

        self.io.write_all(&request).await?;
        self.io.flush().await?;

        let mut response = [0u8; 16];
        self.io.read_exact(&mut response).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                HardwareError::Disconnected
            } else {
                HardwareError::Io(e)
            }
        })?;

        let result = i32::from_le_bytes([response[12], response[13], response[14], response[15]]);
        debug!("pigpiod {} -> {}", name, result);

        match result {
            PI_TOO_MANY_CBS | PI_TOO_MANY_OOL | PI_NO_WAVEFORM_ID if cmd == CMD_WVCRE => {
                Err(HardwareError::ResourceExhausted { code: result })
            }
            code if code < 0 => Err(HardwareError::Command {
                command: name,
                code,
            }),
            ok => Ok(ok as u32),
        }
    }

    /// Pack transitions as WVAG pulses
    fn encode_pulses(transitions: &[EdgeTransition]) -> Vec<u8> {
        let mut ext = Vec::with_capacity(transitions.len() * PULSE_SIZE);
        for t in transitions {
            ext.extend_from_slice(&t.set_mask.to_le_bytes());
            ext.extend_from_slice(&t.clear_mask.to_le_bytes());
            ext.extend_from_slice(&t.duration_us.to_le_bytes());
        }
        ext
    }
}

impl<T> WaveHardware for PigpioClient<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn set_output(&mut self, pin: GpioPin) -> Result<(), HardwareError> {
        self.command("MODES", CMD_MODES, pin.number() as u32, MODE_OUTPUT, &[])
            .await
            .map(|_| ())
    }

    async fn create_wave(
        &mut self,
        transitions: Vec<EdgeTransition>,
    ) -> Result<WaveformId, HardwareError> {
        self.command("WVNEW", CMD_WVNEW, 0, 0, &[]).await?;
        let ext = Self::encode_pulses(&transitions);
        self.command("WVAG", CMD_WVAG, 0, 0, &ext).await?;
        self.command("WVCRE", CMD_WVCRE, 0, 0, &[])
            .await
            .map(WaveformId)
    }

    async fn send_once(&mut self, id: WaveformId) -> Result<(), HardwareError> {
        self.command("WVTX", CMD_WVTX, id.0, 0, &[]).await.map(|_| ())
    }

    async fn is_busy(&mut self) -> Result<bool, HardwareError> {
        self.command("WVBSY", CMD_WVBSY, 0, 0, &[])
            .await
            .map(|busy| busy != 0)
    }

    async fn delete_wave(&mut self, id: WaveformId) -> Result<(), HardwareError> {
        self.command("WVDEL", CMD_WVDEL, id.0, 0, &[]).await.map(|_| ())
    }

    async fn clear_waves(&mut self) -> Result<(), HardwareError> {
        self.command("WVCLR", CMD_WVCLR, 0, 0, &[]).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc5_protocol::{build_waveform, ControlWord, DEFAULT_HALF_BIT};
    use tokio::io::{duplex, DuplexStream};

    /// Read one request from the client side and answer with `result`
    async fn serve_one(daemon: &mut DuplexStream, result: i32) -> (u32, u32, u32, Vec<u8>) {
        let mut header = [0u8; 16];
        daemon.read_exact(&mut header).await.unwrap();
        let word = |i: usize| u32::from_le_bytes(header[i * 4..i * 4 + 4].try_into().unwrap());
        let (cmd, p1, p2, p3) = (word(0), word(1), word(2), word(3));

        let mut ext = vec![0u8; p3 as usize];
        daemon.read_exact(&mut ext).await.unwrap();

        let mut response = Vec::new();
        response.extend_from_slice(&header[..12]);
        response.extend_from_slice(&result.to_le_bytes());
        daemon.write_all(&response).await.unwrap();

        (cmd, p1, p2, ext)
    }

    #[tokio::test]
    async fn test_set_output() {
        let (client_io, mut daemon) = duplex(1024);
        let mut client = PigpioClient::new(client_io);

        let server = tokio::spawn(async move { serve_one(&mut daemon, 0).await });
        client.set_output(GpioPin::new(4)).await.unwrap();

        let (cmd, p1, p2, ext) = server.await.unwrap();
        assert_eq!((cmd, p1, p2), (CMD_MODES, 4, MODE_OUTPUT));
        assert!(ext.is_empty());
    }

    #[tokio::test]
    async fn test_create_wave_sends_pulses() {
        let (client_io, mut daemon) = duplex(4096);
        let mut client = PigpioClient::new(client_io);
        let wave = build_waveform(ControlWord::encode(16, 16), GpioPin::new(4), DEFAULT_HALF_BIT);
        let expected_len = wave.len() * PULSE_SIZE;

        let server = tokio::spawn(async move {
            let new = serve_one(&mut daemon, 0).await;
            let add = serve_one(&mut daemon, 29).await;
            let create = serve_one(&mut daemon, 3).await;
            (new, add, create)
        });

        let id = client.create_wave(wave).await.unwrap();
        assert_eq!(id, WaveformId(3));

        let (new, add, create) = server.await.unwrap();
        assert_eq!(new.0, CMD_WVNEW);
        assert_eq!(add.0, CMD_WVAG);
        assert_eq!(add.3.len(), expected_len);
        // First pulse of a word starting with 1 drives the pin low
        assert_eq!(&add.3[0..4], &0u32.to_le_bytes());
        assert_eq!(&add.3[4..8], &(1u32 << 4).to_le_bytes());
        assert_eq!(&add.3[8..12], &889u32.to_le_bytes());
        assert_eq!(create.0, CMD_WVCRE);
    }

    #[tokio::test]
    async fn test_create_wave_exhausted() {
        let (client_io, mut daemon) = duplex(4096);
        let mut client = PigpioClient::new(client_io);
        let wave = build_waveform(ControlWord::encode(16, 16), GpioPin::new(4), DEFAULT_HALF_BIT);

        let server = tokio::spawn(async move {
            serve_one(&mut daemon, 0).await;
            serve_one(&mut daemon, 29).await;
            serve_one(&mut daemon, PI_NO_WAVEFORM_ID).await;
        });

        let err = client.create_wave(wave).await.unwrap_err();
        assert!(err.is_exhaustion());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_busy_and_errors() {
        let (client_io, mut daemon) = duplex(1024);
        let mut client = PigpioClient::new(client_io);

        let server = tokio::spawn(async move {
            serve_one(&mut daemon, 1).await;
            serve_one(&mut daemon, -66).await;
        });

        assert!(client.is_busy().await.unwrap());
        let err = client.delete_wave(WaveformId(9)).await.unwrap_err();
        assert!(matches!(
            err,
            HardwareError::Command {
                command: "WVDEL",
                code: -66
            }
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_daemon_gone() {
        let (client_io, daemon) = duplex(1024);
        let mut client = PigpioClient::new(client_io);
        drop(daemon);

        assert!(client.clear_waves().await.is_err());
    }
}
