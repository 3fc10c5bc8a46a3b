use std::future::Future;
use std::io;
use std::time::Duration;

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use utoipa::ToSchema;

use crate::rotator::retry::{connect_with_retry, RetryPolicy};
use crate::rotator::RotatorError;
use crate::wire::read_line;

/// Canonical success reply from rotctld.
pub const ACK_OK: &str = "RPRT 0";

const POSITION_QUERY: &str = "p 0 0\n";
/// rotctld answers `p` with the azimuth and elevation on separate lines.
const POSITION_REPLY_LINES: usize = 2;

/// Which half of the split rotor a client drives. Each axis runs its own
/// rotctld instance and takes its angle in the first argument of `P`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Azimuth,
    Elevation,
}

impl Axis {
    /// Picks this axis' angle out of a pointing pair. The elevation axis
    /// never goes below the horizon.
    pub fn angle(self, azimuth_deg: f64, elevation_deg: f64) -> f64 {
        match self {
            Axis::Azimuth => azimuth_deg,
            Axis::Elevation => elevation_deg.max(0.0),
        }
    }
}

pub fn set_position_command(axis: Axis, azimuth_deg: f64, elevation_deg: f64) -> String {
    format!("P {:.2} 0\n", axis.angle(azimuth_deg, elevation_deg))
}

/// Persistent connection to one rotctld axis.
///
/// Replies are read line by line from a buffered stream, so every command
/// consumes exactly its own reply. After a timeout or a broken read the
/// stream can no longer be trusted to be in step, and the next command
/// reconnects first.
pub struct ActuatorClient {
    axis: Axis,
    host: String,
    port: u16,
    endpoint: String,
    stream: BufReader<TcpStream>,
    io_timeout: Duration,
    out_of_step: bool,
}

impl ActuatorClient {
    pub async fn connect(
        axis: Axis,
        host: &str,
        port: u16,
        policy: RetryPolicy,
        io_timeout: Duration,
    ) -> Result<Self, RotatorError> {
        let endpoint = format!("{}:{}", host, port);
        let stream = connect_with_retry(&endpoint, policy, move || async move {
            bounded(io_timeout, TcpStream::connect((host, port))).await
        })
        .await?;
        stream.set_nodelay(true)?;

        log::info!("Connected to {} rotator at {}", axis, endpoint);
        Ok(Self {
            axis,
            host: host.to_string(),
            port,
            endpoint,
            stream: BufReader::new(stream),
            io_timeout,
            out_of_step: false,
        })
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Returns the first line of the position reply as-is.
    pub async fn get_position(&mut self) -> Result<String, RotatorError> {
        self.exchange(POSITION_QUERY, POSITION_REPLY_LINES).await
    }

    /// Commands this axis towards `(azimuth_deg, elevation_deg)` and returns
    /// the acknowledgement line. Any reply other than [`ACK_OK`] is
    /// [`RotatorError::Rejected`].
    pub async fn set_position(
        &mut self,
        azimuth_deg: f64,
        elevation_deg: f64,
    ) -> Result<String, RotatorError> {
        if !self.axis.angle(azimuth_deg, elevation_deg).is_finite() {
            return Err(RotatorError::InvalidAngle { axis: self.axis });
        }

        let command = set_position_command(self.axis, azimuth_deg, elevation_deg);
        let reply = self.exchange(&command, 1).await?;
        if reply == ACK_OK {
            Ok(reply)
        } else {
            log::warn!(
                "{} rotator at {} answered {:?} to {:?}",
                self.axis,
                self.endpoint,
                reply,
                command.trim_end()
            );
            Err(RotatorError::Rejected {
                axis: self.axis,
                reply,
            })
        }
    }

    pub async fn park(
        &mut self,
        azimuth_park_deg: f64,
        elevation_park_deg: f64,
    ) -> Result<String, RotatorError> {
        self.set_position(azimuth_park_deg, elevation_park_deg).await
    }

    async fn exchange(&mut self, command: &str, reply_lines: usize) -> Result<String, RotatorError> {
        if self.out_of_step {
            self.reconnect().await?;
        }
        self.discard_pending()?;

        let axis = self.axis;
        log::debug!("{} -> {:?}", self.endpoint, command.trim_end());

        let stream = &mut self.stream;
        let outcome = tokio::time::timeout(self.io_timeout, async {
            stream.get_mut().write_all(command.as_bytes()).await?;
            read_reply(stream, reply_lines).await
        })
        .await;

        let reply = match outcome {
            Ok(Ok(Some(reply))) => reply,
            Ok(Ok(None)) => {
                self.out_of_step = true;
                return Err(RotatorError::Closed { axis });
            }
            Ok(Err(e)) => {
                self.out_of_step = true;
                return Err(e.into());
            }
            Err(_) => {
                self.out_of_step = true;
                return Err(RotatorError::Timeout { axis });
            }
        };

        log::debug!("{} <- {:?}", self.endpoint, reply);
        Ok(reply)
    }

    /// Drops anything the rotator sent that no command is waiting for.
    fn discard_pending(&mut self) -> Result<(), RotatorError> {
        let buffered = self.stream.buffer().len();
        if buffered > 0 {
            log::debug!("{}: discarding {} buffered bytes", self.endpoint, buffered);
            self.stream.consume(buffered);
        }

        let mut scratch = [0u8; 256];
        loop {
            match self.stream.get_ref().try_read(&mut scratch) {
                // A closed peer shows up on the next read.
                Ok(0) => return Ok(()),
                Ok(n) => log::debug!("{}: discarding {} stray bytes", self.endpoint, n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn reconnect(&mut self) -> Result<(), RotatorError> {
        log::info!("Reconnecting to {} rotator at {}", self.axis, self.endpoint);
        let stream = bounded(
            self.io_timeout,
            TcpStream::connect((self.host.as_str(), self.port)),
        )
        .await?;
        stream.set_nodelay(true)?;
        self.stream = BufReader::new(stream);
        self.out_of_step = false;
        Ok(())
    }
}

/// Reads a reply of `lines` lines and returns the first. An `RPRT` status
/// line ends the reply early, as rotctld sends it instead of data on error.
async fn read_reply(
    stream: &mut BufReader<TcpStream>,
    lines: usize,
) -> io::Result<Option<String>> {
    let Some(first) = read_line(stream).await? else {
        return Ok(None);
    };
    if !first.starts_with("RPRT") {
        for _ in 1..lines {
            if read_line(stream).await?.is_none() {
                break;
            }
        }
    }
    Ok(Some(first))
}

async fn bounded<T>(limit: Duration, fut: impl Future<Output = io::Result<T>>) -> io::Result<T> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))?
}
