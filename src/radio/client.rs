use std::time::Duration;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::radio::RadioError;
use crate::wire::read_line;

const EXIT_COMMAND: &str = "c\n";

/// rigctl-style tuner client. Every call opens its own connection, so the
/// client holds no state between calls and can be shared freely.
#[derive(Debug, Clone)]
pub struct RadioClient {
    host: String,
    port: u16,
    timeout: Duration,
}

impl RadioClient {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub async fn set_frequency(&self, hz: u64) -> Result<String, RadioError> {
        self.request(&format!("F {}", hz)).await
    }

    pub async fn get_frequency(&self) -> Result<u64, RadioError> {
        let reply = self.request("f").await?;
        reply
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|hz| hz.is_finite() && *hz >= 0.0)
            .map(|hz| hz.round() as u64)
            .ok_or(RadioError::Malformed {
                command: "f".to_string(),
                reply,
            })
    }

    pub async fn set_mode(&self, mode: &str) -> Result<String, RadioError> {
        self.request(&format!("M {}", mode)).await
    }

    pub async fn get_mode(&self) -> Result<String, RadioError> {
        self.request("m").await
    }

    /// Signal strength as reported by the receiver (dBFS for gqrx).
    pub async fn get_signal_level(&self) -> Result<f64, RadioError> {
        let reply = self.request("l").await?;
        reply.trim().parse::<f64>().map_err(|_| RadioError::Malformed {
            command: "l".to_string(),
            reply,
        })
    }

    async fn request(&self, command: &str) -> Result<String, RadioError> {
        log::debug!("{} -> {:?}", self.endpoint(), command);

        let exchange = async {
            let mut stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
            let (read, mut write) = stream.split();
            write.write_all(format!("{}\n", command).as_bytes()).await?;
            let reply = read_line(&mut BufReader::new(read)).await?;
            // The peer may already have hung up; the reply is what matters.
            let _ = write.write_all(EXIT_COMMAND.as_bytes()).await;
            let _ = write.shutdown().await;
            Ok::<_, RadioError>(reply)
        };

        let reply = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| RadioError::Timeout(self.timeout))??
            .ok_or(RadioError::Closed)?;

        let reply = reply.trim().to_string();
        log::debug!("{} <- {:?}", self.endpoint(), reply);
        Ok(reply)
    }
}
