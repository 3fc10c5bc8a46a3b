use std::io::{self, BufRead, Write};
use std::time::Duration;

use tokio::sync::mpsc;

/// Line-oriented operator input that can be waited on with a deadline.
///
/// Lines arrive on a channel so a prompt can be abandoned without leaving a
/// blocked read behind. A line typed after a prompt gave up stays queued and
/// answers the next prompt.
pub struct OperatorConsole {
    lines: mpsc::UnboundedReceiver<String>,
}

impl OperatorConsole {
    /// Reads the process' stdin on a dedicated thread.
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
            log::debug!("Operator input closed");
        });
        Self { lines: rx }
    }

    #[cfg(test)]
    pub fn from_channel(lines: mpsc::UnboundedReceiver<String>) -> Self {
        Self { lines }
    }

    /// Shows `text` and waits for one trimmed line. `None` means the wait
    /// timed out or input is closed.
    pub async fn prompt(&mut self, text: &str, timeout: Option<Duration>) -> Option<String> {
        print!("{}", text);
        let _ = io::stdout().flush();

        let line = match timeout {
            Some(limit) => match tokio::time::timeout(limit, self.lines.recv()).await {
                Ok(line) => line,
                Err(_) => {
                    println!();
                    return None;
                }
            },
            None => self.lines.recv().await,
        };
        line.map(|l| l.trim().to_string())
    }
}
