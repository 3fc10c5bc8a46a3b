//! Line helpers shared by the hamlib-style text protocols.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Reads one reply line and returns it without its terminator. Bytes after
/// the newline stay buffered in `reader` for the next call. Returns `None`
/// if the peer closed before sending anything.
pub async fn read_line<R>(reader: &mut R) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut raw = Vec::new();
    if reader.read_until(b'\n', &mut raw).await? == 0 {
        return Ok(None);
    }

    let text = String::from_utf8_lossy(&raw);
    Ok(Some(text.trim_end_matches(|c| c == '\n' || c == '\r').to_string()))
}
