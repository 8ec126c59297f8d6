use crate::domain::NotificationEvent;
use crate::error::{Error, Result};
use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use tokio::io::AsyncRead;
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, FramedRead};

/// Newline-delimited JSON framing for [`NotificationEvent`] streams and raw remote messages.
#[derive(Debug, Clone, Copy)]
pub struct EventCodec {
    max_line_bytes: usize,
}

impl EventCodec {
    #[must_use]
    pub const fn new(max_line_bytes: usize) -> Self {
        Self { max_line_bytes }
    }

    /// Decodes values from `reader`, one per line. Blank lines are skipped.
    ///
    /// Each item carries its 1-based line number so callers can report where a stream went wrong.
    /// Lines are framed as raw bytes, so a line that is not valid UTF-8 fails on its own like any
    /// other malformed line. A line over the length limit or a read failure is yielded as an error
    /// and ends the stream.
    pub fn decode<T, R>(self, reader: R) -> impl Stream<Item = (usize, Result<T>)> + Send
    where
        T: DeserializeOwned + Send,
        R: AsyncRead + Send,
    {
        let max = self.max_line_bytes;
        let codec = AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), Vec::new(), max);
        FramedRead::new(reader, codec)
            .enumerate()
            .filter_map(move |(index, frame)| {
                let line = index + 1;
                let item: Option<Result<T>> = match frame {
                    Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => None,
                    Ok(bytes) => Some(serde_json::from_slice(&bytes).map_err(|source| Error::Decode { line, source })),
                    Err(AnyDelimiterCodecError::MaxChunkLengthExceeded) => Some(Err(Error::LineTooLong { line, max })),
                    Err(AnyDelimiterCodecError::Io(e)) => Some(Err(Error::Io(e))),
                };
                futures::future::ready(item.map(|res| (line, res)))
            })
    }

    /// Encodes one event as a single line, including the trailing newline.
    ///
    /// # Errors
    /// Returns `Error::Encode` if serialization fails.
    pub fn encode(event: &NotificationEvent) -> Result<String> {
        let mut line = serde_json::to_string(event).map_err(Error::Encode)?;
        line.push('\n');
        Ok(line)
    }
}

impl Default for EventCodec {
    fn default() -> Self {
        Self::new(64 * 1024)
    }
}
