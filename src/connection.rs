//! Line-oriented connection channel
//!
//! Wraps a raw bidirectional byte stream with a newline-framed reader and a
//! write-and-flush writer. The stream is split so the reader and writer can be
//! moved into separate tasks.

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};

use crate::error::ConnectionError;

/// Longest line (in bytes, excluding the terminator) accepted from a client
pub const MAX_LINE_LENGTH: usize = 4096;

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// A connection framed as newline-terminated UTF-8 lines
pub struct LineChannel {
    reader: LineReader,
    writer: LineWriter,
}

impl LineChannel {
    /// Wrap any async byte stream (a `TcpStream`, or `tokio::io::duplex` in tests)
    pub fn new<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        Self {
            reader: LineReader {
                inner: FramedRead::new(
                    Box::new(read_half) as BoxedReader,
                    LinesCodec::new_with_max_length(MAX_LINE_LENGTH),
                ),
            },
            writer: LineWriter {
                inner: FramedWrite::new(Box::new(write_half) as BoxedWriter, LinesCodec::new()),
            },
        }
    }

    pub(crate) fn reader(&mut self) -> &mut LineReader {
        &mut self.reader
    }

    pub(crate) fn writer(&mut self) -> &mut LineWriter {
        &mut self.writer
    }

    /// Separate the halves so each can be owned by its own loop
    pub fn into_split(self) -> (LineReader, LineWriter) {
        (self.reader, self.writer)
    }
}

/// Read side of a [`LineChannel`]
pub struct LineReader {
    inner: FramedRead<BoxedReader, LinesCodec>,
}

impl LineReader {
    /// Wait for the next line, with `\n` or `\r\n` stripped
    ///
    /// End of stream is reported as `ConnectionError::Closed`. Cancel safe:
    /// a partially received line stays buffered if the future is dropped.
    pub async fn read_line(&mut self) -> Result<String, ConnectionError> {
        match self.inner.next().await {
            Some(Ok(line)) => Ok(line),
            Some(Err(e)) => Err(e.into()),
            None => Err(ConnectionError::Closed),
        }
    }
}

/// Write side of a [`LineChannel`]
pub struct LineWriter {
    inner: FramedWrite<BoxedWriter, LinesCodec>,
}

impl LineWriter {
    /// Write `text` followed by `\n`, then flush
    pub async fn write_line(&mut self, text: &str) -> Result<(), ConnectionError> {
        self.inner.send(text).await?;
        Ok(())
    }

    /// Write `text` as is (no terminator), then flush
    pub async fn write_prompt(&mut self, text: &str) -> Result<(), ConnectionError> {
        let stream = self.inner.get_mut();
        stream.write_all(text.as_bytes()).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Close the write side of the underlying stream
    pub async fn shutdown(&mut self) -> Result<(), ConnectionError> {
        self.inner.get_mut().shutdown().await?;
        Ok(())
    }
}
