//! HTTP downloads.
//!
//! Media is consumed while it arrives: [`Download::start`] copies the
//! response body into a shared buffer on the async runtime and a
//! [`StreamReader`] hands it to the decoder as a blocking `Read + Seek`.
//! Live streams never end, so only a window behind the read position is
//! retained.

use std::io::{self, Read, Seek, SeekFrom};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use iced::futures::StreamExt;

use crate::catalog::ensure_success;
use crate::error::ApiError;

/// Bytes kept behind the read position for backward seeks.
const REWIND_WINDOW: usize = 1 << 20;

#[derive(Debug, Default)]
struct Buffer {
    /// Absolute offset of `data[0]`.
    base: u64,
    data: Vec<u8>,
    position: u64,
    finished: bool,
    cancelled: bool,
    error: Option<String>,
}

impl Buffer {
    fn end(&self) -> u64 {
        self.base + self.data.len() as u64
    }

    fn discard_consumed(&mut self) {
        let consumed = (self.position - self.base) as usize;
        if consumed > 2 * REWIND_WINDOW {
            let drop = consumed - REWIND_WINDOW;
            self.data.drain(..drop);
            self.base += drop as u64;
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    buffer: Mutex<Buffer>,
    ready: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Buffer> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, f: impl FnOnce(&mut Buffer)) {
        f(&mut self.lock());
        self.ready.notify_all();
    }
}

/// Producer side of a streamed download.
#[derive(Debug, Clone, Default)]
pub struct Download {
    shared: Arc<Shared>,
}

impl Download {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reader(&self) -> StreamReader {
        StreamReader {
            shared: self.shared.clone(),
        }
    }

    /// Stop filling and fail every pending and future read.
    pub fn cancel(&self) {
        self.shared.update(|buffer| buffer.cancelled = true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.lock().cancelled
    }

    /// Request `url` and fill the buffer in the background. Fails only if
    /// the request cannot be sent or the server answers with an error status.
    pub async fn start(
        &self,
        client: &reqwest::Client,
        url: &str,
    ) -> Result<StreamReader, ApiError> {
        let response = ensure_success(client.get(url).send().await?).await?;
        tokio::spawn(self.clone().fill(response));
        Ok(self.reader())
    }

    /// Copy `response` into the buffer until the body ends, fails or the
    /// download is cancelled.
    async fn fill(self, response: reqwest::Response) {
        let mut body = response.bytes_stream();

        while let Some(chunk) = body.next().await {
            if self.is_cancelled() {
                return;
            }
            match chunk {
                Ok(bytes) => self
                    .shared
                    .update(|buffer| buffer.data.extend_from_slice(&bytes)),
                Err(e) => {
                    self.shared.update(|buffer| buffer.error = Some(e.to_string()));
                    return;
                }
            }
        }

        self.shared.update(|buffer| buffer.finished = true);
    }
}

/// Consumer side of a [`Download`]. Reads block until enough of the body
/// has arrived.
#[derive(Debug)]
pub struct StreamReader {
    shared: Arc<Shared>,
}

impl Read for StreamReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let mut buffer = self.shared.lock();

        loop {
            if buffer.cancelled {
                return Err(io::Error::other("download cancelled"));
            }

            if buffer.position < buffer.end() {
                let start = (buffer.position - buffer.base) as usize;
                let len = out.len().min(buffer.data.len() - start);
                out[..len].copy_from_slice(&buffer.data[start..start + len]);
                buffer.position += len as u64;
                buffer.discard_consumed();
                return Ok(len);
            }

            if let Some(e) = &buffer.error {
                return Err(io::Error::other(e.clone()));
            }
            if buffer.finished {
                return Ok(0);
            }

            buffer = self
                .shared
                .ready
                .wait(buffer)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl Seek for StreamReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let mut buffer = self.shared.lock();

        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => buffer.position.checked_add_signed(delta),
            SeekFrom::End(delta) => {
                if !buffer.finished {
                    return Err(io::Error::new(
                        io::ErrorKind::Unsupported,
                        "length of an unfinished download is unknown",
                    ));
                }
                buffer.end().checked_add_signed(delta)
            }
        };

        let target = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek before start of stream")
        })?;
        if target < buffer.base {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "seek behind the retained window",
            ));
        }

        buffer.position = target;
        Ok(target)
    }
}

/// Download an image or other small resource in full.
pub async fn fetch_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, ApiError> {
    let response = ensure_success(client.get(url).send().await?).await?;
    Ok(response.bytes().await?.to_vec())
}
