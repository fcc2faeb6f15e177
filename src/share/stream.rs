//! Fixed-buffer adapter from a storage reader to a response body stream

use bytes::Bytes;
use futures::Stream;
use std::io::{self, Read};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Streams a storage read source as response body chunks of at most the
/// configured buffer size. A zero-byte read terminates the stream; a read
/// error aborts it.
pub struct ReaderStream {
    reader: Box<dyn Read + Send>,
    buffer: Vec<u8>,
}

impl ReaderStream {
    pub fn new(reader: Box<dyn Read + Send>, buffer_size: usize) -> Self {
        Self {
            reader,
            buffer: vec![0u8; buffer_size.max(1)],
        }
    }
}

impl Stream for ReaderStream {
    type Item = Result<Bytes, io::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.reader.read(&mut this.buffer) {
            Ok(0) => Poll::Ready(None),
            Ok(n) => Poll::Ready(Some(Ok(Bytes::copy_from_slice(&this.buffer[..n])))),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            Err(e) => Poll::Ready(Some(Err(e))),
        }
    }
}
