use crate::Error;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::AsyncWrite;

/// An `AsyncWrite` wrapper that refuses to accept more than `cap` total bytes.
///
/// Used on the decompression path so a hostile origin can't exhaust memory by sending
/// a small compressed payload that inflates without bound ("decompression bomb").
pub struct CappedWriter<W> {
    inner: W,
    cap: usize,
    written: usize,
}

impl<W> CappedWriter<W> {
    pub fn new(inner: W, cap: usize) -> Self {
        Self { inner, cap, written: 0 }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for CappedWriter<W> {
    fn poll_write(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        if self.written + buf.len() > self.cap {
            let cap = self.cap;
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, Error::BombLimit(cap))));
        }
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_write(cx, buf) {
            Poll::Ready(Ok(n)) => {
                this.written += n;
                Poll::Ready(Ok(n))
            }
            other => other,
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        Pin::new(&mut this.inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        Pin::new(&mut this.inner).poll_shutdown(cx)
    }
}
