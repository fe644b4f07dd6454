use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::os::unix::io::{AsRawFd, IntoRawFd, OwnedFd, RawFd};
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use log::trace;
use tokio::io::unix::AsyncFd;
use tokio::io::{AsyncRead, AsyncWrite, Interest, ReadBuf};
use tokio::runtime::Handle;

use crate::addr::CanRawAddr;
use crate::err::closed_error;

/// A raw CAN connection.
///
/// Owns exactly one non-blocking socket registered with the tokio reactor.
/// Reads and writes move whole frames, one per call: a read buffer should be
/// at least `CAN_MTU` bytes, and each write must be exactly one
/// `struct can_frame`.
///
/// The socket is closed by `close` or, failing that, on drop. Using the
/// connection after `close` returns an error of kind `NotConnected`, except
/// for `as_raw_fd`, which returns -1 (check `is_closed` first).
#[derive(Debug)]
pub struct CanRawConn {
    fd: Option<AsyncFd<OwnedFd>>,
    addr: CanRawAddr,
}

impl CanRawConn {
    pub(crate) fn new(fd: OwnedFd, addr: CanRawAddr) -> io::Result<CanRawConn> {
        // AsyncFd panics outside a runtime and in runtimes without the IO
        // driver, report both as errors
        Handle::try_current().map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        let fd = catch_unwind(AssertUnwindSafe(|| {
            AsyncFd::with_interest(fd, Interest::READABLE | Interest::WRITABLE)
        }))
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "tokio runtime has IO disabled"))??;
        Ok(CanRawConn {
            fd: Some(fd),
            addr: addr,
        })
    }

    /// The device this connection is bound to.
    pub fn remote_addr(&self) -> &CanRawAddr {
        &self.addr
    }

    /// CAN has no separate local address, so this is the bound device as
    /// well.
    pub fn local_addr(&self) -> &CanRawAddr {
        &self.addr
    }

    pub fn is_closed(&self) -> bool {
        self.fd.is_none()
    }

    fn inner(&self) -> io::Result<&AsyncFd<OwnedFd>> {
        self.fd.as_ref().ok_or_else(closed_error)
    }

    /// Wait until a frame can be read.
    pub async fn readable(&self) -> io::Result<()> {
        let mut guard = self.inner()?.readable().await?;
        guard.retain_ready();
        Ok(())
    }

    /// Wait until a frame can be written.
    pub async fn writable(&self) -> io::Result<()> {
        let mut guard = self.inner()?.writable().await?;
        guard.retain_ready();
        Ok(())
    }

    /// Read one frame without waiting. Fails with `WouldBlock` if none is
    /// queued.
    pub fn try_read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let fd = self.inner()?;
        fd.try_io(Interest::READABLE, |fd| read_fd(fd.as_raw_fd(), buf))
    }

    /// Write one frame without waiting. Fails with `WouldBlock` if the
    /// socket's send queue is full.
    pub fn try_write(&self, buf: &[u8]) -> io::Result<usize> {
        let fd = self.inner()?;
        fd.try_io(Interest::WRITABLE, |fd| write_fd(fd.as_raw_fd(), buf))
    }

    /// Close the socket.
    ///
    /// Deregisters from the reactor and closes the descriptor. Calling this a
    /// second time is an error.
    pub fn close(&mut self) -> io::Result<()> {
        let fd = self.fd.take().ok_or_else(closed_error)?;
        trace!("{}: closing raw CAN socket", self.addr);

        let raw = fd.into_inner().into_raw_fd();
        if unsafe { libc::close(raw) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl AsRawFd for CanRawConn {
    /// Returns -1 once the connection is closed.
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_ref().map_or(-1, |fd| fd.as_raw_fd())
    }
}

impl AsyncRead for CanRawConn {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let fd = match self.fd.as_ref() {
            Some(fd) => fd,
            None => return Poll::Ready(Err(closed_error())),
        };

        loop {
            let mut guard = ready!(fd.poll_read_ready(cx))?;

            let unfilled = buf.initialize_unfilled();
            match guard.try_io(|fd| read_fd(fd.as_raw_fd(), unfilled)) {
                Ok(Ok(n)) => {
                    buf.advance(n);
                    return Poll::Ready(Ok(()));
                }
                Ok(Err(e)) => return Poll::Ready(Err(e)),
                Err(_would_block) => continue,
            }
        }
    }
}

impl AsyncWrite for CanRawConn {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        let fd = match self.fd.as_ref() {
            Some(fd) => fd,
            None => return Poll::Ready(Err(closed_error())),
        };

        loop {
            let mut guard = ready!(fd.poll_write_ready(cx))?;

            match guard.try_io(|fd| write_fd(fd.as_raw_fd(), buf)) {
                Ok(result) => return Poll::Ready(result),
                Err(_would_block) => continue,
            }
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        // frames go out on write, nothing is buffered here
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(self.get_mut().close())
    }
}

fn read_fd(fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
    let n = unsafe { libc::read(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };

    if n < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(n as usize)
}

fn write_fd(fd: RawFd, buf: &[u8]) -> io::Result<usize> {
    let n = unsafe { libc::write(fd, buf.as_ptr() as *const libc::c_void, buf.len()) };

    if n < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(n as usize)
}
