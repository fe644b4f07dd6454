//! Kernel boundary of the dial sequence.

use std::io;
use std::mem;
use std::os::unix::io::{AsRawFd, FromRawFd, OwnedFd};

use nix::net::if_::if_nametoindex;

use crate::constants::*;
use crate::filter::CanFilter;
use crate::util::{set_nonblocking, set_socket_option, set_socket_option_mult};

/// The kernel calls a dial is made of, one method per step.
///
/// `Fd` owns the descriptor: dropping it must close the socket.
pub trait CanSys {
    type Fd: AsRawFd;

    fn interface_index(&self, device: &str) -> io::Result<u32>;

    fn open_raw_socket(&self) -> io::Result<Self::Fd>;

    fn set_error_filter(&self, fd: &Self::Fd, mask: u32) -> io::Result<()>;

    fn set_raw_filters(&self, fd: &Self::Fd, filters: &[CanFilter]) -> io::Result<()>;

    fn set_nonblocking(&self, fd: &Self::Fd) -> io::Result<()>;

    fn bind(&self, fd: &Self::Fd, if_index: u32) -> io::Result<()>;
}

/// The real thing: `if_nametoindex(3)`, `socket(2)`, `setsockopt(2)`,
/// `fcntl(2)` and `bind(2)`.
#[derive(Debug, Copy, Clone, Default)]
pub struct LinuxSys;

impl CanSys for LinuxSys {
    type Fd = OwnedFd;

    fn interface_index(&self, device: &str) -> io::Result<u32> {
        Ok(if_nametoindex(device)?)
    }

    fn open_raw_socket(&self) -> io::Result<OwnedFd> {
        let fd = unsafe { libc::socket(PF_CAN, libc::SOCK_RAW | libc::SOCK_CLOEXEC, CAN_RAW) };

        if fd == -1 {
            return Err(io::Error::last_os_error());
        }

        Ok(unsafe { OwnedFd::from_raw_fd(fd) })
    }

    fn set_error_filter(&self, fd: &OwnedFd, mask: u32) -> io::Result<()> {
        set_socket_option(fd.as_raw_fd(), SOL_CAN_RAW, CAN_RAW_ERR_FILTER, &mask)
    }

    fn set_raw_filters(&self, fd: &OwnedFd, filters: &[CanFilter]) -> io::Result<()> {
        set_socket_option_mult(fd.as_raw_fd(), SOL_CAN_RAW, CAN_RAW_FILTER, filters)
    }

    fn set_nonblocking(&self, fd: &OwnedFd) -> io::Result<()> {
        set_nonblocking(fd.as_raw_fd())
    }

    fn bind(&self, fd: &OwnedFd, if_index: u32) -> io::Result<()> {
        let mut addr: libc::sockaddr_can = unsafe { mem::zeroed() };
        addr.can_family = AF_CAN as libc::sa_family_t;
        addr.can_ifindex = if_index as libc::c_int;

        let rv = unsafe {
            libc::bind(fd.as_raw_fd(),
                       &addr as *const libc::sockaddr_can as *const libc::sockaddr,
                       mem::size_of::<libc::sockaddr_can>() as libc::socklen_t)
        };

        if rv == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}
