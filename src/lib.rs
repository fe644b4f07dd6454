//! SocketCAN dialing.
//!
//! The Linux kernel supports using CAN-devices through a network-like API
//! (see https://www.kernel.org/doc/Documentation/networking/can.txt). This
//! crate opens raw CAN sockets on such a device, ready to be driven by the
//! tokio reactor, without having to wrestle libc calls.
//!
//! # Dialing
//!
//! `dial` takes a device name such as `"vcan0"` or `"can0"` and a list of
//! `DialOption`s. The options are gathered into `DialOptions` first; only then
//! is the socket created, configured, switched to non-blocking mode and bound
//! to the interface. Any failing step aborts the dial and is reported as a
//! `DialError` naming the device and the step, with the kernel error still
//! attached.
//!
//! Two options are provided:
//!
//! * `with_receive_error_frames` has the kernel deliver error frames of every
//!   class in addition to data frames.
//! * `with_filter_received_frames_by_id` restricts delivery to frames whose ID
//!   matches one of the given `IdFilter`s. A filter with `exclude` set
//!   inverts the match. Filters from repeated uses are concatenated, and the
//!   kernel delivers a frame if any filter in the list matches.
//!
//! # Connections
//!
//! A `CanRawConn` is a tokio `AsyncRead + AsyncWrite` stream carrying one
//! `struct can_frame` per read or write. Encoding and decoding frames is left
//! to the caller. The socket is closed exactly once, by `close` or on drop.
//!
//! # RawFd
//!
//! Raw access to the underlying file descriptor is available through the
//! `AsRawFd` implementation.

pub extern crate libc;
pub extern crate log;
pub extern crate nix;

mod addr;
mod conn;
pub mod constants;
mod dial;
mod err;
mod filter;
mod options;
mod sys;
mod util;

pub use addr::{CanRawAddr, CAN_RAW_NETWORK};
pub use conn::CanRawConn;
pub use dial::dial;
pub use err::{DialError, DialErrorKind, DialStep, StepError};
pub use filter::{CanFilter, IdFilter};
pub use options::{
    with_error_frame_mask, with_filter_received_frames_by_id, with_receive_error_frames, DialOption,
    DialOptions,
};
