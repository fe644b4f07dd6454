use std::{error, fmt, io};

use crate::addr::CanRawAddr;

/// The step of the dial sequence that failed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DialStep {
    /// Looking up the interface index for the device name.
    Resolve,

    /// Opening the `PF_CAN`/`CAN_RAW` socket.
    Socket,

    /// Installing the error-frame mask (`CAN_RAW_ERR_FILTER`).
    SetErrorFilter,

    /// Installing the receive filter list (`CAN_RAW_FILTER`).
    SetRawFilter,

    /// Switching the descriptor to non-blocking mode.
    SetNonblock,

    /// Binding to the interface index.
    Bind,

    /// Registering the descriptor with the async reactor.
    Register,
}

impl DialStep {
    pub fn kind(&self) -> DialErrorKind {
        match *self {
            DialStep::Resolve => DialErrorKind::Resolution,
            DialStep::Socket => DialErrorKind::Allocation,
            DialStep::SetErrorFilter | DialStep::SetRawFilter => DialErrorKind::Configuration,
            DialStep::SetNonblock => DialErrorKind::ModeSwitch,
            DialStep::Bind => DialErrorKind::Bind,
            DialStep::Register => DialErrorKind::Registration,
        }
    }
}

/// Failure classes of a dial.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DialErrorKind {
    /// The device name does not map to a live interface.
    Resolution,

    /// The kernel refused to create the socket.
    Allocation,

    /// The error mask or filter list was rejected.
    Configuration,

    /// The descriptor could not be made non-blocking.
    ModeSwitch,

    /// The kernel refused to bind to the interface.
    Bind,

    /// No async runtime was available to register the descriptor with.
    Registration,
}

impl fmt::Display for DialErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DialErrorKind::Resolution => write!(f, "interface resolution failed"),
            DialErrorKind::Allocation => write!(f, "socket allocation failed"),
            DialErrorKind::Configuration => write!(f, "socket configuration failed"),
            DialErrorKind::ModeSwitch => write!(f, "switching to non-blocking mode failed"),
            DialErrorKind::Bind => write!(f, "bind failed"),
            DialErrorKind::Registration => write!(f, "reactor registration failed"),
        }
    }
}

/// A single dial step failure wrapping the kernel error.
#[derive(Debug)]
pub struct StepError {
    step: DialStep,
    device: String,
    source: io::Error,
}

impl StepError {
    pub fn new<S: Into<String>>(step: DialStep, device: S, source: io::Error) -> StepError {
        StepError {
            step: step,
            device: device.into(),
            source: source,
        }
    }

    pub fn step(&self) -> DialStep {
        self.step
    }

    pub fn io_error(&self) -> &io::Error {
        &self.source
    }

    pub fn into_io_error(self) -> io::Error {
        self.source
    }
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.step {
            DialStep::Resolve => write!(f, "interface {}", self.device),
            DialStep::Socket => write!(f, "socket"),
            DialStep::SetErrorFilter => write!(f, "set error filter"),
            DialStep::SetRawFilter => write!(f, "set raw filter"),
            DialStep::SetNonblock => write!(f, "set nonblock"),
            DialStep::Bind => write!(f, "bind"),
            DialStep::Register => write!(f, "register"),
        }?;
        write!(f, ": {}", self.source)
    }
}

impl error::Error for StepError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Error returned by `dial`.
///
/// Carries the operation (`"dial"`), the network (`"can"`) and the target
/// address, and wraps the `StepError` naming the step that failed. The
/// original errno stays reachable via `raw_os_error` or the `source` chain.
#[derive(Debug)]
pub struct DialError {
    op: &'static str,
    net: &'static str,
    addr: CanRawAddr,
    err: StepError,
}

impl DialError {
    pub fn new(addr: CanRawAddr, err: StepError) -> DialError {
        DialError {
            op: "dial",
            net: addr.network(),
            addr: addr,
            err: err,
        }
    }

    pub fn op(&self) -> &'static str {
        self.op
    }

    pub fn net(&self) -> &'static str {
        self.net
    }

    pub fn addr(&self) -> &CanRawAddr {
        &self.addr
    }

    pub fn step(&self) -> DialStep {
        self.err.step
    }

    pub fn kind(&self) -> DialErrorKind {
        self.err.step.kind()
    }

    pub fn step_error(&self) -> &StepError {
        &self.err
    }

    /// The kernel error code behind the failure, if there is one.
    pub fn raw_os_error(&self) -> Option<i32> {
        self.err.source.raw_os_error()
    }
}

impl fmt::Display for DialError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}: {}", self.op, self.net, self.addr, self.err)
    }
}

impl error::Error for DialError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.err)
    }
}

impl From<DialError> for io::Error {
    fn from(err: DialError) -> io::Error {
        io::Error::new(err.err.source.kind(), err)
    }
}

/// Error for operations on a connection that was already closed.
pub(crate) fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "use of closed network connection")
}
