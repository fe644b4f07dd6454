use itertools::Itertools;
use log::{debug, trace, warn};
use std::os::unix::io::OwnedFd;

use crate::addr::CanRawAddr;
use crate::conn::CanRawConn;
use crate::err::{DialError, DialStep, StepError};
use crate::options::{DialOption, DialOptions};
use crate::sys::CanSys;

/// Open a raw CAN socket bound to `device`.
///
/// `options` are applied in order before the first kernel call. The socket
/// is then set up in a fixed order: interface lookup, `socket`, error mask,
/// receive filters, non-blocking mode, `bind`. The error mask and filters are
/// only installed when configured; an empty filter list leaves the kernel
/// default (deliver everything) in place.
///
/// The returned connection is registered with the tokio reactor, so this has
/// to be called from within a tokio runtime.
///
/// ```no_run
/// use socketcan_dial::{dial, with_filter_received_frames_by_id, IdFilter};
///
/// # async fn run() -> std::io::Result<()> {
/// let conn = dial("vcan0", vec![
///     with_filter_received_frames_by_id(&[IdFilter::new(0x123, 0x7ff)]),
/// ])?;
/// println!("listening on {}", conn.remote_addr());
/// # Ok(())
/// # }
/// ```
pub fn dial<I>(device: &str, options: I) -> Result<CanRawConn, DialError>
where
    I: IntoIterator<Item = DialOption>,
{
    DialOptions::from_options(options).dial(device)
}

pub(crate) fn dial_with<S>(sys: &S, device: &str, opts: &DialOptions) -> Result<CanRawConn, DialError>
where
    S: CanSys<Fd = OwnedFd>,
{
    let fd = establish(sys, device, opts).map_err(|e| fail(device, e))?;

    trace!("{}: registering with reactor", device);
    let conn = CanRawConn::new(fd, CanRawAddr::new(device))
        .map_err(|e| fail(device, StepError::new(DialStep::Register, device, e)))?;

    debug!("{}: dialed raw CAN socket", device);
    Ok(conn)
}

fn fail(device: &str, err: StepError) -> DialError {
    let err = DialError::new(CanRawAddr::new(device), err);
    warn!("{}", err);
    err
}

/// Run the kernel steps of a dial and return the bound, non-blocking socket.
///
/// A descriptor opened before a failing step is dropped, and thereby closed,
/// on the way out.
pub(crate) fn establish<S: CanSys>(sys: &S, device: &str, opts: &DialOptions) -> Result<S::Fd, StepError> {
    let at = |step: DialStep| move |e| StepError::new(step, device, e);

    debug!("{}: dialing (error mask: {:?}, filters: [{}])",
           device,
           opts.error_frame_mask(),
           opts.raw_filters().iter().map(|f| format!("{:X}", f)).join(", "));

    let if_index = sys.interface_index(device).map_err(at(DialStep::Resolve))?;
    trace!("{}: interface index {}", device, if_index);

    let fd = sys.open_raw_socket().map_err(at(DialStep::Socket))?;

    if let Some(mask) = opts.error_frame_mask() {
        trace!("{}: error filter {:#x}", device, mask);
        sys.set_error_filter(&fd, mask).map_err(at(DialStep::SetErrorFilter))?;
    }

    if !opts.raw_filters().is_empty() {
        trace!("{}: installing {} raw filter(s)", device, opts.raw_filters().len());
        sys.set_raw_filters(&fd, opts.raw_filters()).map_err(at(DialStep::SetRawFilter))?;
    }

    sys.set_nonblocking(&fd).map_err(at(DialStep::SetNonblock))?;

    sys.bind(&fd, if_index).map_err(at(DialStep::Bind))?;

    Ok(fd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{CAN_ERR_MASK, CAN_INV_FILTER};
    use crate::err::DialErrorKind;
    use crate::filter::{CanFilter, IdFilter};
    use crate::options::{with_filter_received_frames_by_id, with_receive_error_frames};
    use std::cell::{Cell, RefCell};
    use std::io;
    use std::os::unix::io::{AsRawFd, RawFd};
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Resolve(String),
        Socket,
        ErrorFilter(u32),
        RawFilters(Vec<CanFilter>),
        Nonblock,
        Bind(u32),
    }

    struct MockFd {
        closed: Rc<Cell<bool>>,
    }

    impl AsRawFd for MockFd {
        fn as_raw_fd(&self) -> RawFd {
            1000
        }
    }

    impl Drop for MockFd {
        fn drop(&mut self) {
            assert!(!self.closed.replace(true), "descriptor closed twice");
        }
    }

    /// Records every kernel call; fails the configured step with `EINVAL`.
    #[derive(Default)]
    struct RecordingSys {
        calls: RefCell<Vec<Call>>,
        fail_at: Option<DialStep>,
        closed: Rc<Cell<bool>>,
    }

    impl RecordingSys {
        fn failing_at(step: DialStep) -> RecordingSys {
            RecordingSys {
                fail_at: Some(step),
                ..RecordingSys::default()
            }
        }

        fn record(&self, call: Call, step: DialStep) -> io::Result<()> {
            self.calls.borrow_mut().push(call);
            if self.fail_at == Some(step) {
                let errno = if step == DialStep::Resolve { libc::ENODEV } else { libc::EINVAL };
                return Err(io::Error::from_raw_os_error(errno));
            }
            Ok(())
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }
    }

    impl CanSys for RecordingSys {
        type Fd = MockFd;

        fn interface_index(&self, device: &str) -> io::Result<u32> {
            self.record(Call::Resolve(device.to_owned()), DialStep::Resolve)?;
            Ok(7)
        }

        fn open_raw_socket(&self) -> io::Result<MockFd> {
            self.record(Call::Socket, DialStep::Socket)?;
            Ok(MockFd { closed: self.closed.clone() })
        }

        fn set_error_filter(&self, _fd: &MockFd, mask: u32) -> io::Result<()> {
            self.record(Call::ErrorFilter(mask), DialStep::SetErrorFilter)
        }

        fn set_raw_filters(&self, _fd: &MockFd, filters: &[CanFilter]) -> io::Result<()> {
            self.record(Call::RawFilters(filters.to_vec()), DialStep::SetRawFilter)
        }

        fn set_nonblocking(&self, _fd: &MockFd) -> io::Result<()> {
            self.record(Call::Nonblock, DialStep::SetNonblock)
        }

        fn bind(&self, _fd: &MockFd, if_index: u32) -> io::Result<()> {
            self.record(Call::Bind(if_index), DialStep::Bind)
        }
    }

    fn resolve(device: &str) -> Call {
        Call::Resolve(device.to_owned())
    }

    #[test]
    fn no_options_skips_both_socket_options() {
        let sys = RecordingSys::default();
        let fd = establish(&sys, "vcan0", &DialOptions::new()).unwrap();

        assert_eq!(sys.calls(), vec![resolve("vcan0"), Call::Socket, Call::Nonblock, Call::Bind(7)]);
        assert!(!sys.closed.get());
        drop(fd);
        assert!(sys.closed.get());
    }

    #[test]
    fn error_frames_without_filters_never_touch_the_filter_option() {
        let sys = RecordingSys::default();
        let opts = DialOptions::from_options(vec![with_receive_error_frames()]);
        establish(&sys, "vcan0", &opts).unwrap();

        assert_eq!(sys.calls(), vec![
            resolve("vcan0"),
            Call::Socket,
            Call::ErrorFilter(CAN_ERR_MASK),
            Call::Nonblock,
            Call::Bind(7),
        ]);
    }

    #[test]
    fn filters_are_installed_in_one_call_before_bind() {
        let sys = RecordingSys::default();
        let opts = DialOptions::from_options(vec![
            with_filter_received_frames_by_id(&[IdFilter::new(0x123, 0x7ff)]),
            with_filter_received_frames_by_id(&[IdFilter::exclude(0x100, 0x700)]),
            with_receive_error_frames(),
        ]);
        establish(&sys, "vcan0", &opts).unwrap();

        assert_eq!(sys.calls(), vec![
            resolve("vcan0"),
            Call::Socket,
            Call::ErrorFilter(CAN_ERR_MASK),
            Call::RawFilters(vec![
                CanFilter::new(0x123, 0x7ff),
                CanFilter::new(0x100 | CAN_INV_FILTER, 0x700),
            ]),
            Call::Nonblock,
            Call::Bind(7),
        ]);
    }

    #[test]
    fn resolution_failure_opens_nothing() {
        let sys = RecordingSys::failing_at(DialStep::Resolve);
        let err = establish(&sys, "nocan0", &DialOptions::new()).err().unwrap();

        assert_eq!(sys.calls(), vec![resolve("nocan0")]);
        assert_eq!(err.step(), DialStep::Resolve);
        assert_eq!(err.step().kind(), DialErrorKind::Resolution);
        assert_eq!(err.io_error().raw_os_error(), Some(libc::ENODEV));
        assert!(err.to_string().contains("nocan0"));
        assert!(!sys.closed.get());
    }

    #[test]
    fn socket_failure_stops_the_sequence() {
        let sys = RecordingSys::failing_at(DialStep::Socket);
        let opts = DialOptions::new().receive_error_frames();
        let err = establish(&sys, "vcan0", &opts).err().unwrap();

        assert_eq!(sys.calls(), vec![resolve("vcan0"), Call::Socket]);
        assert_eq!(err.step().kind(), DialErrorKind::Allocation);
    }

    #[test]
    fn failures_after_open_release_the_descriptor() {
        let opts = DialOptions::new()
            .receive_error_frames()
            .filter_received_frames_by_id(&[IdFilter::new(0x1, 0x1)]);

        for &(step, calls_made) in &[
            (DialStep::SetErrorFilter, 3),
            (DialStep::SetRawFilter, 4),
            (DialStep::SetNonblock, 5),
            (DialStep::Bind, 6),
        ] {
            let sys = RecordingSys::failing_at(step);
            let err = establish(&sys, "vcan0", &opts).err().unwrap();

            assert_eq!(err.step(), step);
            assert_eq!(err.io_error().raw_os_error(), Some(libc::EINVAL));
            assert_eq!(sys.calls().len(), calls_made, "{:?}", step);
            assert!(sys.closed.get(), "descriptor leaked after {:?} failure", step);
        }
    }

    #[test]
    fn dial_error_wraps_step_with_operation_context() {
        let sys = RecordingSys::failing_at(DialStep::Bind);
        let err = establish(&sys, "vcan3", &DialOptions::new())
            .map_err(|e| DialError::new(CanRawAddr::new("vcan3"), e))
            .err()
            .unwrap();

        assert_eq!(err.op(), "dial");
        assert_eq!(err.net(), "can");
        assert_eq!(err.addr().device(), "vcan3");
        assert_eq!(err.kind(), DialErrorKind::Bind);
        assert!(err.to_string().starts_with("dial can vcan3: bind: "), "{}", err);
    }

    #[test]
    fn bind_uses_the_resolved_index_only() {
        let sys = RecordingSys::default();
        establish(&sys, "can1", &DialOptions::new()).unwrap();

        let calls = sys.calls();
        assert_eq!(calls.iter().filter(|c| matches!(c, Call::Resolve(_))).count(), 1);
        assert_eq!(calls.last(), Some(&Call::Bind(7)));
    }

    #[test]
    fn unknown_interface_on_the_host() {
        let err = dial("no such can!", Vec::new()).err().unwrap();

        assert_eq!(err.kind(), DialErrorKind::Resolution);
        assert!(err.to_string().contains("no such can!"));
        assert!(err.raw_os_error().is_some());
    }
}
