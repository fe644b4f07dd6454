use std::fmt;

use crate::constants::CAN_ERR_MASK;
use crate::conn::CanRawConn;
use crate::dial::dial_with;
use crate::err::DialError;
use crate::filter::{CanFilter, IdFilter};
use crate::sys::LinuxSys;

/// DialOptions
///
/// Socket configuration gathered from a list of `DialOption`s before any
/// kernel call is made.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialOptions {
    error_frame_mask: Option<u32>,
    raw_filters: Vec<CanFilter>,
}

impl DialOptions {
    /// Empty configuration: no error frames, no filters.
    pub fn new() -> DialOptions {
        DialOptions::default()
    }

    /// Build a configuration by applying `options` in order.
    pub fn from_options<I>(options: I) -> DialOptions
    where
        I: IntoIterator<Item = DialOption>,
    {
        let mut opts = DialOptions::new();
        for option in options {
            opts.apply(option);
        }
        opts
    }

    pub fn apply(&mut self, option: DialOption) -> &mut DialOptions {
        (option.0)(self);
        self
    }

    /// Error class mask for `CAN_RAW_ERR_FILTER`, `None` when error frames are
    /// not delivered.
    pub fn error_frame_mask(&self) -> Option<u32> {
        self.error_frame_mask
    }

    /// Kernel filter entries in installation order. Empty means every frame on
    /// the interface is delivered.
    pub fn raw_filters(&self) -> &[CanFilter] {
        &self.raw_filters
    }

    pub fn set_error_frame_mask(&mut self, mask: Option<u32>) {
        self.error_frame_mask = mask;
    }

    /// Append one kernel filter entry.
    pub fn push_raw_filter(&mut self, filter: CanFilter) {
        self.raw_filters.push(filter);
    }

    /// Chainable form of `with_receive_error_frames`.
    pub fn receive_error_frames(mut self) -> DialOptions {
        self.apply(with_receive_error_frames());
        self
    }

    /// Chainable form of `with_filter_received_frames_by_id`.
    pub fn filter_received_frames_by_id(mut self, filters: &[IdFilter]) -> DialOptions {
        self.apply(with_filter_received_frames_by_id(filters));
        self
    }

    /// Dial `device` with this configuration.
    pub fn dial(&self, device: &str) -> Result<CanRawConn, DialError> {
        dial_with(&LinuxSys, device, self)
    }
}

/// DialOption
///
/// A single configuration step. Options only touch the `DialOptions` they are
/// applied to and cannot fail.
pub struct DialOption(Box<dyn FnOnce(&mut DialOptions) + Send>);

impl DialOption {
    pub fn new<F>(f: F) -> DialOption
    where
        F: FnOnce(&mut DialOptions) + Send + 'static,
    {
        DialOption(Box::new(f))
    }
}

impl fmt::Debug for DialOption {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("DialOption")
    }
}

/// Enable reception of error frames of every class on the socket.
pub fn with_receive_error_frames() -> DialOption {
    with_error_frame_mask(CAN_ERR_MASK)
}

/// Enable reception of the error classes selected by `mask`
/// (see `linux/can/error.h`). The last mask applied wins.
pub fn with_error_frame_mask(mask: u32) -> DialOption {
    DialOption::new(move |o: &mut DialOptions| {
        o.set_error_frame_mask(Some(mask));
    })
}

/// Only deliver frames whose ID matches one of `filters` (or, for filters with
/// `exclude` set, does not match it). Repeated use appends to the list.
pub fn with_filter_received_frames_by_id(filters: &[IdFilter]) -> DialOption {
    let filters = filters.to_vec();
    DialOption::new(move |o: &mut DialOptions| {
        for filter in filters {
            o.push_raw_filter(CanFilter::from(filter));
        }
    })
}
