use std::fmt;

use crate::constants::CAN_INV_FILTER;

/// IdFilter
///
/// Caller-facing receive filter. A frame matches when
/// `received_id & mask == id & mask`. With `exclude` set the filter is
/// inverted: matching frames are dropped and everything else is delivered.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct IdFilter {
    pub id: u32,
    pub mask: u32,
    pub exclude: bool,
}

impl IdFilter {
    /// Accept frames whose ID matches `id` under `mask`.
    pub fn new(id: u32, mask: u32) -> IdFilter {
        IdFilter {
            id: id,
            mask: mask,
            exclude: false,
        }
    }

    /// Reject frames whose ID matches `id` under `mask`.
    pub fn exclude(id: u32, mask: u32) -> IdFilter {
        IdFilter {
            id: id,
            mask: mask,
            exclude: true,
        }
    }
}

/// CanFilter
///
/// Uses the same memory layout as the kernel's `struct can_filter`, so a
/// slice of these can be handed to `setsockopt(CAN_RAW_FILTER)` directly.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct CanFilter {
    _id: u32,
    _mask: u32,
}

impl CanFilter {
    /// Construct a raw filter entry. `id` is stored as given, flags included.
    pub fn new(id: u32, mask: u32) -> CanFilter {
        CanFilter {
            _id: id,
            _mask: mask,
        }
    }

    /// Identifier as installed in the kernel, inversion bit included.
    #[inline]
    pub fn id(&self) -> u32 {
        self._id
    }

    #[inline]
    pub fn mask(&self) -> u32 {
        self._mask
    }

    /// Check if the filter rejects matching frames
    #[inline]
    pub fn is_inverted(&self) -> bool {
        self._id & CAN_INV_FILTER != 0
    }
}

impl From<IdFilter> for CanFilter {
    fn from(filter: IdFilter) -> CanFilter {
        let mut id = filter.id;
        if filter.exclude {
            id |= CAN_INV_FILTER;
        }
        CanFilter::new(id, filter.mask)
    }
}

impl fmt::UpperHex for CanFilter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let sep = if self.is_inverted() { "~" } else { ":" };
        write!(f, "{:X}{}{:X}", self._id & !CAN_INV_FILTER, sep, self._mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    #[test]
    fn layout_matches_kernel_struct() {
        assert_eq!(mem::size_of::<CanFilter>(), 8);
        assert_eq!(mem::align_of::<CanFilter>(), 4);
    }

    #[test]
    fn include_filter_keeps_id() {
        let raw = CanFilter::from(IdFilter::new(0x123, 0x7ff));
        assert_eq!(raw.id(), 0x123);
        assert_eq!(raw.mask(), 0x7ff);
        assert!(!raw.is_inverted());
    }

    #[test]
    fn exclude_filter_sets_only_the_inversion_bit() {
        let raw = CanFilter::from(IdFilter::exclude(0x123, 0x7ff));
        assert_eq!(raw.id() ^ 0x123, CAN_INV_FILTER);
        assert_eq!(raw.mask(), 0x7ff);
        assert!(raw.is_inverted());
    }

    #[test]
    fn hex_formatting_marks_inverted_filters() {
        assert_eq!(format!("{:X}", CanFilter::new(0x123, 0x7ff)), "123:7FF");
        assert_eq!(
            format!("{:X}", CanFilter::from(IdFilter::exclude(0x80, 0xf0))),
            "80~F0"
        );
    }
}
