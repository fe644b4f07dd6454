// information from https://raw.githubusercontent.com/torvalds/linux/master/
//                  /include/uapi/linux/can.h and /include/uapi/linux/can/raw.h

/// CAN address / protocol family
pub const AF_CAN: libc::c_int = 29;
pub const PF_CAN: libc::c_int = AF_CAN;

// Protocol of the PF_CAN Family: Standard?
pub const CAN_RAW: libc::c_int = 1;

pub const SOL_CAN_BASE: libc::c_int = 100;
pub const SOL_CAN_RAW: libc::c_int = SOL_CAN_BASE + CAN_RAW;
pub const CAN_RAW_FILTER: libc::c_int = 1;
pub const CAN_RAW_ERR_FILTER: libc::c_int = 2;

/// Upper bound on the number of entries in one `CAN_RAW_FILTER` call.
pub const CAN_RAW_FILTER_MAX: usize = 512;

/// Set in a filter's `can_id` to reject matching frames instead of accepting
/// them.
pub const CAN_INV_FILTER: u32 = 0x20000000;

/// An error mask that will cause SocketCAN to report all error classes.
pub const CAN_ERR_MASK: u32 = 0x1fffffff;

/// valid bits in CAN ID for frame formats
/// standard frame format (SFF)
pub const SFF_MASK: u32 = 0x000007ff;
/// extended frame format (EFF)
pub const EFF_MASK: u32 = 0x1fffffff;

/// Size of a classic `struct can_frame`, the unit of one read or write.
pub const CAN_MTU: usize = 16;
