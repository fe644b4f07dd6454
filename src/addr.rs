use std::fmt;

/// Network name reported for raw CAN connections.
pub const CAN_RAW_NETWORK: &str = "can";

/// CanRawAddr
///
/// Address of a raw CAN connection. Only the device name is kept; the
/// interface index is resolved at dial time and not stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanRawAddr {
    device: String,
}

impl CanRawAddr {
    pub fn new<S: Into<String>>(device: S) -> CanRawAddr {
        CanRawAddr {
            device: device.into(),
        }
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// Always `"can"`.
    pub fn network(&self) -> &'static str {
        CAN_RAW_NETWORK
    }
}

impl fmt::Display for CanRawAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.device)
    }
}
