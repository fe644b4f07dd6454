extern crate log;
extern crate socketcan_dial;
extern crate tokio;

use socketcan_dial::constants::CAN_MTU;
use socketcan_dial::DialOptions;
use tokio::io::AsyncWriteExt;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();
    let mut bus = DialOptions::new().dial("vcan0").unwrap();

    let data: [u8; 4] = [222, 173, 190, 239];
    let id: u32 = 0x123;

    // struct can_frame: id, length, padding, payload
    let mut frame = [0u8; CAN_MTU];
    frame[..4].copy_from_slice(&id.to_ne_bytes());
    frame[4] = data.len() as u8;
    frame[8..8 + data.len()].copy_from_slice(&data);

    match bus.write_all(&frame).await {
        Ok(()) => log::debug!("Frame Send Success"),
        Err(e) => log::debug!("Frame Send Error {}", e),
    }
    bus.close().unwrap();
}
