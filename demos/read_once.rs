extern crate env_logger;
extern crate log;
extern crate socketcan_dial;
extern crate tokio;

use socketcan_dial::constants::CAN_MTU;
use socketcan_dial::{dial, with_filter_received_frames_by_id, with_receive_error_frames, IdFilter};
use tokio::io::AsyncReadExt;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();
    let mut bus = dial("vcan0", vec![
        with_receive_error_frames(),
        with_filter_received_frames_by_id(&[IdFilter::new(0x123, 0x7ff)]),
    ]).unwrap();

    let mut frame = [0u8; CAN_MTU];
    loop {
        match bus.read(&mut frame).await {
            Ok(n) => log::debug!("[{}] {:02X?}", bus.remote_addr(), &frame[..n]),
            Err(e) => { log::debug!("Error: {}", e); break; },
        }
    }
}
