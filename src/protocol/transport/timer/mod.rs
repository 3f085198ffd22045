//! `embassy-time` backed implementation of the crate timer trait, for
//! targets with a time driver linked in.
use embassy_time::{Instant, Timer};

use crate::protocol::transport::traits::gw_timer::GwTimer;

#[derive(Clone, Copy, Debug, Default)]
/// Timer driven by the global `embassy-time` driver.
pub struct EmbassyTimer;

impl GwTimer for EmbassyTimer {
    async fn delay_ms(&mut self, millis: u32) {
        Timer::after_millis(millis as u64).await;
    }

    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}
