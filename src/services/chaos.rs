//! Randomised latency / failure for the `/demo/flaky-request` endpoint.
//!
//! Only wired when `CHAOS_ENABLED=true`; deterministic tests never hit it.
use std::time::Duration;

const MIN_DELAY_MS: u64 = 50;
const DELAY_SPREAD_MS: u64 = 300;
const FAILURE_PERCENT: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roll {
    pub delay: Duration,
    pub fail: bool,
}

impl Roll {
    /// delay in `[50, 350)` ms from the low word, failure from the high word.
    pub fn from_entropy(n: u64) -> Self {
        let low = n & 0xFFFF_FFFF;
        let high = n >> 32;
        Self {
            delay: Duration::from_millis(MIN_DELAY_MS + low % DELAY_SPREAD_MS),
            fail: high % 100 < FAILURE_PERCENT,
        }
    }
}

pub fn roll() -> anyhow::Result<Roll> {
    let mut bytes = [0u8; 8];
    getrandom::fill(&mut bytes).map_err(|e| anyhow::anyhow!("entropy source unavailable: {e}"))?;
    Ok(Roll::from_entropy(u64::from_le_bytes(bytes)))
}
