//! Mapping between wall-clock time and beacon rounds.
//!
//! Round `r` is emitted at `genesis_time + (r - 1) * period` seconds. Round 1 is
//! the first round; round 0 never exists.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::chain::ChainInfo;
use crate::error::{Result, TlockError};

/// Smallest round emitted at or after `time_ms`.
///
/// Times at or before genesis map to round 1.
pub fn round_at(time_ms: u64, info: &ChainInfo) -> Result<u64> {
    let (genesis_ms, period_ms) = chain_millis(info)?;
    if time_ms <= genesis_ms {
        return Ok(1);
    }
    let elapsed = time_ms - genesis_ms;
    Ok(elapsed.div_ceil(period_ms) + 1)
}

/// Unix milliseconds at which `round` is emitted.
pub fn round_time(info: &ChainInfo, round: u64) -> Result<u64> {
    if round == 0 {
        return Err(TlockError::InvalidRound(round));
    }
    let (genesis_ms, period_ms) = chain_millis(info)?;
    (round - 1)
        .checked_mul(period_ms)
        .and_then(|offset| offset.checked_add(genesis_ms))
        .ok_or(TlockError::InvalidRound(round))
}

/// Latest round emitted at `now_ms`, or 0 before genesis.
pub fn current_round(now_ms: u64, info: &ChainInfo) -> Result<u64> {
    let (genesis_ms, period_ms) = chain_millis(info)?;
    if now_ms < genesis_ms {
        return Ok(0);
    }
    Ok((now_ms - genesis_ms) / period_ms + 1)
}

/// Whether `round` has been emitted by `now_ms`.
pub fn is_round_available(round: u64, now_ms: u64, info: &ChainInfo) -> Result<bool> {
    if round == 0 {
        return Err(TlockError::InvalidRound(round));
    }
    Ok(round <= current_round(now_ms, info)?)
}

fn chain_millis(info: &ChainInfo) -> Result<(u64, u64)> {
    if info.period == 0 {
        return Err(TlockError::InvalidChainInfo("period must be positive".into()));
    }
    let genesis_ms = info
        .genesis_time
        .checked_mul(1000)
        .ok_or_else(|| TlockError::InvalidChainInfo("genesis time out of range".into()))?;
    let period_ms = info
        .period
        .checked_mul(1000)
        .ok_or_else(|| TlockError::InvalidChainInfo("period out of range".into()))?;
    Ok((genesis_ms, period_ms))
}

/// Source of the current time in Unix milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tlock_crypto::SchemeId;

    const GENESIS: u64 = 1692803367;

    fn info(period: u64) -> ChainInfo {
        ChainInfo {
            hash: vec![0u8; 32],
            public_key: vec![0u8; 96],
            period,
            genesis_time: GENESIS,
            scheme: SchemeId::BlsUnchainedG1Rfc9380,
            beacon_id: "test".into(),
        }
    }

    #[test]
    fn genesis_is_round_one() {
        let info = info(3);
        assert_eq!(round_time(&info, 1).unwrap(), GENESIS * 1000);
        assert_eq!(round_at(GENESIS * 1000, &info).unwrap(), 1);
    }

    #[test]
    fn before_genesis_rounds_up_to_one() {
        assert_eq!(round_at(0, &info(3)).unwrap(), 1);
    }

    #[test]
    fn round_at_rounds_up() {
        let info = info(3);
        let t100 = round_time(&info, 100).unwrap();
        assert_eq!(round_at(t100, &info).unwrap(), 100);
        assert_eq!(round_at(t100 + 1, &info).unwrap(), 101);
        assert_eq!(round_at(t100 - 1, &info).unwrap(), 100);
    }

    #[test]
    fn round_100_time() {
        assert_eq!(
            round_time(&info(3), 100).unwrap(),
            (GENESIS + 99 * 3) * 1000
        );
    }

    #[test]
    fn zero_period_rejected() {
        let info = info(0);
        assert!(matches!(round_at(0, &info), Err(TlockError::InvalidChainInfo(_))));
        assert!(matches!(round_time(&info, 1), Err(TlockError::InvalidChainInfo(_))));
    }

    #[test]
    fn round_zero_has_no_time() {
        assert!(matches!(round_time(&info(3), 0), Err(TlockError::InvalidRound(0))));
    }

    #[test]
    fn current_round_floors() {
        let info = info(3);
        let t = round_time(&info, 10).unwrap();
        assert_eq!(current_round(t, &info).unwrap(), 10);
        assert_eq!(current_round(t + 2999, &info).unwrap(), 10);
        assert_eq!(current_round(t + 3000, &info).unwrap(), 11);
        assert_eq!(current_round(GENESIS * 1000 - 1, &info).unwrap(), 0);
    }

    #[test]
    fn availability() {
        let info = info(3);
        let t = round_time(&info, 50).unwrap();
        assert!(is_round_available(50, t, &info).unwrap());
        assert!(!is_round_available(51, t, &info).unwrap());
        assert!(is_round_available(0, t, &info).is_err());
    }

    #[test]
    fn system_clock_is_past_2020() {
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }

    proptest! {
        #[test]
        fn round_time_inverts(round in 1u64..1_000_000_000, period in 1u64..3600) {
            let info = info(period);
            let t = round_time(&info, round).unwrap();
            prop_assert_eq!(round_at(t, &info).unwrap(), round);
        }

        #[test]
        fn round_at_monotonic(a in 0u64..4_000_000_000_000, b in 0u64..4_000_000_000_000) {
            let info = info(3);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(round_at(lo, &info).unwrap() <= round_at(hi, &info).unwrap());
        }

        #[test]
        fn round_at_is_smallest(t in 0u64..4_000_000_000_000) {
            let info = info(3);
            let r = round_at(t, &info).unwrap();
            prop_assert!(round_time(&info, r).unwrap() >= t);
            if r > 1 {
                prop_assert!(round_time(&info, r - 1).unwrap() < t);
            }
        }
    }
}
