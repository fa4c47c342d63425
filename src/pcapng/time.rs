use crate::capture::Timestamp;

/// Resolution used when an interface does not declare `if_tsresol`
pub const DEFAULT_TS_RESOLUTION: u64 = 1_000_000_000;

/// Compute the timestamp resolution, in units per second
///
/// Return the resolution, or `None` if the resolution is invalid (for ex. greater than `2^64`)
pub fn build_ts_resolution(ts_resol: u8) -> Option<u64> {
    let ts_mode = ts_resol & 0x80;
    let unit = if ts_mode == 0 {
        // 10^if_tsresol
        // check that if_tsresol <= 19 (10^19 is the largest power of 10 to fit in a u64)
        if ts_resol > 19 {
            return None;
        }
        10u64.pow(ts_resol as u32)
    } else {
        // 2^if_tsresol
        let exp = ts_resol & 0x7f;
        if exp > 63 {
            return None;
        }
        1u64 << exp
    };
    Some(unit)
}

/// Build a timestamp from the two halves of a pcapng tick count
///
/// `ts_offset` is the interface `if_tsoffset`, in seconds; it may be negative.
pub fn build_ts(ts_high: u32, ts_low: u32, ts_offset: i64, resolution: u64) -> Timestamp {
    let ticks = (u64::from(ts_high) << 32) | u64::from(ts_low);
    let ts = Timestamp::from_ticks(ticks, resolution);
    let offset_ns = ts_offset.unsigned_abs().saturating_mul(1_000_000_000);
    if ts_offset >= 0 {
        Timestamp(ts.0.saturating_add(offset_ns))
    } else {
        Timestamp(ts.0.saturating_sub(offset_ns))
    }
}
