/// Current UTC timestamp in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a Snowflake-style i64 for use as resource ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER so the
/// dashboard can hold IDs in plain numbers):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: random (4096 values per ms, collision-free at single-business scale)
pub fn snowflake_id() -> i64 {
    use rand::Rng;
    // Custom epoch: 2024-01-01 00:00:00 UTC
    const EPOCH_MS: i64 = 1_704_067_200_000;
    let now = now_millis();
    let ts = (now - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
    let rand_bits: i64 = rand::thread_rng().gen_range(0..0x1000); // 12 bits
    (ts << 12) | rand_bits
}

/// Current calendar month as a `YYYY-MM` period key (UTC).
///
/// Usage counters and monthly quotas are bucketed by this key.
pub fn current_period() -> String {
    chrono::Utc::now().format("%Y-%m").to_string()
}

/// Today's date as ISO `YYYY-MM-DD` (UTC).
pub fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snowflake_ids_are_positive_and_js_safe() {
        let id = snowflake_id();
        assert!(id > 0);
        assert!(id <= 2_i64.pow(53) - 1);
    }

    #[test]
    fn period_key_shape() {
        let period = current_period();
        assert_eq!(period.len(), 7);
        assert_eq!(&period[4..5], "-");
    }
}
