use rand::Rng;
use std::time::Duration;

/// `base_ms` plus a random extra of up to `jitter_ms`.
fn jittered_ms(base_ms: u64, jitter_ms: u64) -> u64 {
    let extra = if jitter_ms == 0 {
        0
    } else {
        rand::rng().random_range(0..=jitter_ms)
    };
    base_ms.saturating_add(extra)
}

pub async fn sleep_with_jitter(base_ms: u64, jitter_ms: u64) {
    tokio::time::sleep(Duration::from_millis(jittered_ms(base_ms, jitter_ms))).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jitter_stays_in_range() {
        for _ in 0..100 {
            let ms = jittered_ms(1000, 500);
            assert!((1000..=1500).contains(&ms));
        }
        assert_eq!(jittered_ms(1000, 0), 1000);
    }

    #[test]
    fn test_jitter_saturates() {
        assert_eq!(jittered_ms(u64::MAX, 10), u64::MAX);
    }
}
