use std::time::Duration;

/// Decides how many loot items a session spawns this tick. The curve is a
/// pluggable policy; sessions only see this narrow interface.
pub trait LootPolicy: Send + Sync {
    fn generate(&self, elapsed: Duration, item_count: usize, looter_count: usize) -> u32;
}

/// Default policy: the expected count grows with the shortage of loot
/// relative to looters and with the time since the last spawn, saturating at
/// `probability` per configured period.
#[derive(Clone, Debug)]
pub struct LootGenerator {
    period: Duration,
    probability: f64,
}

impl LootGenerator {
    pub fn new(period: Duration, probability: f64) -> Self {
        Self {
            period,
            probability: probability.clamp(0.0, 1.0),
        }
    }
}

impl LootPolicy for LootGenerator {
    fn generate(&self, elapsed: Duration, item_count: usize, looter_count: usize) -> u32 {
        let shortage = looter_count.saturating_sub(item_count);
        if shortage == 0 || self.period.is_zero() {
            return 0;
        }

        let ratio = elapsed.as_secs_f64() / self.period.as_secs_f64();
        let probability = (1.0 - (1.0 - self.probability).powf(ratio)).clamp(0.0, 1.0);
        (shortage as f64 * probability).round() as u32
    }
}
