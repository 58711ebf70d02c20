//! 重试退避策略
//!
//! 只计算等待时长，实际等待由爬虫的重试循环执行。

use std::time::Duration;

use rand::Rng;

/// 指数退避 + 随机抖动：`base * 2^attempt + max_jitter * U(0,1)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub max_jitter: Duration,
}

impl BackoffPolicy {
    pub fn new(base: Duration, max_jitter: Duration) -> Self {
        Self { base, max_jitter }
    }

    /// 不等待（测试用）
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// 第 `attempt` 次失败后的等待时长，`jitter_fraction` 会被限制在 [0, 1]
    pub fn delay_for(&self, attempt: u32, jitter_fraction: f64) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        let fraction = if jitter_fraction.is_nan() {
            0.0
        } else {
            jitter_fraction.clamp(0.0, 1.0)
        };
        self.base.saturating_mul(factor) + self.max_jitter.mul_f64(fraction)
    }

    /// 随机抽取抖动系数
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let fraction = rand::thread_rng().gen_range(0.0..=1.0);
        self.delay_for(attempt, fraction)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(1))
    }
}
