//! Bounded cyclic counter used to pick rotating file slots.

use anyhow::{anyhow, Result};

/// Counts from 0 up to `limit - 1`, then wraps back to 0.
#[derive(Clone, Debug)]
pub struct RollingCounter {
    count: usize,
    limit: usize,
}

impl RollingCounter {
    pub fn new(limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(anyhow!("rolling counter limit must be greater than zero"));
        }
        Ok(Self { count: 0, limit })
    }

    /// Advance by one, wrapping to 0 when the limit is reached.
    pub fn increment(&mut self) {
        self.count += 1;
        if self.count >= self.limit {
            self.count = 0;
        }
    }

    pub fn value(&self) -> usize {
        self.count
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_by_one() -> Result<()> {
        let mut counter = RollingCounter::new(10)?;
        counter.increment();
        assert_eq!(counter.value(), 1);
        Ok(())
    }

    #[test]
    fn wraps_after_limit_increments() -> Result<()> {
        for limit in 1..=12 {
            let mut counter = RollingCounter::new(limit)?;
            for k in 0..limit {
                assert_eq!(counter.value(), k);
                counter.increment();
            }
            assert_eq!(counter.value(), 0, "limit {}", limit);
        }
        Ok(())
    }

    #[test]
    fn zero_limit_is_rejected() {
        assert!(RollingCounter::new(0).is_err());
    }
}
