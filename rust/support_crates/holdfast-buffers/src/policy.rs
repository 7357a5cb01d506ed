//! Growth policy of [`GrowableBuffer`](crate::growable::GrowableBuffer).

use holdfast_common::{Result, error::Error};

/// Decides the length of the replacement block when a growable buffer runs out
/// of room.
///
/// Given the current length `L` and the minimal increment `m` needed by a write,
/// the new length is `max(min_len, L + L * growth_percent / 100, L + m)`,
/// capped by `max_len` when one is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthPolicy {
    /// Floor for the length of any replacement block.
    pub min_len: usize,
    /// Geometric growth step, in percent of the current length.
    pub growth_percent: usize,
    /// Upper bound on the length of the block, if any.
    pub max_len: Option<usize>,
}

impl GrowthPolicy {
    pub const DEFAULT_MIN_LEN: usize = 16;
    pub const DEFAULT_GROWTH_PERCENT: usize = 50;

    pub const DEFAULT: GrowthPolicy = GrowthPolicy {
        min_len: Self::DEFAULT_MIN_LEN,
        growth_percent: Self::DEFAULT_GROWTH_PERCENT,
        max_len: None,
    };

    pub const fn with_min_len(mut self, min_len: usize) -> GrowthPolicy {
        self.min_len = min_len;
        self
    }

    pub const fn with_growth_percent(mut self, growth_percent: usize) -> GrowthPolicy {
        self.growth_percent = growth_percent;
        self
    }

    pub const fn with_max_len(mut self, max_len: usize) -> GrowthPolicy {
        self.max_len = Some(max_len);
        self
    }

    /// Computes the length of a replacement for a block of `current` elements
    /// that must gain at least `min_increment` elements.
    ///
    /// # Errors
    ///
    /// Returns `CapacityLimitExceeded` if `current + min_increment` overflows or
    /// exceeds `max_len`.
    pub fn next_len(&self, current: usize, min_increment: usize) -> Result<usize> {
        let required = current
            .checked_add(min_increment)
            .ok_or_else(|| Error::capacity_limit(usize::MAX, usize::MAX))?;
        let geometric = current.saturating_add(percent_of(current, self.growth_percent));
        let new_len = self.min_len.max(geometric).max(required);
        match self.max_len {
            Some(limit) if required > limit => {
                log::debug!("growth to {required} elements refused by the limit of {limit}");
                Err(Error::capacity_limit(required, limit))
            }
            Some(limit) => Ok(new_len.min(limit)),
            None => Ok(new_len),
        }
    }

    /// Checks that a block of `len` elements is permitted by this policy.
    pub fn check_len(&self, len: usize) -> Result<()> {
        match self.max_len {
            Some(limit) if len > limit => Err(Error::capacity_limit(len, limit)),
            _ => Ok(()),
        }
    }
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// `n * percent / 100`, rounded down, without intermediate overflow for `n`.
#[inline]
fn percent_of(n: usize, percent: usize) -> usize {
    (n / 100)
        .saturating_mul(percent)
        .saturating_add((n % 100).saturating_mul(percent) / 100)
}

#[cfg(test)]
mod tests {
    use holdfast_common::error::ErrorKind;

    use super::*;

    #[test]
    fn test_default_sequence() {
        let policy = GrowthPolicy::default();
        let mut len = 0;
        let mut lengths = Vec::new();
        for _ in 0..5 {
            len = policy.next_len(len, 1).unwrap();
            lengths.push(len);
        }
        assert_eq!(lengths, [16, 24, 36, 54, 81]);
    }

    #[test]
    fn test_required_increment_wins() {
        let policy = GrowthPolicy::DEFAULT;
        assert_eq!(policy.next_len(0, 100).unwrap(), 100);
        assert_eq!(policy.next_len(20, 5).unwrap(), 30);
        assert_eq!(policy.next_len(20, 50).unwrap(), 70);
    }

    #[test]
    fn test_geometric_rounds_down() {
        let policy = GrowthPolicy::DEFAULT.with_min_len(0);
        assert_eq!(policy.next_len(3, 1).unwrap(), 4);
        assert_eq!(policy.next_len(101, 1).unwrap(), 151);
        assert_eq!(policy.next_len(1, 1).unwrap(), 2);
    }

    #[test]
    fn test_custom_policy() {
        let policy = GrowthPolicy::DEFAULT
            .with_min_len(4)
            .with_growth_percent(100);
        assert_eq!(policy.next_len(0, 1).unwrap(), 4);
        assert_eq!(policy.next_len(4, 1).unwrap(), 8);
        assert_eq!(policy.next_len(8, 1).unwrap(), 16);
    }

    #[test]
    fn test_limit_clamps_and_refuses() {
        let policy = GrowthPolicy::DEFAULT.with_max_len(30);
        assert_eq!(policy.next_len(0, 1).unwrap(), 16);
        assert_eq!(policy.next_len(24, 1).unwrap(), 30);
        let err = policy.next_len(30, 1).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::CapacityLimitExceeded {
                requested: 31,
                limit: 30
            }
        ));
        assert!(policy.check_len(30).is_ok());
        assert!(policy.check_len(31).is_err());
    }

    #[test]
    fn test_overflow() {
        let policy = GrowthPolicy::DEFAULT;
        assert!(policy.next_len(usize::MAX, 1).is_err());
        assert_eq!(policy.next_len(usize::MAX - 1, 1).unwrap(), usize::MAX);
    }
}
