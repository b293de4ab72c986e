/// Static score-to-token mapping. Tiers are ordered highest threshold first;
/// the first tier whose threshold the score meets wins, no match pays 0.
#[derive(Debug, Clone, Copy)]
pub struct RewardTable {
    tiers: &'static [(u32, u32)],
}

impl RewardTable {
    pub const fn new(tiers: &'static [(u32, u32)]) -> Self {
        Self { tiers }
    }

    pub fn tokens_for(&self, score: u32) -> u32 {
        self.tiers
            .iter()
            .find(|(threshold, _)| score >= *threshold)
            .map(|(_, tokens)| *tokens)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const SNAKE: RewardTable = RewardTable::new(&[(100, 2), (50, 1)]);
    const RHYTHM: RewardTable = RewardTable::new(&[(1000, 3), (500, 2), (200, 1)]);
    const PONG: RewardTable = RewardTable::new(&[(5, 1)]);

    #[test]
    fn snake_thresholds_are_exact() {
        assert_eq!(SNAKE.tokens_for(100), 2);
        assert_eq!(SNAKE.tokens_for(99), 1);
        assert_eq!(SNAKE.tokens_for(50), 1);
        assert_eq!(SNAKE.tokens_for(49), 0);
        assert_eq!(SNAKE.tokens_for(0), 0);
    }

    #[test]
    fn rhythm_thresholds_are_exact() {
        assert_eq!(RHYTHM.tokens_for(1000), 3);
        assert_eq!(RHYTHM.tokens_for(999), 2);
        assert_eq!(RHYTHM.tokens_for(500), 2);
        assert_eq!(RHYTHM.tokens_for(499), 1);
        assert_eq!(RHYTHM.tokens_for(200), 1);
        assert_eq!(RHYTHM.tokens_for(199), 0);
    }

    #[test]
    fn pong_pays_on_a_win_only() {
        assert_eq!(PONG.tokens_for(5), 1);
        assert_eq!(PONG.tokens_for(4), 0);
    }

    #[test]
    fn empty_table_pays_nothing() {
        assert_eq!(RewardTable::new(&[]).tokens_for(u32::MAX), 0);
    }

    proptest! {
        #[test]
        fn payouts_never_shrink_as_scores_grow(score in 0u32..2000) {
            for table in [SNAKE, RHYTHM, PONG] {
                prop_assert!(table.tokens_for(score + 1) >= table.tokens_for(score));
            }
        }
    }
}
