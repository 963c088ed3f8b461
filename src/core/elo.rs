/// Default K-factor: the maximum rating change a single vote can cause
pub const DEFAULT_K_FACTOR: f64 = 32.0;

/// Rating every film starts with when imported
pub const DEFAULT_INITIAL_RATING: f64 = 1500.0;

/// Rating difference at which the stronger side is expected to win ~91% of the time
const SCALE: f64 = 400.0;

/// Ratings of both films before and after a single vote
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingChange {
    pub winner_before: f64,
    pub winner_after: f64,
    pub loser_before: f64,
    pub loser_after: f64,
}

impl RatingChange {
    /// Points moved from the loser to the winner
    pub fn delta(&self) -> f64 {
        self.winner_after - self.winner_before
    }
}

/// Probability that a film rated `rating` beats one rated `opponent`
///
/// E = 1 / (1 + 10^((opponent - rating) / 400))
#[inline]
pub fn expected_score(rating: f64, opponent: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent - rating) / SCALE))
}

/// Apply one win/loss outcome
///
/// The winner gains `k * (1 - Ew)` and the loser gives up exactly the same
/// amount, which equals `k * (0 - El)` since `El = 1 - Ew`.
pub fn apply_result(winner_rating: f64, loser_rating: f64, k_factor: f64) -> RatingChange {
    let expected_winner = expected_score(winner_rating, loser_rating);
    let delta = k_factor * (1.0 - expected_winner);

    RatingChange {
        winner_before: winner_rating,
        winner_after: winner_rating + delta,
        loser_before: loser_rating,
        loser_after: loser_rating - delta,
    }
}
