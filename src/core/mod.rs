// Core algorithm exports
pub mod backoff;
pub mod elo;
pub mod pairing;
pub mod ranking;

pub use backoff::RetryPolicy;
pub use elo::{apply_result, expected_score, RatingChange, DEFAULT_INITIAL_RATING, DEFAULT_K_FACTOR};
pub use pairing::{PairingPolicy, PairingSelector};
pub use ranking::{compare_standing, is_ranked, paginate_rankings};
