// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    CandidateOrder, CommitOutcome, Film, MatchProposal, NewFilm, Pairing, PairingCandidate, RankingEntry,
    RatingRecord, RatingSnapshot, RecordUpdate, Vote, VoteCommit, VoteOutcome,
};
pub use requests::{CreateFilmRequest, PairingQuery, RankingsQuery, RecentVotesQuery, SubmitVoteRequest};
pub use responses::{ErrorMeta, ErrorResponse, HealthResponse, PairingResponse, RankingsResponse, RecentVotesResponse};
