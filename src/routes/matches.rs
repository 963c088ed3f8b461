use crate::error::RatingError;
use crate::models::{Pairing, PairingQuery, PairingResponse, SubmitVoteRequest};
use crate::routes::AppState;
use actix_web::{web, HttpResponse};

/// Configure pairing and voting routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/matches/pairing", web::get().to(select_pairing))
        .route("/matches/vote", web::post().to(submit_vote));
}

/// Propose two films to compare
///
/// GET /api/v1/matches/pairing?previousFirst={id}&previousSecond={id}
///
/// Responds with `available: false` when fewer than two films exist.
async fn select_pairing(
    state: web::Data<AppState>,
    query: web::Query<PairingQuery>,
) -> Result<HttpResponse, RatingError> {
    let previous = match (query.previous_first, query.previous_second) {
        (Some(first), Some(second)) => Some(Pairing { first, second }),
        _ => None,
    };

    let proposal = state.service.select_pairing(previous).await?;

    Ok(HttpResponse::Ok().json(PairingResponse {
        available: proposal.is_some(),
        pairing: proposal,
    }))
}

/// Record the outcome of a pairing
///
/// POST /api/v1/matches/vote
///
/// Request body:
/// ```json
/// {
///   "winnerId": "uuid",
///   "loserId": "uuid"
/// }
/// ```
async fn submit_vote(
    state: web::Data<AppState>,
    req: web::Json<SubmitVoteRequest>,
) -> Result<HttpResponse, RatingError> {
    let outcome = state.service.submit_vote(req.winner_id, req.loser_id).await?;

    tracing::info!(
        "Vote recorded: {} ({:.1}) beat {} ({:.1})",
        outcome.winner.id,
        outcome.winner.rating,
        outcome.loser.id,
        outcome.loser.rating
    );

    Ok(HttpResponse::Ok().json(outcome))
}
