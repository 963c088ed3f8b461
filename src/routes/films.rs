use crate::error::RatingError;
use crate::models::{
    CreateFilmRequest, ErrorResponse, NewFilm, RankingsQuery, RankingsResponse, RecentVotesQuery,
    RecentVotesResponse,
};
use crate::routes::AppState;
use actix_web::{web, HttpResponse};
use uuid::Uuid;
use validator::Validate;

const DEFAULT_RECENT_VOTES: u64 = 50;

/// Configure catalog, leaderboard and audit routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/films", web::post().to(import_film))
        .route("/films/{id}", web::get().to(get_film))
        .route("/rankings", web::get().to(list_rankings))
        .route("/votes", web::get().to(recent_votes));
}

fn validation_failed(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse::new("validation_failed", errors.to_string(), 400))
}

/// Import a film into the catalog
///
/// POST /api/v1/films
///
/// Request body:
/// ```json
/// {
///   "title": "string",
///   "releaseYear": 1999,
///   "metadata": {}
/// }
/// ```
async fn import_film(
    state: web::Data<AppState>,
    req: web::Json<CreateFilmRequest>,
) -> Result<HttpResponse, RatingError> {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for film import: {}", errors);
        return Ok(validation_failed(errors));
    }

    let req = req.into_inner();
    let film = state
        .service
        .import_film(NewFilm {
            title: req.title,
            release_year: req.release_year,
            metadata: req.metadata.unwrap_or_else(|| serde_json::json!({})),
        })
        .await?;

    Ok(HttpResponse::Created().json(film))
}

/// GET /api/v1/films/{id}
async fn get_film(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, RatingError> {
    let film = state.service.get_film(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(film))
}

/// Leaderboard page
///
/// GET /api/v1/rankings?offset={n}&limit={n}
async fn list_rankings(
    state: web::Data<AppState>,
    query: web::Query<RankingsQuery>,
) -> Result<HttpResponse, RatingError> {
    if let Err(errors) = query.validate() {
        return Ok(validation_failed(errors));
    }

    let offset = query.offset.unwrap_or(0);
    // Cap limit to keep pages cheap
    let limit = query
        .limit
        .unwrap_or(state.rankings.default_limit)
        .min(state.rankings.max_limit);

    let rankings = state.service.list_rankings(offset, limit).await?;

    Ok(HttpResponse::Ok().json(RankingsResponse {
        rankings,
        offset,
        limit,
    }))
}

/// Most recent votes, newest first
///
/// GET /api/v1/votes?limit={n}
async fn recent_votes(
    state: web::Data<AppState>,
    query: web::Query<RecentVotesQuery>,
) -> Result<HttpResponse, RatingError> {
    if let Err(errors) = query.validate() {
        return Ok(validation_failed(errors));
    }

    let votes = state
        .service
        .recent_votes(query.limit.unwrap_or(DEFAULT_RECENT_VOTES))
        .await?;

    Ok(HttpResponse::Ok().json(RecentVotesResponse {
        count: votes.len(),
        votes,
    }))
}
