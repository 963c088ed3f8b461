use crate::error::{JsonError, RatingError};
use crate::metrics::Metrics;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::http::StatusCode;
use actix_web::middleware::Next;
use actix_web::{web, Error};
use std::time::Instant;
use uuid::Uuid;

/// Route label for requests that matched no resource
const UNMATCHED_ROUTE: &str = "unmatched";

pub const REQUEST_ID_HEADER: &str = "x-request-id";

tokio::task_local! {
    static REQUEST_ID: String;
}

/// Id of the request being served on this task, if any
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|id| id.clone()).ok()
}

/// Propagate the caller's `X-Request-ID`, or mint one, and echo it back
pub async fn request_id(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    tracing::debug!("{} {} request_id={}", req.method(), req.path(), request_id);

    // Error bodies built further down read the id back from the task-local
    let mut res = REQUEST_ID.scope(request_id.clone(), next.call(req)).await?;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        res.headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    Ok(res)
}

/// Count and time every request into the app's `Metrics`, if one is registered
///
/// Routes are labelled by their pattern (`/api/v1/films/{id}`), never by the
/// raw path.
pub async fn track_requests(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let Some(metrics) = req.app_data::<web::Data<Metrics>>().cloned() else {
        return next.call(req).await;
    };
    let method = req.method().to_string();
    let started = Instant::now();

    match next.call(req).await {
        Ok(res) => {
            let route = res
                .request()
                .match_pattern()
                .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());
            let status = res.status();
            metrics.observe_request(&method, &route, status.as_u16(), started.elapsed().as_secs_f64());

            if status.is_client_error() || status.is_server_error() {
                let error = res
                    .response()
                    .error()
                    .and_then(error_label)
                    .unwrap_or_else(|| status_label(status));
                metrics.observe_error(&route, &error);
            }
            Ok(res)
        }
        Err(e) => {
            let status = e.as_response_error().status_code();
            metrics.observe_request(&method, UNMATCHED_ROUTE, status.as_u16(), started.elapsed().as_secs_f64());
            metrics.observe_error(UNMATCHED_ROUTE, &error_label(&e).unwrap_or_else(|| status_label(status)));
            Err(e)
        }
    }
}

fn error_label(error: &Error) -> Option<String> {
    error
        .as_error::<RatingError>()
        .map(|e| e.code().to_string())
        .or_else(|| error.as_error::<JsonError>().map(|e| e.error.clone()))
}

fn status_label(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("error")
        .to_lowercase()
        .replace(' ', "_")
}
