//! Extractors whose rejections answer with the same JSON error body as the
//! handlers.

use axum::body::Body;
use axum::extract::FromRequestParts;
use http_body_util::LengthLimitError;

use crate::error::ServerError;

/// `Query<T>` that rejects malformed query strings with a JSON 400.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ServerError))]
pub struct ApiQuery<T>(pub T);

/// Buffer a request body of at most `max` bytes.
///
/// Called after the caller is authenticated, so an anonymous oversized
/// upload is refused as 403 rather than 413.
pub async fn read_body(body: Body, max: usize) -> Result<Vec<u8>, ServerError> {
    match axum::body::to_bytes(body, max).await {
        Ok(bytes) => Ok(bytes.to_vec()),
        Err(e) => {
            let inner = e.into_inner();
            if exceeds_limit(&*inner) {
                Err(ServerError::PayloadTooLarge { max })
            } else {
                Err(ServerError::BadRequest(format!(
                    "Failed to read request body: {inner}"
                )))
            }
        }
    }
}

fn exceeds_limit(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}
