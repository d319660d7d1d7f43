//! Request extractors that report failures in the API's error format

use axum::extract::{rejection::JsonRejection, FromRequest, Request};
use axum::Json;

use crate::error::TripError;

/// JSON body extractor whose rejection is a [`TripError`]
///
/// A body that is not valid JSON, misses a required field or has a field of
/// the wrong type is answered with the usual `{"error","code"}` body and a
/// `validation_error` code instead of axum's plain-text rejection.
///
/// # Example
///
/// ```no_run
/// # use tripfund::extract::ApiJson;
/// # use tripfund::model::JoinRequest;
/// async fn join(ApiJson(request): ApiJson<JoinRequest>) -> String {
///     request.code
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = TripError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}
