use crate::{errors::ServiceError, services::documents::TEXT_CONTENT_TYPE};
use async_trait::async_trait;
use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// JSON body whose rejections come back as `validation_error` bodies.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ServiceError::ValidationError(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Path parameters with structured rejections.
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ServiceError::ValidationError(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Query string with structured rejections.
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ServiceError::ValidationError(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Optional `?date=YYYY-MM-DD` selector; absent means today.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DateQuery {
    pub date: Option<String>,
}

impl DateQuery {
    pub fn resolve(&self) -> Result<NaiveDate, ServiceError> {
        match self.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(raw) => parse_date(raw),
            None => Ok(today()),
        }
    }
}

/// Acknowledgement body for deletes.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Deleted {
    pub id: uuid::Uuid,
    pub deleted: bool,
}

/// Dock wall-clock date; the only place handlers read the calendar.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Dock wall-clock time truncated to the minute.
pub fn now_local() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        ServiceError::ValidationError(format!("Invalid date '{}', expected YYYY-MM-DD", raw))
    })
}

/// Plain-text attachment response.
pub fn text_download(filename: &str, body: String) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, TEXT_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn date_query_parses_or_defaults_to_today() {
        let q = DateQuery {
            date: Some("2024-12-09".into()),
        };
        assert_eq!(
            q.resolve().unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 9).unwrap()
        );
        assert_eq!(DateQuery::default().resolve().unwrap(), today());
        assert_matches!(
            DateQuery {
                date: Some("09/12/2024".into())
            }
            .resolve(),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn text_download_sets_headers() {
        let response = text_download("unloading_2024-12-09.txt", "hi".into());
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"unloading_2024-12-09.txt\""
        );
        assert_eq!(response.headers()[header::CONTENT_TYPE], TEXT_CONTENT_TYPE);
    }
}
