//! Request body extraction.
//!
//! Clients send bodies either as JSON or as urlencoded forms. Both are first
//! read into a [`RawPayload`] field map; a request without a recognised body
//! type is an empty map, so a bare `PUT` reports `missing _id` rather than a
//! transport error. Only a body that cannot be read as a field map at all is
//! rejected.

use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{Form, FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use super::response::ErrorBody;

/// Body fields before they are typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPayload(pub Map<String, Value>);

impl RawPayload {
    /// The caller's `_id`, unless absent, null or an empty string.
    #[must_use]
    pub fn id(&self) -> Option<&Value> {
        self.0.get("_id").filter(|id| match id {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        })
    }

    /// Deserialize the fields into a typed payload.
    ///
    /// # Errors
    ///
    /// Returns the serde error when a field has the wrong type.
    pub fn decode<T: DeserializeOwned>(self) -> serde_json::Result<T> {
        serde_json::from_value(Value::Object(self.0))
    }
}

/// Body deserialized from JSON or form encoding.
#[derive(Debug, Clone, Default)]
pub struct Payload<T>(pub T);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
    Other,
}

fn body_kind(req: &Request) -> BodyKind {
    let Some(content_type) = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return BodyKind::Other;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    if mime == "application/json" || mime.ends_with("+json") {
        BodyKind::Json
    } else if mime == "application/x-www-form-urlencoded" {
        BodyKind::Form
    } else {
        BodyKind::Other
    }
}

fn rejection(detail: impl std::fmt::Display) -> Response {
    debug!(%detail, "Rejected request body");
    ErrorBody::new("invalid request body").into_response()
}

#[async_trait]
impl<S> FromRequest<S> for RawPayload
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match body_kind(&req) {
            BodyKind::Json => {
                let bytes = Bytes::from_request(req, state).await.map_err(rejection)?;
                if bytes.iter().all(u8::is_ascii_whitespace) {
                    return Ok(Self::default());
                }
                match serde_json::from_slice(&bytes).map_err(rejection)? {
                    Value::Object(fields) => Ok(Self(fields)),
                    other => Err(rejection(format!("expected an object, got {other}"))),
                }
            }
            BodyKind::Form => {
                let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                    .await
                    .map_err(rejection)?;
                let fields = pairs
                    .into_iter()
                    .map(|(key, value)| (key, Value::String(value)))
                    .collect();
                Ok(Self(fields))
            }
            BodyKind::Other => Ok(Self::default()),
        }
    }
}

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let raw = RawPayload::from_request(req, state).await?;
        raw.decode().map(Self).map_err(rejection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawPayload {
        match value {
            Value::Object(fields) => RawPayload(fields),
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_id_skips_empty_values() {
        assert_eq!(raw(json!({})).id(), None);
        assert_eq!(raw(json!({ "_id": "" })).id(), None);
        assert_eq!(raw(json!({ "_id": null })).id(), None);
        assert_eq!(raw(json!({ "_id": "abc" })).id(), Some(&json!("abc")));
        assert_eq!(raw(json!({ "_id": 12345 })).id(), Some(&json!(12345)));
    }

    #[test]
    fn test_decode_reports_mistyped_field() {
        let decoded: serde_json::Result<issue_lib::UpdatePayload> =
            raw(json!({ "_id": "abc", "open": "maybe" })).decode();
        assert!(decoded.is_err());

        let decoded: issue_lib::UpdatePayload =
            raw(json!({ "_id": "abc", "open": "false" })).decode().unwrap();
        assert_eq!(decoded.open, Some(false));
    }
}
