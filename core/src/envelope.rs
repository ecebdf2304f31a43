//! The `{meta, data, pagination}` wrapper around every API response.
//!
//! `data` is kept as a raw `serde_json::Value` until the caller decides
//! whether it expects a single record or a list. A JSON `null` is treated
//! the same as a missing field.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::HttpResponse;

/// `meta.code` of a successful call.
pub const OK_CODE: u16 = 200;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub meta: Option<Meta>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub next_url: Option<String>,
}

impl Envelope {
    /// Parse a response body.
    ///
    /// A body that is not an envelope is a `HttpError` when the status is
    /// non-2xx and a `DeserializationError` otherwise.
    pub fn from_response(response: &HttpResponse) -> Result<Self, ApiError> {
        match serde_json::from_str::<Envelope>(&response.body) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !response.is_success() => Err(ApiError::HttpError {
                status: response.status,
                body: response.body.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    pub fn code(&self) -> Result<u16, ApiError> {
        self.meta
            .as_ref()
            .and_then(|meta| meta.code)
            .ok_or(ApiError::MissingField("meta.code"))
    }

    /// Fail with `ApiError::Api` unless `meta.code` is 200.
    pub fn ensure_ok(&self) -> Result<(), ApiError> {
        let code = self.code()?;
        if code == OK_CODE {
            return Ok(());
        }
        let meta = self.meta.as_ref();
        Err(ApiError::Api {
            code,
            error_type: meta
                .and_then(|m| m.error_type.clone())
                .unwrap_or_else(|| "unknown".to_string()),
            message: meta
                .and_then(|m| m.error_message.clone())
                .unwrap_or_default(),
        })
    }

    pub fn next_url(&self) -> Option<&str> {
        self.pagination.as_ref()?.next_url.as_deref()
    }

    /// The `data` object mapped to `T`, or `None` when `data` is absent.
    pub fn into_item<T: DeserializeOwned>(self) -> Result<Option<T>, ApiError> {
        match self.data {
            None | Some(Value::Null) => Ok(None),
            Some(data) => Ok(Some(serde_json::from_value(data)?)),
        }
    }

    /// The `data` array mapped to `Vec<T>` in server order.
    pub fn into_list<T: DeserializeOwned>(self) -> Result<Vec<T>, ApiError> {
        match self.data {
            None | Some(Value::Null) => Err(ApiError::MissingField("data")),
            Some(data) => Ok(serde_json::from_value(data)?),
        }
    }
}
