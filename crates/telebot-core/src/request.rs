//! Request parameters, upload descriptions and raw API replies.

use crate::error::BotError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Method parameters. `null` values are never sent.
pub type Params = Map<String, Value>;

/// Serialize a request struct into method parameters.
pub fn to_params<T: Serialize>(request: &T) -> Result<Params, BotError> {
    match serde_json::to_value(request) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(BotError::Decode(format!(
            "request must serialize to an object, got {other}"
        ))),
        Err(e) => Err(BotError::Decode(format!("failed to encode request: {e}"))),
    }
}

/// Flatten parameters into string pairs for a query string or form.
///
/// Nulls are dropped, strings go as-is, everything else (numbers, bools,
/// nested objects such as `reply_markup`) is sent as its JSON text.
pub fn form_pairs(params: &Params) -> Vec<(String, String)> {
    params
        .iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), text))
        })
        .collect()
}

/// A file argument to an upload method.
#[derive(Debug, Clone)]
pub enum InputFile {
    /// A file already on the server; sent by reference, no upload.
    FileId(String),
    /// A local file; content type is inferred from the extension.
    Path(PathBuf),
    /// In-memory content with an explicit name and optional type.
    Bytes {
        filename: String,
        content_type: Option<String>,
        data: Vec<u8>,
    },
}

impl InputFile {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn file_id(id: impl Into<String>) -> Self {
        Self::FileId(id.into())
    }

    pub fn bytes(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes {
            filename: filename.into(),
            content_type: None,
            data: data.into(),
        }
    }

    /// Set an explicit content type on in-memory content.
    pub fn with_content_type(self, content_type: impl Into<String>) -> Self {
        match self {
            Self::Bytes { filename, data, .. } => Self::Bytes {
                filename,
                content_type: Some(content_type.into()),
                data,
            },
            other => other,
        }
    }

    /// Declared or inferred content type; `None` for server-side files.
    pub fn content_type(&self) -> Option<String> {
        match self {
            Self::FileId(_) => None,
            Self::Path(path) => Some(guess_content_type(path)),
            Self::Bytes {
                filename,
                content_type,
                ..
            } => Some(
                content_type
                    .clone()
                    .unwrap_or_else(|| guess_content_type(Path::new(filename))),
            ),
        }
    }

    /// The multipart part for this file, or `None` when no upload is needed.
    pub fn to_upload(&self, field: &str) -> Option<Upload> {
        let content_type = self.content_type()?;
        let (filename, source) = match self {
            Self::FileId(_) => return None,
            Self::Path(path) => (
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| field.to_string()),
                UploadSource::Path(path.clone()),
            ),
            Self::Bytes { filename, data, .. } => {
                (filename.clone(), UploadSource::Bytes(data.clone()))
            }
        };
        Some(Upload {
            field: field.to_string(),
            filename,
            content_type,
            source,
        })
    }
}

/// Where upload bytes come from.
#[derive(Debug, Clone)]
pub enum UploadSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// The single file part of a multipart call.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Form field name, e.g. `photo`.
    pub field: String,
    pub filename: String,
    pub content_type: String,
    pub source: UploadSource,
}

fn guess_content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Decoded HTTP response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    Json(Value),
    /// Body served with a non-JSON content type.
    Raw(String),
}

/// One HTTP response from the API, before `ok`/`result` are interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply {
    pub status: u16,
    pub body: ReplyBody,
}

impl ApiReply {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: ReplyBody::Json(body),
        }
    }

    /// Statuses the poll loop reports as dedicated errors.
    pub fn status_error(&self) -> Option<BotError> {
        match self.status {
            401 => Some(BotError::InvalidToken),
            409 => Some(BotError::DuplicateInstance),
            502 => Some(BotError::Gateway),
            _ => None,
        }
    }

    /// `ok: true` yields `result`; anything else is a rejection carrying
    /// the raw response.
    pub fn into_result(self) -> Result<Value, BotError> {
        match self.body {
            ReplyBody::Json(mut body) => {
                if body.get("ok").and_then(Value::as_bool) == Some(true) {
                    return Ok(body
                        .as_object_mut()
                        .and_then(|o| o.remove("result"))
                        .unwrap_or(Value::Null));
                }
                let error_code = body
                    .get("error_code")
                    .and_then(Value::as_i64)
                    .or(Some(i64::from(self.status)));
                let description = body
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown API error")
                    .to_string();
                Err(BotError::RemoteRejection {
                    error_code,
                    description,
                    response: body,
                })
            }
            ReplyBody::Raw(text) => Err(BotError::RemoteRejection {
                error_code: Some(i64::from(self.status)),
                description: format!("non-JSON response (HTTP {})", self.status),
                response: Value::String(text),
            }),
        }
    }
}
