//! reqwest-backed [`Transport`].

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use std::error::Error as _;
use std::path::{Path, PathBuf};
use std::time::Duration;
use telebot_core::{
    config::ClientConfig,
    error::{BotError, NetworkCause},
    request::{form_pairs, ApiReply, Params, ReplyBody, Upload, UploadSource},
    traits::Transport,
};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Talks to the Bot API over HTTPS.
pub struct HttpTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, BotError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| BotError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        method: &str,
        params: &Params,
        timeout: Option<Duration>,
    ) -> Result<ApiReply, BotError> {
        let mut request = self
            .client
            .get(self.config.api_url(method))
            .query(&form_pairs(params));
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let resp = request.send().await.map_err(network_error)?;
        let reply = read_reply(resp).await?;
        debug!(method, status = reply.status, "api call finished");
        Ok(reply)
    }

    async fn post_multipart(
        &self,
        method: &str,
        params: &Params,
        upload: &Upload,
    ) -> Result<ApiReply, BotError> {
        let data = match &upload.source {
            UploadSource::Bytes(data) => data.clone(),
            UploadSource::Path(path) => tokio::fs::read(path).await?,
        };
        let size = data.len();

        let part = Part::bytes(data)
            .file_name(upload.filename.clone())
            .mime_str(&upload.content_type)
            .map_err(|_| BotError::InvalidFileType {
                expected: "a valid MIME type".into(),
                actual: upload.content_type.clone(),
            })?;

        let form = form_pairs(params)
            .into_iter()
            .fold(Form::new(), |form, (key, value)| form.text(key, value))
            .part(upload.field.clone(), part);

        let resp = self
            .client
            .post(self.config.api_url(method))
            .multipart(form)
            .send()
            .await
            .map_err(network_error)?;
        let reply = read_reply(resp).await?;
        debug!(
            method,
            field = %upload.field,
            bytes = size,
            status = reply.status,
            "upload finished"
        );
        Ok(reply)
    }

    async fn download(&self, file_path: &str, destination: &Path) -> Result<u64, BotError> {
        let mut resp = self
            .client
            .get(self.config.file_url(file_path))
            .send()
            .await
            .map_err(network_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BotError::RemoteRejection {
                error_code: Some(i64::from(status.as_u16())),
                description: format!("file download failed ({status})"),
                response: serde_json::Value::String(body),
            });
        }

        // A failed transfer must not leave a truncated file under the final name.
        let partial = partial_path(destination);
        let written = match stream_to(&mut resp, &partial).await {
            Ok(written) => written,
            Err(e) => {
                match tokio::fs::remove_file(&partial).await {
                    Err(rm) if rm.kind() != std::io::ErrorKind::NotFound => {
                        warn!(path = %partial.display(), "failed to remove partial download: {rm}");
                    }
                    _ => {}
                }
                return Err(e);
            }
        };
        tokio::fs::rename(&partial, destination).await?;

        debug!(bytes = written, path = %destination.display(), "file downloaded");
        Ok(written)
    }
}

async fn stream_to(resp: &mut reqwest::Response, path: &Path) -> Result<u64, BotError> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written: u64 = 0;
    while let Some(chunk) = resp.chunk().await.map_err(network_error)? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

/// `<name>.part` next to `destination`.
fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    destination.with_file_name(name)
}

/// Decode a response body according to its declared content type.
async fn read_reply(resp: reqwest::Response) -> Result<ApiReply, BotError> {
    let status = resp.status().as_u16();
    let is_json = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("json"));

    let text = resp.text().await.map_err(network_error)?;
    if !is_json {
        return Ok(ApiReply {
            status,
            body: ReplyBody::Raw(text),
        });
    }

    let value = serde_json::from_str(&text)
        .map_err(|e| BotError::Decode(format!("invalid JSON in HTTP {status} response: {e}")))?;
    Ok(ApiReply::json(status, value))
}

/// Map a reqwest failure onto the client's error taxonomy.
///
/// The URL is stripped first: it embeds the bot token.
fn network_error(e: reqwest::Error) -> BotError {
    let e = e.without_url();
    let cause = if e.is_timeout() {
        NetworkCause::Timeout
    } else if is_dns_failure(&e) {
        NetworkCause::HostNotFound
    } else if e.is_connect() {
        NetworkCause::Connect
    } else {
        NetworkCause::Other
    };
    BotError::network(cause, full_chain(&e))
}

const DNS_MARKERS: &[&str] = &[
    "dns error",
    "failed to lookup address",
    "name or service not known",
    "no such host",
    "nodename nor servname",
];

fn is_dns_failure(e: &reqwest::Error) -> bool {
    let mut source = e.source();
    while let Some(err) = source {
        let text = err.to_string().to_lowercase();
        if DNS_MARKERS.iter().any(|m| text.contains(m)) {
            return true;
        }
        source = err.source();
    }
    false
}

fn full_chain(e: &reqwest::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(err) = source {
        message.push_str(": ");
        message.push_str(&err.to_string());
        source = err.source();
    }
    message
}
