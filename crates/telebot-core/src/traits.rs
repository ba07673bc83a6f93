use crate::{
    error::BotError,
    request::{ApiReply, Params, Upload},
};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// HTTP transport. The only thing that talks to the network.
///
/// One call in, one normalized reply out. No retries at this layer; the
/// client wraps calls with its retry policy.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `{base}bot{token}/{method}` with `params` as the query string.
    ///
    /// `timeout` overrides the default request deadline (used by long polls).
    async fn get(
        &self,
        method: &str,
        params: &Params,
        timeout: Option<Duration>,
    ) -> Result<ApiReply, BotError>;

    /// POST a multipart form: `params` as text fields plus one file part.
    async fn post_multipart(
        &self,
        method: &str,
        params: &Params,
        upload: &Upload,
    ) -> Result<ApiReply, BotError>;

    /// Stream the file at `file_path` (from `getFile`) into `destination`.
    /// Returns the number of bytes written.
    async fn download(&self, file_path: &str, destination: &Path) -> Result<u64, BotError>;
}
