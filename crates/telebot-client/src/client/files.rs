//! File metadata lookup and download.

use super::Client;
use std::path::{Path, PathBuf};
use telebot_core::{error::BotError, request::Params, types::File};
use tracing::debug;

/// What `get_file` resolved.
#[derive(Debug, Clone)]
pub struct FileDownload {
    pub file: File,
    /// Direct download URL. Embeds the bot token; do not log it.
    pub url: String,
    /// Where the file was written, when a destination was given.
    pub destination: Option<PathBuf>,
}

impl Client {
    /// Resolve a file's download URL and, with `destination`, save it there.
    ///
    /// `destination` is a directory; the file keeps the last segment of its
    /// server-side path as its name.
    pub async fn get_file(
        &self,
        file_id: &str,
        destination: Option<&Path>,
    ) -> Result<FileDownload, BotError> {
        let mut params = Params::new();
        params.insert("file_id".into(), file_id.into());
        let file: File = self.request("getFile", params).await?;

        let file_path = file.file_path.clone().ok_or_else(|| BotError::RemoteRejection {
            error_code: None,
            description: format!("getFile returned no file_path for {file_id}"),
            response: serde_json::Value::Null,
        })?;
        let url = self.inner.config.file_url(&file_path);

        let destination = match destination {
            Some(dir) => Some(self.download_file(&file_path, dir).await?),
            None => None,
        };

        Ok(FileDownload {
            file,
            url,
            destination,
        })
    }

    /// Stream `file_path` (from `getFile`) into directory `dir`.
    pub async fn download_file(&self, file_path: &str, dir: &Path) -> Result<PathBuf, BotError> {
        let name = Path::new(file_path)
            .file_name()
            .ok_or_else(|| BotError::Decode(format!("file_path '{file_path}' has no file name")))?;
        let target = dir.join(name);

        let transport = &self.inner.transport;
        let bytes = self
            .with_retry(|| transport.download(file_path, &target))
            .await?;
        debug!(bytes, path = %target.display(), "saved file");
        Ok(target)
    }
}
