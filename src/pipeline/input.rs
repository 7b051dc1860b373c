//! Input resolution and the per-request workspace.
//!
//! Every conversion request owns a [`RequestWorkspace`]: a uniquely named
//! temporary directory (`pdf2voice-XXXXXX`) that holds the uploaded or
//! downloaded PDF and the narrative hand-off file. The directory is removed
//! when the workspace is dropped, so cleanup happens on success, on error,
//! and on panic alike, and two simultaneous requests never share a path.

use crate::error::Pdf2VoiceError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Temporary directory scoped to one conversion request.
#[derive(Debug)]
pub struct RequestWorkspace {
    dir: TempDir,
}

impl RequestWorkspace {
    /// Create a fresh workspace under `root`, or under the system temp
    /// directory when `root` is `None`.
    pub fn create(root: Option<&Path>) -> Result<Self, Pdf2VoiceError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("pdf2voice-");
        let dir = match root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| Pdf2VoiceError::StagingFailed {
            path: root.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir),
            source: e,
        })?;
        debug!("Created request workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Directory backing this workspace.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write an uploaded document into the workspace.
    ///
    /// Only the final component of `name` is kept, so an upload called
    /// `../../etc/passwd` lands inside the workspace as `passwd`.
    pub async fn stage_upload(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, Pdf2VoiceError> {
        let path = self.path().join(sanitize_file_name(name));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| Pdf2VoiceError::StagingFailed {
                path: path.clone(),
                source: e,
            })?;
        debug!("Staged upload {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    /// Write a text file into the workspace.
    pub async fn write_text(&self, file_name: &str, text: &str) -> Result<PathBuf, Pdf2VoiceError> {
        let path = self.path().join(sanitize_file_name(file_name));
        tokio::fs::write(&path, text)
            .await
            .map_err(|e| Pdf2VoiceError::StagingFailed {
                path: path.clone(),
                source: e,
            })?;
        Ok(path)
    }

    /// Delete the workspace now, surfacing any removal error.
    pub fn close(self) -> Result<(), Pdf2VoiceError> {
        let path = self.path().to_path_buf();
        self.dir
            .close()
            .map_err(|e| Pdf2VoiceError::StagingFailed { path, source: e })
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a local PDF path.
///
/// URLs are downloaded into `workspace`; local paths are validated in place.
pub async fn resolve_input(
    input: &str,
    workspace: &RequestWorkspace,
    client: &reqwest::Client,
    timeout_secs: u64,
) -> Result<PathBuf, Pdf2VoiceError> {
    if input.trim().is_empty() {
        return Err(Pdf2VoiceError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, workspace, client, timeout_secs).await
    } else {
        let path = PathBuf::from(input);
        validate_document(&path).await?;
        debug!("Resolved local PDF: {}", path.display());
        Ok(path)
    }
}

/// Check that `path` exists, is readable, and is not empty.
///
/// Returns the file size in bytes.
pub async fn validate_document(path: &Path) -> Result<u64, Pdf2VoiceError> {
    let meta = match tokio::fs::metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2VoiceError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(Pdf2VoiceError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    };

    if !meta.is_file() {
        return Err(Pdf2VoiceError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    if meta.len() == 0 {
        return Err(Pdf2VoiceError::EmptyFile {
            path: path.to_path_buf(),
        });
    }
    Ok(meta.len())
}

/// Download a URL into the workspace and return the local path.
async fn download_url(
    url: &str,
    workspace: &RequestWorkspace,
    client: &reqwest::Client,
    timeout_secs: u64,
) -> Result<PathBuf, Pdf2VoiceError> {
    info!("Downloading PDF from: {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Pdf2VoiceError::from_reqwest("download", timeout_secs, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Pdf2VoiceError::HttpStatus {
            service: "download",
            status: status.as_u16(),
            body: status.canonical_reason().unwrap_or_default().to_string(),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Pdf2VoiceError::from_reqwest("download", timeout_secs, e))?;

    let path = workspace.stage_upload(&filename_from_url(url), &bytes).await?;
    validate_document(&path).await?;

    info!("Downloaded to: {}", path.display());
    Ok(path)
}

/// Extract a reasonable filename from the URL path.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

/// Keep only the final path component; fall back to `upload.pdf`.
fn sanitize_file_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty() && *n != "." && *n != "..")
        .map(str::to_string)
        .unwrap_or_else(|| "upload.pdf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("paper.pdf"), "paper.pdf");
        assert_eq!(sanitize_file_name(""), "upload.pdf");
        assert_eq!(sanitize_file_name(".."), "upload.pdf");
    }

    #[test]
    fn filename_from_url_path() {
        assert_eq!(
            filename_from_url("https://arxiv.org/pdf/2502.01143v2.pdf"),
            "2502.01143v2.pdf"
        );
        assert_eq!(filename_from_url("https://arxiv.org/pdf/"), "downloaded.pdf");
    }

    #[tokio::test]
    async fn workspace_is_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let path = {
            let ws = RequestWorkspace::create(Some(root.path())).unwrap();
            let staged = ws.stage_upload("doc.pdf", b"%PDF-1.4").await.unwrap();
            assert!(staged.exists());
            assert!(staged.starts_with(root.path()));
            ws.path().to_path_buf()
        };
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn workspaces_are_unique() {
        let root = tempfile::tempdir().unwrap();
        let a = RequestWorkspace::create(Some(root.path())).unwrap();
        let b = RequestWorkspace::create(Some(root.path())).unwrap();
        assert_ne!(a.path(), b.path());
        a.close().unwrap();
        b.close().unwrap();
    }

    #[tokio::test]
    async fn validate_rejects_missing_and_empty() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("nope.pdf");
        assert!(matches!(
            validate_document(&missing).await,
            Err(Pdf2VoiceError::FileNotFound { .. })
        ));

        let empty = dir.path().join("empty.pdf");
        std::fs::write(&empty, b"").unwrap();
        assert!(matches!(
            validate_document(&empty).await,
            Err(Pdf2VoiceError::EmptyFile { .. })
        ));

        let ok = dir.path().join("ok.pdf");
        std::fs::write(&ok, b"%PDF-1.7").unwrap();
        assert_eq!(validate_document(&ok).await.unwrap(), 8);
    }
}
