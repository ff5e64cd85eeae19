//! Resolve request paths to open files beneath the root.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mime_guess::Mime;
use tokio::fs::{self, File};

use super::{guess_content_type, FileSource, NotFound};

const INDEX_FILE: &str = "index.html";

/// A file ready to be streamed.
#[derive(Debug)]
pub struct ResolvedFile {
    /// Path that was opened.
    pub path: PathBuf,
    /// Content type to answer with.
    pub content_type: Mime,
    /// Open handle positioned at the start.
    pub file: File,
}

/// Looks files up beneath a root directory.
#[derive(Debug, Clone)]
pub struct FileResolver {
    root: Arc<Path>,
}

impl FileResolver {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: Arc::from(root.as_ref()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `request` beneath `root/base`.
    ///
    /// Directories resolve to their `index.html`, served as `text/html`.
    pub async fn resolve(&self, base: &str, request: &str) -> Result<ResolvedFile, NotFound> {
        let path = self.root.join(base).join(request);
        let metadata = fs::metadata(&path)
            .await
            .map_err(|err| NotFound::from_io(request, &err))?;

        if metadata.is_file() {
            let content_type = guess_content_type(&path);
            return open(path, content_type, request).await;
        }

        if metadata.is_dir() {
            let index = path.join(INDEX_FILE);
            let metadata = fs::metadata(&index)
                .await
                .map_err(|err| NotFound::from_io(request, &err))?;
            if metadata.is_file() {
                return open(index, mime_guess::mime::TEXT_HTML, request).await;
            }
        }

        Err(NotFound::new(request, "Not Found"))
    }
}

async fn open(path: PathBuf, content_type: Mime, request: &str) -> Result<ResolvedFile, NotFound> {
    let file = File::open(&path)
        .await
        .map_err(|err| NotFound::from_io(request, &err))?;
    tracing::trace!(path = %path.display(), content_type = %content_type, "Resolved file");
    Ok(ResolvedFile {
        path,
        content_type,
        file,
    })
}

impl FileSource for FileResolver {
    type File = ResolvedFile;

    fn open(
        &self,
        base: &str,
        request: &str,
    ) -> impl std::future::Future<Output = Result<ResolvedFile, NotFound>> + Send {
        self.resolve(base, request)
    }
}
