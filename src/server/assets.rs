//! Static files for the bundled single-page UI
//!
//! Paths that match no file fall back to `index.html` so client-side routes
//! survive a reload.

use std::path::{Path, PathBuf};

use hyper::body::Bytes;
use hyper::StatusCode;
use tracing::trace;

use crate::Result;

use super::response::{self, HttpResponse};

const INDEX: &str = "index.html";

/// Serve `request_path` from `ui_dir`
///
/// # Errors
///
/// Returns error if a file exists but cannot be read
pub async fn serve(ui_dir: Option<&Path>, request_path: &str) -> Result<HttpResponse> {
    let Some(root) = ui_dir else {
        return Ok(not_found());
    };

    let Some(relative) = resolve(request_path) else {
        return Ok(not_found());
    };

    let mut candidate = root.join(&relative);
    if is_dir(&candidate).await {
        candidate.push(INDEX);
    }

    match read(&candidate).await? {
        Some(response) => Ok(response),
        None => {
            trace!("No asset for {}, serving {}", request_path, INDEX);
            Ok(read(&root.join(INDEX)).await?.unwrap_or_else(not_found))
        }
    }
}

/// Turn a URL path into a relative file path, rejecting traversal
#[must_use]
pub fn resolve(request_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(request_path).ok()?;
    let mut relative = PathBuf::new();

    for segment in decoded.split('/').filter(|s| !s.is_empty()) {
        if segment == ".."
            || segment.starts_with('.')
            || segment.contains('\\')
            || segment.contains('\0')
        {
            return None;
        }
        relative.push(segment);
    }

    Some(relative)
}

/// Content type for a file, by extension
#[must_use]
pub fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html" | "htm") => "text/html; charset=UTF-8",
        Some("js" | "mjs") => "text/javascript; charset=UTF-8",
        Some("css") => "text/css; charset=UTF-8",
        Some("json" | "map") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("txt") => "text/plain; charset=UTF-8",
        _ => "application/octet-stream",
    }
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

async fn read(path: &Path) -> Result<Option<HttpResponse>> {
    let is_file = tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !is_file {
        return Ok(None);
    }

    let data = tokio::fs::read(path).await?;
    Ok(Some(response::with_body(
        StatusCode::OK,
        content_type(path),
        Bytes::from(data),
    )))
}

fn not_found() -> HttpResponse {
    response::text(StatusCode::NOT_FOUND, "Not Found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::header::CONTENT_TYPE;
    use tempfile::TempDir;

    fn ui_fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(INDEX), "<html>app</html>").unwrap();
        std::fs::create_dir(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/app.js"), "console.log(1)").unwrap();
        dir
    }

    async fn body_string(response: HttpResponse) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_no_ui_configured() {
        let response = serve(None, "/").await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serves_index_for_root() {
        let dir = ui_fixture();
        let response = serve(Some(dir.path()), "/").await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/html; charset=UTF-8");
        assert_eq!(body_string(response).await, "<html>app</html>");
    }

    #[tokio::test]
    async fn test_serves_asset() {
        let dir = ui_fixture();
        let response = serve(Some(dir.path()), "/assets/app.js").await.unwrap();

        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "text/javascript; charset=UTF-8"
        );
        assert_eq!(body_string(response).await, "console.log(1)");
    }

    #[tokio::test]
    async fn test_unknown_path_falls_back_to_index() {
        let dir = ui_fixture();
        let response = serve(Some(dir.path()), "/buckets/mine").await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "<html>app</html>");
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let dir = ui_fixture();
        let response = serve(Some(dir.path()), "/assets/%2e%2e/%2e%2e/etc/passwd")
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_resolve() {
        assert_eq!(resolve("/"), Some(PathBuf::new()));
        assert_eq!(resolve("/a//b.css"), Some(PathBuf::from("a/b.css")));
        assert_eq!(resolve("/../secret"), None);
        assert_eq!(resolve("/.env"), None);
    }
}
