use super::body::BoxBody;
use super::responses;
use hyper::{Method, Request, Response, StatusCode};
use std::path::{Path, PathBuf};

pub const HEALTH_PATH: &str = "/api/health";
pub const INDEX_FILE: &str = "index.html";

/// 路径解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// 存在的文件
    File(PathBuf),
    /// 路径中包含 `..` 等越界片段
    Forbidden,
    NotFound,
}

/// 本地 Web 应用：托管 web 目录下的静态资源
#[derive(Debug, Clone)]
pub struct StaticSite {
    root: PathBuf,
}

impl StaticSite {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn respond<B>(&self, req: Request<B>) -> Response<BoxBody> {
        self.handle(req.method(), req.uri().path()).await
    }

    pub async fn handle(&self, method: &Method, path: &str) -> Response<BoxBody> {
        let head_only = match *method {
            Method::GET => false,
            Method::HEAD => true,
            _ => return responses::method_not_allowed(),
        };

        if path == HEALTH_PATH {
            return responses::json(
                StatusCode::OK,
                &serde_json::json!({ "status": "ok" }),
                head_only,
            );
        }

        let decoded = match urlencoding::decode(path) {
            Ok(decoded) => decoded,
            Err(e) => return responses::bad_request(&e.to_string()),
        };

        match self.resolve(&decoded) {
            Resolved::File(file) => match tokio::fs::read(&file).await {
                Ok(data) => responses::file(content_type(&file), data, head_only),
                Err(e) => {
                    tracing::error!(path = ?file, error = ?e, "读取静态文件失败");
                    responses::internal_error(&e.to_string())
                }
            },
            Resolved::Forbidden => {
                tracing::debug!(path = %decoded, "拒绝越界路径");
                responses::forbidden()
            }
            Resolved::NotFound => responses::not_found(),
        }
    }

    /// 把 URL 路径映射到 web 目录下的文件
    ///
    /// `/` 和目录映射到 `index.html`；没有扩展名且不存在的路径回退到根 `index.html`。
    pub fn resolve(&self, path: &str) -> Resolved {
        let mut relative = PathBuf::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return Resolved::Forbidden,
                s if s.contains(['\\', ':', '\0']) => return Resolved::Forbidden,
                s => relative.push(s),
            }
        }

        let mut candidate = self.root.join(&relative);
        if candidate.is_dir() {
            candidate.push(INDEX_FILE);
        }
        if candidate.is_file() {
            return Resolved::File(candidate);
        }

        if relative.extension().is_none() {
            let index = self.root.join(INDEX_FILE);
            if index.is_file() {
                return Resolved::File(index);
            }
        }
        Resolved::NotFound
    }
}

pub fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("json" | "map") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::header::{ALLOW, CONTENT_LENGTH, CONTENT_TYPE};
    use std::fs;
    use tempfile::TempDir;

    fn site() -> (TempDir, StaticSite) {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("index.html"), "<h1>Onekey</h1>").unwrap();
        fs::create_dir_all(temp_dir.path().join("assets")).unwrap();
        fs::write(temp_dir.path().join("assets/app.js"), "console.log(1)").unwrap();
        let site = StaticSite::new(temp_dir.path());
        (temp_dir, site)
    }

    async fn body_string(response: Response<BoxBody>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn root_serves_index() {
        let (_dir, site) = site();
        let response = site.handle(&Method::GET, "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        assert_eq!(body_string(response).await, "<h1>Onekey</h1>");
    }

    #[tokio::test]
    async fn assets_get_content_type() {
        let (_dir, site) = site();
        let response = site.handle(&Method::GET, "/assets/app.js").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "text/javascript; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn unknown_route_falls_back_to_index() {
        let (_dir, site) = site();
        let response = site.handle(&Method::GET, "/settings/profile").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "<h1>Onekey</h1>");
    }

    #[tokio::test]
    async fn missing_asset_is_not_found() {
        let (_dir, site) = site();
        let response = site.handle(&Method::GET, "/assets/missing.css").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn traversal_is_forbidden() {
        let (_dir, site) = site();
        for path in ["/../secret.txt", "/assets/%2e%2e/%2e%2e/etc/passwd", "/a%5c..%5cb"] {
            let response = site.handle(&Method::GET, path).await;
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{path}");
        }
    }

    #[tokio::test]
    async fn health_endpoint_reports_ok() {
        let (_dir, site) = site();
        let response = site.handle(&Method::GET, HEALTH_PATH).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, r#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn head_keeps_length_without_body() {
        let (_dir, site) = site();
        let response = site.handle(&Method::HEAD, "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_LENGTH], "15");
        assert!(body_string(response).await.is_empty());
    }

    #[tokio::test]
    async fn other_methods_are_rejected() {
        let (_dir, site) = site();
        let response = site.handle(&Method::POST, "/").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET, HEAD");
    }

    #[test]
    fn content_type_defaults_to_octet_stream() {
        assert_eq!(content_type(Path::new("a.PNG")), "image/png");
        assert_eq!(content_type(Path::new("archive.bin")), "application/octet-stream");
    }
}
