//! 通用响应构建
//!
//! 所有响应都由固定的状态码和头部构成，不会构建失败。

use bytes::Bytes;
use hyper::header::{HeaderValue, ALLOW, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Response, StatusCode};

use super::body::{empty, full, BoxBody};

fn with_body(
    status: StatusCode,
    content_type: &'static str,
    data: Bytes,
    head_only: bool,
) -> Response<BoxBody> {
    let length = data.len();
    let body = if head_only { empty() } else { full(data) };
    let mut response = Response::new(body);
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    response
}

/// 文件内容
pub fn file(content_type: &'static str, data: Vec<u8>, head_only: bool) -> Response<BoxBody> {
    with_body(StatusCode::OK, content_type, Bytes::from(data), head_only)
}

/// JSON 响应
pub fn json(status: StatusCode, value: &serde_json::Value, head_only: bool) -> Response<BoxBody> {
    with_body(
        status,
        "application/json",
        Bytes::from(value.to_string()),
        head_only,
    )
}

fn text(status: StatusCode, message: String) -> Response<BoxBody> {
    with_body(status, "text/plain; charset=utf-8", Bytes::from(message), false)
}

pub fn bad_request(message: &str) -> Response<BoxBody> {
    text(StatusCode::BAD_REQUEST, format!("请求无效: {message}"))
}

pub fn forbidden() -> Response<BoxBody> {
    text(StatusCode::FORBIDDEN, "禁止访问".to_string())
}

pub fn not_found() -> Response<BoxBody> {
    text(StatusCode::NOT_FOUND, "资源不存在".to_string())
}

/// 只允许 GET/HEAD
pub fn method_not_allowed() -> Response<BoxBody> {
    let mut response = text(StatusCode::METHOD_NOT_ALLOWED, "不支持的请求方法".to_string());
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static("GET, HEAD"));
    response
}

/// 内部错误
pub fn internal_error(message: &str) -> Response<BoxBody> {
    text(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("服务器错误: {message}"),
    )
}
