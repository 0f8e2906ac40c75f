//! 内嵌 Web 服务
//!
//! `StaticSite` 是本地 Web 应用的边界；`server` 负责监听、连接管理和优雅停机。

pub mod body;
pub mod responses;
pub mod server;
pub mod static_site;

pub use body::{box_body, BoxBody};
pub use server::{run_server, serve};
pub use static_site::StaticSite;
