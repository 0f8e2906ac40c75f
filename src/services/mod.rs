// 服务层模块
//
// - web: 内嵌 Web 服务（静态站点 + HTTP/1.1 服务器）

pub mod web;

pub use web::{run_server, serve, StaticSite};
