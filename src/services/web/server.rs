// 内嵌 Web 服务
//
// 监听 0.0.0.0:<port>，用 HTTP/1.1 托管本地 Web 应用，直到收到取消信号；
// 之后停止接受新连接，并在宽限期内等待已有连接结束。

use anyhow::{Context, Result};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use super::static_site::StaticSite;
use crate::models::AppConfig;

/// 接受连接失败后的退避时间
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// 绑定端口并运行服务器
pub async fn run_server(
    config: Arc<AppConfig>,
    site: Arc<StaticSite>,
    shutdown: CancellationToken,
    grace: Duration,
) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("绑定端口 {} 失败", config.port))?;

    tracing::info!(%addr, web_root = ?site.root(), "Web 服务已启动");
    serve(listener, site, shutdown, grace).await
}

/// 在已绑定的监听器上提供服务
pub async fn serve(
    listener: TcpListener,
    site: Arc<StaticSite>,
    shutdown: CancellationToken,
    grace: Duration,
) -> Result<()> {
    let graceful = GracefulShutdown::new();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        let io = TokioIo::new(stream);
                        let site = Arc::clone(&site);
                        let service = service_fn(move |req| {
                            let site = Arc::clone(&site);
                            async move { Ok::<_, Infallible>(site.respond(req).await) }
                        });

                        let connection =
                            graceful.watch(http1::Builder::new().serve_connection(io, service));
                        tokio::spawn(async move {
                            if let Err(err) = connection.await {
                                tracing::debug!(%peer, error = ?err, "处理连接失败");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = ?e, "接受连接失败");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                }
            }
        }
    }

    drop(listener);
    tracing::info!("Web 服务停止接受新连接");

    if tokio::time::timeout(grace, graceful.shutdown()).await.is_err() {
        tracing::warn!(grace_ms = grace.as_millis() as u64, "等待连接关闭超时");
    } else {
        tracing::debug!("所有连接已关闭");
    }
    Ok(())
}
