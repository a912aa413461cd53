//! 规则分发服务
//!
//! 启动时构建规则索引（配置错误直接退出），提供 HTTP 分发接口；
//! 开启 config_center 时监听配置目录并热更新索引。

use std::sync::Arc;

use anyhow::{Context, Result};
use dispatch_shared::config::AppConfig;
use dispatch_shared::config_watcher::{ConfigWatcher, DynamicConfig, FileConfigWatcher};
use dispatch_shared::observability;
use rules_engine::http::{AppState, router};
use rules_engine::{RuleRegistry, RulesBuilder, RulesExecutor, spawn_index_reloader};
use tokio::net::TcpListener;
use tracing::{info, warn};

const SERVICE_NAME: &str = "rules-engine";

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load(SERVICE_NAME).context("加载配置失败")?;

    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config).await?;

    info!(
        environment = %config.environment,
        entries = config.rules.len(),
        "Starting rules-engine service..."
    );

    let registry = Arc::new(RuleRegistry::with_defaults());

    // 配置错误在接收请求之前暴露
    let builder = RulesBuilder::new(config.rules.clone(), registry.clone());
    let executor = RulesExecutor::from_builder(&builder).context("规则索引构建失败")?;

    let watcher = if config.config_center.enabled {
        let dynamic_config = DynamicConfig::new(config.clone());
        let watcher = FileConfigWatcher::from_config(SERVICE_NAME, &config, dynamic_config.clone());

        match watcher.start().await {
            Ok(()) => {
                spawn_index_reloader(executor.clone(), registry.clone(), dynamic_config.subscribe());
                info!(path = %watcher.watch_path().display(), "规则配置热更新已启用");
                Some(watcher)
            }
            Err(e) => {
                warn!(error = %e, "配置监听启动失败，热更新不可用");
                None
            }
        }
    } else {
        None
    };

    let app = router(AppState::new(executor));

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(watcher) = watcher {
        watcher.stop().await?;
    }

    info!("Service shutdown complete");
    Ok(())
}

/// 监听关闭信号（SIGTERM 或 Ctrl+C）
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "注册 Ctrl+C 处理器失败");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "注册 SIGTERM 处理器失败");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
