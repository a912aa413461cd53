//! 配置热更新模块
//!
//! 提供 `ConfigWatcher` trait 和基于文件系统事件的实现，支持运行时动态更新配置。
//!
//! 服务通过 `DynamicConfig` 持有 `Arc<ArcSwap<AppConfig>>`，
//! 读取几乎无开销（一次原子 load），写入通过 watcher 回调自动触发；
//! 消费方（如规则索引重建任务）通过 `subscribe()` 异步等待变更。

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use async_trait::async_trait;
use notify::RecommendedWatcher;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::{AppConfig, config_dir, default_environment};

/// 配置监听器抽象
#[async_trait]
pub trait ConfigWatcher: Send + Sync {
    /// 启动监听，配置变更时推送到 DynamicConfig
    async fn start(&self) -> Result<()>;

    /// 停止监听并释放资源
    async fn stop(&self) -> Result<()>;
}

/// 动态配置容器
///
/// 使用 `ArcSwap` 实现近零开销的读取（仅一次原子 load），
/// 配合 `watch` channel 让消费方异步等待配置变更通知。
#[derive(Clone)]
pub struct DynamicConfig {
    current: Arc<ArcSwap<AppConfig>>,
    tx: watch::Sender<Arc<AppConfig>>,
    rx: watch::Receiver<Arc<AppConfig>>,
}

impl DynamicConfig {
    pub fn new(config: AppConfig) -> Self {
        let config = Arc::new(config);
        let (tx, rx) = watch::channel(config.clone());
        Self {
            current: Arc::new(ArcSwap::from(config)),
            tx,
            rx,
        }
    }

    /// 获取当前配置快照
    pub fn load(&self) -> Arc<AppConfig> {
        self.current.load_full()
    }

    /// 获取 watch receiver，用于异步等待配置变更
    pub fn subscribe(&self) -> watch::Receiver<Arc<AppConfig>> {
        self.rx.clone()
    }

    /// 更新配置
    ///
    /// 先更新 ArcSwap 快照再通知订阅方，订阅方收到通知时 load() 已是新值。
    pub fn update(&self, new_config: AppConfig) {
        let new_config = Arc::new(new_config);
        self.current.store(new_config.clone());
        // 没有 receiver 时 send 失败（服务关闭阶段）
        let _ = self.tx.send(new_config);
    }
}

/// 基于文件系统事件的配置监听器
///
/// 使用 `notify` 监听配置目录，事件经 debounce 窗口去抖后从同一目录重新加载并推送。
/// 重新加载失败时保留当前配置。
pub struct FileConfigWatcher {
    service_name: String,
    environment: String,
    watch_path: PathBuf,
    debounce: Duration,
    dynamic_config: DynamicConfig,
    /// 底层 watcher，drop 即停止监听
    watcher: Mutex<Option<RecommendedWatcher>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl FileConfigWatcher {
    pub fn new(
        service_name: &str,
        watch_path: impl AsRef<Path>,
        debounce: Duration,
        dynamic_config: DynamicConfig,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        // 沿用当前配置的环境，重新加载时读取同一组 {environment}.toml
        let environment = match dynamic_config.load().environment.as_str() {
            "" => default_environment(),
            env => env.to_string(),
        };
        Self {
            service_name: service_name.to_string(),
            environment,
            watch_path: watch_path.as_ref().to_path_buf(),
            debounce,
            dynamic_config,
            watcher: Mutex::new(None),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// 从 AppConfig 的 config_center 配置节构建，监听 CONFIG_DIR
    pub fn from_config(service_name: &str, config: &AppConfig, dynamic_config: DynamicConfig) -> Self {
        let debounce = Duration::from_millis(config.config_center.debounce_ms);
        Self::new(service_name, config_dir(), debounce, dynamic_config)
    }

    pub fn watch_path(&self) -> &Path {
        &self.watch_path
    }
}

#[async_trait]
impl ConfigWatcher for FileConfigWatcher {
    async fn start(&self) -> Result<()> {
        use notify::{EventKind, RecursiveMode, Watcher};

        // notify 回调运行在自己的线程上，通过 channel 转发到异步任务
        let (event_tx, mut event_rx) = tokio::sync::mpsc::channel::<()>(16);

        let mut watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| match res {
                Ok(event) => match event.kind {
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_) => {
                        let _ = event_tx.try_send(());
                    }
                    _ => {}
                },
                Err(e) => {
                    warn!(error = %e, "文件监听器事件错误");
                }
            })
            .context("创建文件监听器失败")?;

        watcher
            .watch(&self.watch_path, RecursiveMode::NonRecursive)
            .with_context(|| format!("启动文件监听失败: {}", self.watch_path.display()))?;

        *self.watcher.lock() = Some(watcher);
        info!(path = %self.watch_path.display(), "配置文件监听已启动");

        let debounce = self.debounce;
        let service_name = self.service_name.clone();
        let environment = self.environment.clone();
        let watch_path = self.watch_path.clone();
        let dynamic_config = self.dynamic_config.clone();
        let mut shutdown_rx = self.shutdown_rx.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(()) = event_rx.recv() => {
                        tokio::time::sleep(debounce).await;
                        // 丢弃窗口内积压的重复事件
                        while event_rx.try_recv().is_ok() {}

                        match AppConfig::load_from(&watch_path, &service_name, &environment) {
                            Ok(new_config) => {
                                info!(service = %service_name, "配置文件变更，已重新加载");
                                dynamic_config.update(new_config);
                            }
                            Err(e) => {
                                error!(
                                    service = %service_name,
                                    error = %e,
                                    "配置文件重新加载失败，保留当前配置"
                                );
                            }
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            info!("配置文件监听已停止");
                            break;
                        }
                    }
                }
            }
        });

        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.watcher.lock().take();
        let _ = self.shutdown_tx.send(true);
        Ok(())
    }
}
