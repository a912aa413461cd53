//! 规则索引热更新
//!
//! 订阅 `DynamicConfig` 的变更通知，用新的规则配置完整构建一个索引后再原子替换。
//! 构建失败时保留当前索引继续服务。

use std::sync::Arc;

use dispatch_shared::config::AppConfig;
use dispatch_shared::observability::metrics;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::builder::RulesBuilder;
use crate::error::{Result, RuleError};
use crate::executor::RulesExecutor;
use crate::registry::RuleRegistry;

/// 用给定配置重建索引并替换，失败时不改动当前索引
///
/// 当前索引非空而新配置没有任何规则时视为失败（配置文件被删除或替换中途），
/// 不会用空索引覆盖。
pub fn rebuild_index(
    executor: &RulesExecutor,
    registry: &Arc<RuleRegistry>,
    config: &AppConfig,
) -> Result<()> {
    let live_entries = executor.index().len();
    let built = if config.rules.is_empty() && live_entries > 0 {
        Err(RuleError::EmptyReload { live_entries })
    } else {
        RulesBuilder::new(config.rules.clone(), registry.clone()).build()
    };

    match built {
        Ok(index) => {
            executor.swap_index(index);
            metrics::record_index_reload("success");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, code = e.code(), "规则配置无效，保留当前索引");
            metrics::record_index_reload("failure");
            Err(e)
        }
    }
}

/// 启动索引重建任务
///
/// 配置没有变化（规则部分相同）时跳过重建；发送端关闭后任务退出。
pub fn spawn_index_reloader(
    executor: RulesExecutor,
    registry: Arc<RuleRegistry>,
    mut rx: watch::Receiver<Arc<AppConfig>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut current_rules = rx.borrow_and_update().rules.clone();

        while rx.changed().await.is_ok() {
            let config = rx.borrow_and_update().clone();

            if config.rules == current_rules {
                info!("规则配置未变化，跳过索引重建");
                continue;
            }

            if rebuild_index(&executor, &registry, &config).is_ok() {
                current_rules = config.rules.clone();
                info!(entries = current_rules.len(), "规则索引已根据新配置重建");
            }
        }

        info!("配置通知通道已关闭，索引重建任务退出");
    })
}
