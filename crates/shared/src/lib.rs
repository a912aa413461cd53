//! 共享库
//!
//! 包含服务共用的配置加载、配置热更新与可观测性基础设施代码。

pub mod config;
pub mod config_watcher;
pub mod observability;
