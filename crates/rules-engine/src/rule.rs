//! 规则 Trait 定义
//!
//! 规则是分发的叶子行为：给定上下文，异步产生一个结果。
//! 通过字符串标识注册到 [`RuleRegistry`](crate::registry::RuleRegistry)，
//! 配置只通过该标识引用规则。
//!
//! # 示例
//!
//! ```ignore
//! struct AuditRule;
//!
//! #[async_trait]
//! impl Rule for AuditRule {
//!     async fn execute(&self, context: Arc<RuleContext>) -> Result<RuleResult> {
//!         let status = format!("{} Audited", context.source);
//!         Ok(RuleResult::new(context, status))
//!     }
//! }
//! ```

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::models::{RuleContext, RuleResult};

/// 规则 Trait
///
/// 实例以 `Arc` 在请求间共享；若持有内部状态，需自行保证并发安全。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Rule: Send + Sync {
    /// 执行规则
    async fn execute(&self, context: Arc<RuleContext>) -> Result<RuleResult>;

    /// 规则描述，用于日志与索引查看
    fn description(&self) -> &'static str {
        ""
    }
}
