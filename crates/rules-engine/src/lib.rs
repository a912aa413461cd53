//! 业务规则分发引擎
//!
//! 根据请求上下文（来源、类型、动态参数）选择一组规则并并发执行：
//! - 条件表达式编译（`Source-Error == Order-QuantityError`）
//! - 规则索引构建，配置错误启动即失败
//! - 优先标记仲裁与 Tokio 并发扇出
//! - 配置热更新时整体替换索引

pub mod builder;
pub mod compiler;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod http;
pub mod index;
pub mod models;
pub mod operators;
pub mod registry;
pub mod reload;
pub mod rule;
pub mod rules;

pub use builder::RulesBuilder;
pub use compiler::{Criteria, Field, Term, compile};
pub use error::{Result, RuleError};
pub use evaluator::PredicateEvaluator;
pub use executor::{Dispatch, PendingRule, Resolution, RulesExecutor};
pub use index::{BoundRule, IndexEntry, RuleIndex, RuleIndexStats};
pub use models::{RuleContext, RuleResult};
pub use operators::Operator;
pub use registry::RuleRegistry;
pub use reload::{rebuild_index, spawn_index_reloader};
pub use rule::Rule;
pub use rules::{EscalateRule, ForwardRule};
