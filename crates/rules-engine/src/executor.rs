//! 规则分发执行器
//!
//! 持有构建好的规则索引（`ArcSwap`，读无锁、整体替换），对每个请求：
//! 1. 对所有条件求值并按优先标记选出一组规则；
//! 2. 在 Tokio 运行时上并发启动这组规则，立即返回每条规则各自的待完成句柄。
//!
//! 执行器不等待规则完成；调用方决定全部等待、只取部分或直接丢弃（丢弃后规则继续执行）。
//! 单条规则失败、panic 或被取消都只影响它自己的结果。

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use arc_swap::ArcSwap;
use dispatch_shared::observability::metrics;
use tokio::task::JoinHandle;
use tracing::{Instrument, Span, debug, info, info_span, instrument, warn};

use crate::builder::RulesBuilder;
use crate::error::{Result, RuleError};
use crate::index::{BoundRule, RuleIndex};
use crate::models::{RuleContext, RuleResult};

/// 一次解析的结果：命中的条件及其规则列表
#[derive(Debug, Clone)]
pub struct Resolution {
    pub criteria: String,
    pub priority: bool,
    pub rules: Vec<BoundRule>,
}

impl Resolution {
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }
}

/// 单条规则的进行中执行
///
/// 作为 Future 等待时返回该规则的结果；被 abort 时返回 `RuleCancelled`，
/// panic 时返回 `RulePanicked`。drop 不会取消执行。
#[derive(Debug)]
pub struct PendingRule {
    rule: String,
    handle: JoinHandle<Result<RuleResult>>,
}

impl PendingRule {
    pub fn rule_name(&self) -> &str {
        &self.rule
    }

    /// 取消该规则的执行
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Future for PendingRule {
    type Output = Result<RuleResult>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let polled = Pin::new(&mut self.handle).poll(cx);
        match polled {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(e)) if e.is_cancelled() => Poll::Ready(Err(RuleError::RuleCancelled {
                rule: self.rule.clone(),
            })),
            Poll::Ready(Err(_)) => Poll::Ready(Err(RuleError::RulePanicked {
                rule: self.rule.clone(),
            })),
        }
    }
}

/// 一次分发启动的所有规则执行（保持配置顺序）
#[derive(Debug)]
pub struct Dispatch {
    criteria: String,
    pending: Vec<PendingRule>,
}

impl Dispatch {
    /// 命中的条件表达式
    pub fn criteria(&self) -> &str {
        &self.criteria
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.pending.iter().map(PendingRule::rule_name).collect()
    }

    pub fn pending(&self) -> &[PendingRule] {
        &self.pending
    }

    /// 等待全部规则完成，按配置顺序返回 (规则名, 结果)
    pub async fn join_all(self) -> Vec<(String, Result<RuleResult>)> {
        futures::future::join_all(self.pending.into_iter().map(|pending| async move {
            let name = pending.rule.clone();
            (name, pending.await)
        }))
        .await
    }
}

impl IntoIterator for Dispatch {
    type Item = PendingRule;
    type IntoIter = std::vec::IntoIter<PendingRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.pending.into_iter()
    }
}

/// 规则分发执行器
#[derive(Clone)]
pub struct RulesExecutor {
    index: Arc<ArcSwap<RuleIndex>>,
}

impl RulesExecutor {
    pub fn new(index: RuleIndex) -> Self {
        Self {
            index: Arc::new(ArcSwap::from_pointee(index)),
        }
    }

    /// 构建索引并创建执行器，配置错误直接返回
    pub fn from_builder(builder: &RulesBuilder) -> Result<Self> {
        Ok(Self::new(builder.build()?))
    }

    /// 当前索引快照
    pub fn index(&self) -> Arc<RuleIndex> {
        self.index.load_full()
    }

    /// 原子替换索引，返回旧索引
    ///
    /// 已经加载旧快照的请求继续使用旧索引完成。
    pub fn swap_index(&self, index: RuleIndex) -> Arc<RuleIndex> {
        let entry_count = index.len();
        let previous = self.index.swap(Arc::new(index));
        info!(
            previous_entries = previous.len(),
            entry_count, "规则索引已替换"
        );
        previous
    }

    /// 解析上下文应执行的规则
    pub fn resolve(&self, context: &RuleContext) -> Result<Resolution> {
        let index = self.index.load();

        match index.resolve(context) {
            Ok(entry) => {
                debug!(
                    source = %context.source,
                    context_type = %context.context_type,
                    criteria = %entry.criteria,
                    priority = entry.priority,
                    "命中规则配置"
                );
                metrics::record_dispatch(&context.source, "matched");
                Ok(Resolution {
                    criteria: entry.criteria.to_string(),
                    priority: entry.priority,
                    rules: entry.rules.clone(),
                })
            }
            Err(e) => {
                warn!(
                    source = %context.source,
                    context_type = %context.context_type,
                    "没有可执行的规则"
                );
                metrics::record_dispatch(&context.source, "no_match");
                Err(e)
            }
        }
    }

    /// 解析并并发启动规则，不等待完成
    ///
    /// 必须在 Tokio 运行时内调用，否则返回 `RuntimeUnavailable`。
    #[instrument(skip_all, fields(source = tracing::field::Empty))]
    pub fn execute(&self, context: impl Into<Arc<RuleContext>>) -> Result<Dispatch> {
        let context: Arc<RuleContext> = context.into();
        Span::current().record("source", context.source.as_str());

        // 先确认运行时，避免无法启动的请求被计入分发指标
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| RuleError::RuntimeUnavailable)?;

        let resolution = self.resolve(&context)?;

        let pending = resolution
            .rules
            .into_iter()
            .map(|bound| {
                let name = bound.name.clone();
                let span = info_span!("rule_execution", rule = %name, source = %context.source);
                let task = run_rule(bound, context.clone()).instrument(span);
                PendingRule {
                    rule: name,
                    handle: runtime.spawn(task),
                }
            })
            .collect::<Vec<_>>();

        debug!(rules = pending.len(), "规则已启动");

        Ok(Dispatch {
            criteria: resolution.criteria,
            pending,
        })
    }
}

/// 执行单条规则并记录耗时
async fn run_rule(bound: BoundRule, context: Arc<RuleContext>) -> Result<RuleResult> {
    let start = Instant::now();
    let result = bound.rule.execute(context).await;
    let elapsed = start.elapsed().as_secs_f64();

    match &result {
        Ok(r) => {
            debug!(status = %r.status, "规则执行完成");
            metrics::record_rule_execution(&bound.name, "success", elapsed);
        }
        Err(e) => {
            warn!(error = %e, "规则执行失败");
            metrics::record_rule_execution(&bound.name, "failure", elapsed);
        }
    }

    result
}
