//! 规则索引
//!
//! 条件 → (优先标记, 规则列表) 的不可变映射，按配置声明顺序保存。
//! 构建完成后只读，请求间共享；热更新通过整体替换完成。

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::compiler::Criteria;
use crate::error::{Result, RuleError};
use crate::models::RuleContext;
use crate::rule::Rule;

/// 已解析的规则引用
#[derive(Clone)]
pub struct BoundRule {
    pub name: String,
    pub rule: Arc<dyn Rule>,
}

impl std::fmt::Debug for BoundRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundRule").field("name", &self.name).finish()
    }
}

/// 索引项
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub criteria: Criteria,
    pub priority: bool,
    pub rules: Vec<BoundRule>,
}

impl IndexEntry {
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }
}

/// 规则索引
#[derive(Debug, Clone)]
pub struct RuleIndex {
    entries: Vec<IndexEntry>,
    built_at: DateTime<Utc>,
}

impl RuleIndex {
    pub fn new(entries: Vec<IndexEntry>) -> Self {
        Self {
            entries,
            built_at: Utc::now(),
        }
    }

    /// 空索引：任何上下文都不会命中
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// 所有命中上下文的索引项（声明顺序）
    pub fn matches<'a, 'c>(
        &'a self,
        context: &'c RuleContext,
    ) -> impl Iterator<Item = &'a IndexEntry> + use<'a, 'c> {
        self.entries
            .iter()
            .filter(move |entry| entry.criteria.evaluate(context))
    }

    /// 选出要执行的索引项
    ///
    /// 第一个带优先标记的命中项胜出；都不带标记时取第一个命中项。
    pub fn resolve(&self, context: &RuleContext) -> Result<&IndexEntry> {
        let mut first_match = None;

        for entry in self.matches(context) {
            if entry.priority {
                return Ok(entry);
            }
            first_match.get_or_insert(entry);
        }

        first_match.ok_or_else(|| RuleError::NoApplicableRule {
            source_name: context.source.clone(),
            context_type: context.context_type.clone(),
        })
    }

    pub fn stats(&self) -> RuleIndexStats {
        RuleIndexStats {
            entry_count: self.entries.len(),
            priority_count: self.entries.iter().filter(|e| e.priority).count(),
            rule_bindings: self.entries.iter().map(|e| e.rules.len()).sum(),
            built_at: self.built_at,
        }
    }
}

impl Default for RuleIndex {
    fn default() -> Self {
        Self::empty()
    }
}

/// 规则索引统计信息
#[derive(Debug, Clone, Serialize)]
pub struct RuleIndexStats {
    pub entry_count: usize,
    pub priority_count: usize,
    /// 所有索引项引用的规则总数
    pub rule_bindings: usize,
    pub built_at: DateTime<Utc>,
}
