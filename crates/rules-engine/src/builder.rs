//! 规则索引构建器
//!
//! 按配置声明顺序编译每条条件表达式、解析规则名并生成不可变的 [`RuleIndex`]。
//! 任何一项配置错误都会使整次构建失败，不做重试。

use std::sync::Arc;

use dispatch_shared::config::{RuleConfiguration, RulesConfiguration};
use tracing::{debug, info, instrument, warn};

use crate::compiler::compile;
use crate::error::{Result, RuleError};
use crate::index::{BoundRule, IndexEntry, RuleIndex};
use crate::registry::RuleRegistry;

/// 规则索引构建器
pub struct RulesBuilder {
    configuration: RulesConfiguration,
    registry: Arc<RuleRegistry>,
}

impl RulesBuilder {
    pub fn new(configuration: RulesConfiguration, registry: Arc<RuleRegistry>) -> Self {
        Self {
            configuration,
            registry,
        }
    }

    pub fn configuration(&self) -> &RulesConfiguration {
        &self.configuration
    }

    pub fn registry(&self) -> &Arc<RuleRegistry> {
        &self.registry
    }

    /// 构建规则索引
    #[instrument(skip(self), fields(entries = self.configuration.len()))]
    pub fn build(&self) -> Result<RuleIndex> {
        if self.configuration.is_empty() {
            warn!("规则配置为空，所有分发请求都将无匹配");
        }

        let entries = self
            .configuration
            .configurations
            .iter()
            .enumerate()
            .map(|(position, config)| self.build_entry(position, config))
            .collect::<Result<Vec<_>>>()?;

        let index = RuleIndex::new(entries);
        let stats = index.stats();
        info!(
            entry_count = stats.entry_count,
            priority_count = stats.priority_count,
            rule_bindings = stats.rule_bindings,
            "规则索引构建完成"
        );

        Ok(index)
    }

    fn build_entry(&self, position: usize, config: &RuleConfiguration) -> Result<IndexEntry> {
        let criteria = compile(&config.criteria).inspect_err(|e| {
            warn!(entry = position, error = %e, "条件表达式编译失败");
        })?;

        if config.rules.is_empty() {
            return Err(RuleError::EmptyRuleList {
                entry: position,
                criteria: config.criteria.clone(),
            });
        }

        let rules = config
            .rules
            .iter()
            .map(|name| {
                self.registry
                    .get(name)
                    .map(|rule| BoundRule {
                        name: name.clone(),
                        rule,
                    })
                    .ok_or_else(|| RuleError::UnknownRule {
                        entry: position,
                        criteria: config.criteria.clone(),
                        rule: name.clone(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            entry = position,
            criteria = %criteria,
            priority = config.priority,
            rules = ?config.rules,
            "索引项已构建"
        );

        Ok(IndexEntry {
            criteria,
            priority: config.priority,
            rules,
        })
    }
}
