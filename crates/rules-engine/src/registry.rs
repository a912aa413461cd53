//! 规则注册表
//!
//! 以稳定的字符串标识索引规则实例，配置中的规则名通过这里解析。
//! 所有规则通过 Arc 包装共享，支持跨线程安全访问。

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::rule::Rule;
use crate::rules::{EscalateRule, ForwardRule};

/// 规则注册表
pub struct RuleRegistry {
    rules: HashMap<String, Arc<dyn Rule>>,
}

impl RuleRegistry {
    /// 创建空的注册表
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// 注册规则，已存在的同名规则会被替换
    pub fn register(&mut self, name: impl Into<String>, rule: Arc<dyn Rule>) -> &mut Self {
        let name = name.into();
        debug!(rule = %name, description = rule.description(), "注册规则");
        self.rules.insert(name, rule);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Rule>> {
        self.rules.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// 已注册的规则名（排序后返回）
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.rules.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 创建包含内置规则的注册表
    ///
    /// - `Forward`: ForwardRule
    /// - `Escalate`: EscalateRule
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry
            .register(ForwardRule::NAME, Arc::new(ForwardRule))
            .register(EscalateRule::NAME, Arc::new(EscalateRule));

        info!(
            rule_count = registry.len(),
            rules = ?registry.names(),
            "内置规则注册完成"
        );

        registry
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RuleContext, RuleResult};
    use crate::rule::MockRule;

    #[test]
    fn test_registry_new() {
        let registry = RuleRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get("Forward").is_none());
    }

    #[test]
    fn test_registry_with_defaults() {
        let registry = RuleRegistry::with_defaults();

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("Forward"));
        assert!(registry.contains("Escalate"));
        assert_eq!(registry.names(), vec!["Escalate", "Forward"]);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let registry = RuleRegistry::with_defaults();
        assert!(!registry.contains("forward"));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = RuleRegistry::with_defaults();

        let mut mock = MockRule::new();
        mock.expect_description().return_const("mock");
        mock.expect_execute()
            .returning(|ctx| Ok(RuleResult::new(ctx, "replaced")));

        registry.register("Forward", Arc::new(mock));
        assert_eq!(registry.len(), 2);

        let rule = registry.get("Forward").unwrap();
        let result = tokio_test::block_on(rule.execute(Arc::new(RuleContext::new("Account"))))
            .unwrap();
        assert_eq!(result.status, "replaced");
    }
}
