//! 规则引擎领域模型

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// 分发上下文 - 一次请求中用于选择规则的事实
///
/// `source` 与 `context_type` 为一等属性，其余信息放在 `parameters` 中。
/// 构造后只读，分发时以 `Arc` 共享给所有命中的规则。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleContext {
    pub source: String,
    #[serde(default)]
    pub context_type: String,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

impl RuleContext {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn with_context_type(mut self, context_type: impl Into<String>) -> Self {
        self.context_type = context_type.into();
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// 获取动态参数，不存在时返回 None
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }
}

/// 规则执行结果
#[derive(Debug, Clone)]
pub struct RuleResult {
    /// 触发本次执行的上下文
    pub context: Arc<RuleContext>,
    pub status: String,
}

impl RuleResult {
    pub fn new(context: Arc<RuleContext>, status: impl Into<String>) -> Self {
        Self {
            context,
            status: status.into(),
        }
    }
}
