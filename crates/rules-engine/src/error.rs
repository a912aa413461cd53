//! 规则引擎错误类型

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    // ==================== 配置错误（启动期致命） ====================
    #[error("条件表达式无效 '{criteria}': {reason}")]
    InvalidCriteria { criteria: String, reason: String },

    #[error("条件表达式 '{criteria}' 使用了不支持的操作符: {operator}")]
    UnsupportedOperator { criteria: String, operator: String },

    #[error("条件表达式 '{criteria}' 字段数 {fields} 与取值数 {values} 不一致")]
    FieldValueMismatch {
        criteria: String,
        fields: usize,
        values: usize,
    },

    #[error("配置项 #{entry} ('{criteria}') 引用了未注册的规则: {rule}")]
    UnknownRule {
        entry: usize,
        criteria: String,
        rule: String,
    },

    #[error("配置项 #{entry} ('{criteria}') 未配置任何规则")]
    EmptyRuleList { entry: usize, criteria: String },

    #[error("新配置不含任何规则配置，拒绝替换当前 {live_entries} 条索引项")]
    EmptyReload { live_entries: usize },

    // ==================== 请求级错误 ====================
    #[error("没有可执行的规则: source={source_name}, context_type={context_type}")]
    NoApplicableRule {
        source_name: String,
        context_type: String,
    },

    #[error("当前线程没有可用的 Tokio 运行时")]
    RuntimeUnavailable,

    // ==================== 单条规则执行错误 ====================
    #[error("规则执行失败: {rule} - {message}")]
    ExecutionFailed { rule: String, message: String },

    #[error("规则执行被取消: {rule}")]
    RuleCancelled { rule: String },

    #[error("规则执行 panic: {rule}")]
    RulePanicked { rule: String },
}

pub type Result<T> = std::result::Result<T, RuleError>;

impl RuleError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCriteria { .. } => "INVALID_CRITERIA",
            Self::UnsupportedOperator { .. } => "UNSUPPORTED_OPERATOR",
            Self::FieldValueMismatch { .. } => "FIELD_VALUE_MISMATCH",
            Self::UnknownRule { .. } => "UNKNOWN_RULE",
            Self::EmptyRuleList { .. } => "EMPTY_RULE_LIST",
            Self::EmptyReload { .. } => "EMPTY_RELOAD",
            Self::NoApplicableRule { .. } => "NO_APPLICABLE_RULE",
            Self::RuntimeUnavailable => "RUNTIME_UNAVAILABLE",
            Self::ExecutionFailed { .. } => "RULE_EXECUTION_FAILED",
            Self::RuleCancelled { .. } => "RULE_CANCELLED",
            Self::RulePanicked { .. } => "RULE_PANICKED",
        }
    }

    /// 是否为配置错误（启动时出现应拒绝对外服务）
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCriteria { .. }
                | Self::UnsupportedOperator { .. }
                | Self::FieldValueMismatch { .. }
                | Self::UnknownRule { .. }
                | Self::EmptyRuleList { .. }
                | Self::EmptyReload { .. }
        )
    }

    /// 是否为"无匹配规则"
    pub fn is_no_match(&self) -> bool {
        matches!(self, Self::NoApplicableRule { .. })
    }

    /// 规则实现返回失败时使用
    pub fn execution_failed(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            rule: rule.into(),
            message: message.into(),
        }
    }
}
