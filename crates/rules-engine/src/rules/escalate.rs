use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::error::Result;
use crate::models::{RuleContext, RuleResult};
use crate::rule::Rule;

/// 升级规则：将上下文标记为已升级处理
#[derive(Debug, Default, Clone, Copy)]
pub struct EscalateRule;

impl EscalateRule {
    pub const NAME: &'static str = "Escalate";
}

#[async_trait]
impl Rule for EscalateRule {
    async fn execute(&self, context: Arc<RuleContext>) -> Result<RuleResult> {
        info!(
            source = %context.source,
            context_type = %context.context_type,
            "escalating"
        );
        let status = format!("{} Escalated", context.source);
        Ok(RuleResult::new(context, status))
    }

    fn description(&self) -> &'static str {
        "升级处理"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escalate_status() {
        let ctx = Arc::new(RuleContext::new("Order").with_parameter("Error", "QuantityError"));
        let result = tokio_test::block_on(EscalateRule.execute(ctx)).unwrap();

        assert_eq!(result.status, "Order Escalated");
        assert_eq!(result.context.parameter("Error"), Some("QuantityError"));
    }
}
