use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::models::{RuleContext, RuleResult};
use crate::rule::Rule;

/// 转发规则：原样转交上下文
#[derive(Debug, Default, Clone, Copy)]
pub struct ForwardRule;

impl ForwardRule {
    pub const NAME: &'static str = "Forward";
}

#[async_trait]
impl Rule for ForwardRule {
    async fn execute(&self, context: Arc<RuleContext>) -> Result<RuleResult> {
        debug!(source = %context.source, "forwarding");
        let status = format!("{} Forwarded", context.source);
        Ok(RuleResult::new(context, status))
    }

    fn description(&self) -> &'static str {
        "转发上下文"
    }
}
