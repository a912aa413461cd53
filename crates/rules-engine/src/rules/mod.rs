//! 内置规则实现

mod escalate;
mod forward;

pub use escalate::EscalateRule;
pub use forward::ForwardRule;
