//! 条件操作符定义

use serde::{Deserialize, Serialize};
use std::fmt;

/// 条件操作符
///
/// 同一表达式中的操作符统一作用于每一对字段/取值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Neq,
}

impl Operator {
    /// 从表达式中的符号解析，不支持的符号返回 None
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "==" => Some(Self::Eq),
            "!=" => Some(Self::Neq),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Neq => "!=",
        }
    }

    /// 对单个字段值应用操作符
    #[inline]
    pub fn apply(&self, actual: &str, expected: &str) -> bool {
        match self {
            Self::Eq => actual == expected,
            Self::Neq => actual != expected,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_symbol() {
        assert_eq!(Operator::from_symbol("=="), Some(Operator::Eq));
        assert_eq!(Operator::from_symbol("!="), Some(Operator::Neq));
        assert_eq!(Operator::from_symbol(">="), None);
        assert_eq!(Operator::from_symbol("="), None);
    }

    #[test]
    fn test_apply() {
        assert!(Operator::Eq.apply("Account", "Account"));
        assert!(!Operator::Eq.apply("Account", "account"));
        assert!(Operator::Neq.apply("Account", "Order"));
        assert!(!Operator::Neq.apply("Order", "Order"));
    }

    #[test]
    fn test_display_round_trips_symbol() {
        assert_eq!(Operator::Eq.to_string(), "==");
        assert_eq!(Operator::Neq.to_string(), "!=");
    }
}
