//! 条件表达式编译器
//!
//! 将形如 `Source-Error == Order-QuantityError` 的条件字符串解析成类型化的语法树：
//! 一个操作符加上按位置配对的 (字段, 字面量) 列表。
//!
//! 文法（空白分隔，恰好三段）：
//!
//! ```text
//! <fields> <operator> <values>
//! fields   := name ('-' name)*
//! operator := '==' | '!='
//! values   := literal ('-' literal)*      // 个数与 fields 一致
//! ```
//!
//! 字段名先匹配上下文的一等属性（`source`、`context_type`，忽略大小写与下划线），
//! 否则作为 `parameters` 的键（区分大小写）。

use crate::error::{Result, RuleError};
use crate::evaluator::PredicateEvaluator;
use crate::models::RuleContext;
use crate::operators::Operator;
use std::fmt;
use std::str::FromStr;

/// 字段与多字段之间的分隔符
pub const FIELD_SEPARATOR: char = '-';

/// 字段引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Source,
    ContextType,
    Parameter(String),
}

impl Field {
    /// 解析字段名
    pub fn resolve(name: &str) -> Self {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "source" => Self::Source,
            "contexttype" => Self::ContextType,
            _ => Self::Parameter(name.to_string()),
        }
    }

    /// 从上下文中取值，参数缺失时返回 None
    pub fn value<'a>(&self, context: &'a RuleContext) -> Option<&'a str> {
        match self {
            Self::Source => Some(&context.source),
            Self::ContextType => Some(&context.context_type),
            Self::Parameter(key) => context.parameter(key),
        }
    }
}

/// 单个比较项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    /// 表达式中书写的字段名
    pub name: String,
    pub field: Field,
    pub literal: String,
}

/// 编译后的条件（谓词）
///
/// 不含可变状态，可被多个请求并发求值。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criteria {
    text: String,
    operator: Operator,
    terms: Vec<Term>,
}

impl Criteria {
    /// 编译条件表达式
    pub fn parse(criteria: &str) -> Result<Self> {
        compile(criteria)
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// 表达式引用的字段名（按书写顺序）
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| t.name.as_str())
    }

    /// 规范化后的表达式文本
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// 对上下文求值
    pub fn evaluate(&self, context: &RuleContext) -> bool {
        PredicateEvaluator::evaluate(self, context)
    }
}

impl FromStr for Criteria {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        compile(s)
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// 编译条件表达式
pub fn compile(criteria: &str) -> Result<Criteria> {
    let invalid = |reason: String| RuleError::InvalidCriteria {
        criteria: criteria.to_string(),
        reason,
    };

    let tokens: Vec<&str> = criteria.split_whitespace().collect();
    let &[fields, operator, values] = tokens.as_slice() else {
        return Err(invalid(format!(
            "需要 3 个以空白分隔的部分，实际 {} 个",
            tokens.len()
        )));
    };

    let op = Operator::from_symbol(operator).ok_or_else(|| RuleError::UnsupportedOperator {
        criteria: criteria.to_string(),
        operator: operator.to_string(),
    })?;

    let names: Vec<&str> = fields.split(FIELD_SEPARATOR).collect();
    let literals: Vec<&str> = values.split(FIELD_SEPARATOR).collect();

    if names.len() != literals.len() {
        return Err(RuleError::FieldValueMismatch {
            criteria: criteria.to_string(),
            fields: names.len(),
            values: literals.len(),
        });
    }

    if let Some(index) = names.iter().position(|name| name.is_empty()) {
        return Err(invalid(format!("第 {} 个字段名为空", index + 1)));
    }

    let terms = names
        .into_iter()
        .zip(literals)
        .map(|(name, literal)| Term {
            name: name.to_string(),
            field: Field::resolve(name),
            literal: literal.to_string(),
        })
        .collect();

    Ok(Criteria {
        text: format!("{} {} {}", fields, op, values),
        operator: op,
        terms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_single_field() {
        let criteria = compile("Source == Account").unwrap();

        assert_eq!(criteria.operator(), Operator::Eq);
        assert_eq!(criteria.terms().len(), 1);
        assert_eq!(criteria.terms()[0].field, Field::Source);
        assert_eq!(criteria.terms()[0].literal, "Account");
        assert_eq!(criteria.as_str(), "Source == Account");
    }

    #[test]
    fn test_compile_multiple_fields() {
        let criteria = compile("Source-ContextType-Error != Order-Alarm-QuantityError").unwrap();

        assert_eq!(criteria.operator(), Operator::Neq);
        assert_eq!(
            criteria.fields().collect::<Vec<_>>(),
            vec!["Source", "ContextType", "Error"]
        );
        assert_eq!(criteria.terms()[1].field, Field::ContextType);
        assert_eq!(
            criteria.terms()[2].field,
            Field::Parameter("Error".to_string())
        );
        assert_eq!(criteria.terms()[2].literal, "QuantityError");
    }

    #[test]
    fn test_compile_normalizes_whitespace() {
        let criteria: Criteria = "  Source   ==\tAccount ".parse().unwrap();
        assert_eq!(criteria.to_string(), "Source == Account");
    }

    #[test]
    fn test_field_resolution() {
        assert_eq!(Field::resolve("Source"), Field::Source);
        assert_eq!(Field::resolve("source"), Field::Source);
        assert_eq!(Field::resolve("ContextType"), Field::ContextType);
        assert_eq!(Field::resolve("context_type"), Field::ContextType);
        assert_eq!(Field::resolve("contextType"), Field::ContextType);
        assert_eq!(
            Field::resolve("Region"),
            Field::Parameter("Region".to_string())
        );
    }

    #[test]
    fn test_wrong_token_count() {
        for input in ["", "Source", "Source ==", "Source == Account extra", "Source==Account"] {
            let err = compile(input).unwrap_err();
            assert!(
                matches!(err, RuleError::InvalidCriteria { .. }),
                "'{}' should be rejected, got {:?}",
                input,
                err
            );
        }
    }

    #[test]
    fn test_unsupported_operator() {
        let err = compile("Source >= Account").unwrap_err();
        match err {
            RuleError::UnsupportedOperator { operator, .. } => assert_eq!(operator, ">="),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_field_value_mismatch() {
        let err = compile("Source-Error == Order").unwrap_err();
        match err {
            RuleError::FieldValueMismatch { fields, values, .. } => {
                assert_eq!(fields, 2);
                assert_eq!(values, 1);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        assert!(matches!(
            compile("Source == Order-QuantityError"),
            Err(RuleError::FieldValueMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_field_name() {
        let err = compile("Source- == Order-X").unwrap_err();
        assert!(matches!(err, RuleError::InvalidCriteria { .. }));
        assert!(err.to_string().contains("第 2 个字段名为空"));
    }

    #[test]
    fn test_compile_is_deterministic() {
        let a = compile("Source-Error == Order-QuantityError").unwrap();
        let b = compile("Source-Error == Order-QuantityError").unwrap();
        assert_eq!(a, b);
    }
}
