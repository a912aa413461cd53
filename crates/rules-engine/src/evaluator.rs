//! 谓词求值器
//!
//! 按字段顺序对每个比较项求值并做 AND 短路；`!=` 是逐项取反，
//! 不是对整体合取取反。引用的参数不存在时该比较项为 false（两种操作符皆然）。

use crate::compiler::{Criteria, Term};
use crate::models::RuleContext;
use crate::operators::Operator;

pub struct PredicateEvaluator;

impl PredicateEvaluator {
    /// 对整个条件求值
    pub fn evaluate(criteria: &Criteria, context: &RuleContext) -> bool {
        let operator = criteria.operator();
        criteria
            .terms()
            .iter()
            .all(|term| Self::evaluate_term(term, operator, context))
    }

    /// 对单个比较项求值
    #[inline]
    pub fn evaluate_term(term: &Term, operator: Operator, context: &RuleContext) -> bool {
        match term.field.value(context) {
            Some(actual) => operator.apply(actual, &term.literal),
            None => false,
        }
    }
}
