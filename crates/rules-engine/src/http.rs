//! HTTP 入口
//!
//! 把请求映射为分发上下文，等待命中规则全部完成后按配置顺序返回各规则结果。

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use dispatch_shared::observability::middleware as obs_middleware;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::error::RuleError;
use crate::executor::RulesExecutor;
use crate::index::RuleIndexStats;
use crate::models::RuleContext;

/// 路由共享状态
#[derive(Clone)]
pub struct AppState {
    pub executor: RulesExecutor,
}

impl AppState {
    pub fn new(executor: RulesExecutor) -> Self {
        Self { executor }
    }
}

/// 分发请求
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchRequest {
    pub source: String,
    #[serde(default)]
    pub context_type: Option<String>,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

impl From<DispatchRequest> for RuleContext {
    fn from(req: DispatchRequest) -> Self {
        Self {
            source: req.source,
            context_type: req.context_type.unwrap_or_default(),
            parameters: req.parameters,
        }
    }
}

/// 单条规则的执行结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 分发响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResponse {
    pub source: String,
    pub context_type: String,
    pub criteria: String,
    pub results: Vec<RuleOutcome>,
    /// 成功状态按顺序逐行拼接
    pub summary: String,
}

/// 索引快照
#[derive(Debug, Serialize)]
pub struct IndexView {
    #[serde(flatten)]
    pub stats: RuleIndexStats,
    pub entries: Vec<IndexEntryView>,
}

#[derive(Debug, Serialize)]
pub struct IndexEntryView {
    pub criteria: String,
    pub priority: bool,
    pub rules: Vec<String>,
}

/// HTTP 层错误：请求体无法解析，或分发本身失败
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("请求体无效: {0}")]
    InvalidBody(#[from] JsonRejection),

    #[error(transparent)]
    Rule(#[from] RuleError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidBody(rejection) => {
                let body = json!({
                    "code": "INVALID_REQUEST",
                    "message": rejection.body_text(),
                });
                (rejection.status(), Json(body)).into_response()
            }
            Self::Rule(e) => e.into_response(),
        }
    }
}

/// 构建路由
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/dispatch", post(dispatch))
        .route("/api/v1/rules", get(list_rules))
        .route("/health", get(health))
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state)
}

async fn dispatch(
    State(state): State<AppState>,
    payload: Result<Json<DispatchRequest>, JsonRejection>,
) -> Result<Json<DispatchResponse>, ApiError> {
    let Json(req) = payload?;
    let context: RuleContext = req.into();
    let source = context.source.clone();
    let context_type = context.context_type.clone();

    let dispatch = state.executor.execute(context)?;
    let criteria = dispatch.criteria().to_string();

    let results: Vec<RuleOutcome> = dispatch
        .join_all()
        .await
        .into_iter()
        .map(|(rule, result)| match result {
            Ok(r) => RuleOutcome {
                rule,
                status: Some(r.status),
                error: None,
            },
            Err(e) => RuleOutcome {
                rule,
                status: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    let summary = results
        .iter()
        .filter_map(|r| r.status.as_deref())
        .fold(String::new(), |mut acc, status| {
            acc.push_str(status);
            acc.push('\n');
            acc
        });

    info!(
        source = %source,
        criteria = %criteria,
        rules = results.len(),
        "分发完成"
    );

    Ok(Json(DispatchResponse {
        source,
        context_type,
        criteria,
        results,
        summary,
    }))
}

async fn list_rules(State(state): State<AppState>) -> Json<IndexView> {
    let index = state.executor.index();

    let entries = index
        .entries()
        .iter()
        .map(|entry| IndexEntryView {
            criteria: entry.criteria.to_string(),
            priority: entry.priority,
            rules: entry.rules.iter().map(|r| r.name.clone()).collect(),
        })
        .collect();

    Json(IndexView {
        stats: index.stats(),
        entries,
    })
}

async fn health() -> &'static str {
    "OK"
}

impl RuleError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NoApplicableRule { .. } => StatusCode::NOT_FOUND,
            Self::RuntimeUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RuleError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status.is_server_error() {
            error!(error = %self, code = self.code(), "分发请求处理失败");
            "服务内部错误，请稍后重试".to_string()
        } else {
            self.to_string()
        };

        let body = json!({
            "code": self.code(),
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_into_context() {
        let req: DispatchRequest = serde_json::from_value(json!({
            "source": "Order",
            "parameters": {"Error": "QuantityError"}
        }))
        .unwrap();

        let ctx: RuleContext = req.into();
        assert_eq!(ctx.source, "Order");
        assert!(ctx.context_type.is_empty());
        assert_eq!(ctx.parameter("Error"), Some("QuantityError"));
    }

    #[test]
    fn test_error_status_codes() {
        let no_match = RuleError::NoApplicableRule {
            source_name: "Billing".to_string(),
            context_type: String::new(),
        };
        assert_eq!(no_match.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            RuleError::RuntimeUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            RuleError::execution_failed("Forward", "boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_outcome_omits_empty_fields() {
        let outcome = RuleOutcome {
            rule: "Forward".to_string(),
            status: Some("Account Forwarded".to_string()),
            error: None,
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value, json!({"rule": "Forward", "status": "Account Forwarded"}));
    }
}
