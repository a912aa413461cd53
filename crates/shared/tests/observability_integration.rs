//! 可观测性模块集成测试
//!
//! 没有安装 recorder 时指标宏为空操作，这里验证各记录函数与中间件在任意输入下不会 panic。

// ============================================================================
// 指标记录测试
// ============================================================================

mod metrics_tests {
    use dispatch_shared::observability::metrics::{
        get_handle, record_dispatch, record_http_request, record_index_reload,
        record_rule_execution,
    };

    #[test]
    fn test_record_http_request() {
        record_http_request("POST", "/api/v1/dispatch", 200, 0.05);
        record_http_request("POST", "/api/v1/dispatch", 404, 0.01);
        record_http_request("GET", "/api/v1/rules", 200, 0.002);
        record_http_request("GET", "/health", 200, 0.001);
    }

    #[test]
    fn test_record_dispatch() {
        record_dispatch("Account", "matched");
        record_dispatch("Order", "matched");
        record_dispatch("Billing", "no_match");
    }

    #[test]
    fn test_record_rule_execution() {
        record_rule_execution("Forward", "success", 0.001);
        record_rule_execution("Escalate", "failure", 0.25);
    }

    #[test]
    fn test_record_index_reload() {
        record_index_reload("success");
        record_index_reload("failure");
    }

    #[test]
    fn test_metrics_with_edge_cases() {
        record_http_request("", "", 0, 0.0);

        let long_source = "x".repeat(1000);
        record_dispatch(&long_source, "no_match");

        record_rule_execution("Forward", "success", 999.99);
    }

    #[test]
    fn test_handle_absent_without_init() {
        assert!(get_handle().is_none());
    }
}

// ============================================================================
// 中间件测试
// ============================================================================

mod middleware_tests {
    use axum::{Router, body::Body, http::Request, middleware, routing::get};
    use dispatch_shared::observability::middleware::{RequestId, http_tracing, request_id};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(middleware::from_fn(http_tracing))
            .layer(middleware::from_fn(request_id))
    }

    #[test]
    fn test_request_id_clone() {
        let id1 = RequestId("original".to_string());
        let id2 = id1.clone();
        assert_eq!(id1.as_str(), id2.as_str());
    }

    #[tokio::test]
    async fn test_request_id_generated() {
        let response = app()
            .oneshot(Request::get("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let id = response.headers()["x-request-id"].to_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn test_request_id_preserved() {
        let response = app()
            .oneshot(
                Request::get("/ping")
                    .header("x-request-id", "upstream-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()["x-request-id"], "upstream-1");
    }
}

// ============================================================================
// 配置测试
// ============================================================================

mod config_tests {
    use dispatch_shared::observability::ObservabilityConfig;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.service_name, "unknown-service");
        assert_eq!(config.metrics_port, 9090);
        assert!(config.metrics_enabled);
    }

    #[test]
    fn test_custom_config() {
        let config = ObservabilityConfig {
            service_name: "rules-engine".to_string(),
            log_level: "debug".to_string(),
            json_logs: true,
            metrics_enabled: false,
            metrics_port: 9091,
        };

        assert_eq!(config.service_name, "rules-engine");
        assert_eq!(config.log_level, "debug");
        assert!(config.json_logs);
        assert!(!config.metrics_enabled);
    }
}

// ============================================================================
// Guard 测试
// ============================================================================

mod guard_tests {
    use dispatch_shared::observability::ObservabilityGuard;

    #[test]
    fn test_empty_guard() {
        let guard = ObservabilityGuard::empty();
        drop(guard);
    }
}
