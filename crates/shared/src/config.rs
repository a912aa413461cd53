//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。
//! 规则分发配置（`rules.configurations`）也在这里绑定，由规则引擎的构建器原样消费。

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::observability::ObservabilityConfig;

/// 服务配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// 配置热更新
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConfigCenterConfig {
    /// 是否监听配置目录并在变更时重建规则索引
    pub enabled: bool,
    /// 文件事件去抖窗口（毫秒）
    pub debounce_ms: u64,
}

impl Default for ConfigCenterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            debounce_ms: 2000,
        }
    }
}

/// 单条规则分发配置
///
/// `criteria` 为条件表达式（如 `Source-Error == Order-QuantityError`），
/// `rules` 为命中后按顺序执行的规则标识列表。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfiguration {
    pub criteria: String,
    pub rules: Vec<String>,
    /// 多条配置同时命中时优先选择带此标记的配置
    #[serde(default)]
    pub priority: bool,
}

impl RuleConfiguration {
    pub fn new<I, S>(criteria: impl Into<String>, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            criteria: criteria.into(),
            rules: rules.into_iter().map(Into::into).collect(),
            priority: false,
        }
    }

    pub fn with_priority(mut self) -> Self {
        self.priority = true;
        self
    }
}

/// 规则分发配置集合（保持声明顺序）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfiguration {
    #[serde(default)]
    pub configurations: Vec<RuleConfiguration>,
}

impl RulesConfiguration {
    pub fn new(configurations: Vec<RuleConfiguration>) -> Self {
        Self { configurations }
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub server: ServerConfig,
    pub observability: ObservabilityConfig,
    pub config_center: ConfigCenterConfig,
    pub rules: RulesConfiguration,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. config/{service_name}.toml（服务特定配置）
    /// 4. 环境变量（DISPATCH_ 前缀，`__` 分隔层级，如 DISPATCH_SERVER__PORT -> server.port）
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        let env = default_environment();
        let config_dir = config_dir();

        Self::load_from(&config_dir, service_name, &env)
    }

    /// 从指定目录加载配置
    pub fn load_from(
        config_dir: impl AsRef<Path>,
        service_name: &str,
        env: &str,
    ) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", env))).required(false))
            .add_source(
                File::from(config_dir.join(format!("{}.toml", service_name))).required(false),
            )
            .add_source(
                Environment::with_prefix("DISPATCH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;
        config.observability.service_name = config.service_name.clone();

        Ok(config)
    }

    /// 获取服务地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// 运行环境，默认 `development`，可由 DISPATCH_ENV 覆盖
pub fn default_environment() -> String {
    std::env::var("DISPATCH_ENV").unwrap_or_else(|_| "development".to_string())
}

/// 配置目录，默认 `config`，可由 CONFIG_DIR 覆盖
pub fn config_dir() -> String {
    std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_config_dir(files: &[(&str, &str)]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dispatch-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        for (name, content) in files {
            std::fs::write(dir.join(name), content).unwrap();
        }
        dir
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert!(!config.config_center.enabled);
        assert!(config.rules.is_empty());
    }

    #[test]
    fn test_server_addr() {
        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            ..Default::default()
        };
        assert_eq!(config.server_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_load_rules_from_file() {
        let dir = temp_config_dir(&[(
            "default.toml",
            r#"
            [server]
            port = 7001

            [[rules.configurations]]
            criteria = "Source == Account"
            rules = ["Forward"]

            [[rules.configurations]]
            criteria = "Source-Error == Order-QuantityError"
            rules = ["Escalate", "Forward"]
            priority = true
            "#,
        )]);

        let config = AppConfig::load_from(&dir, "rules-engine", "test").unwrap();

        assert_eq!(config.service_name, "rules-engine");
        assert_eq!(config.observability.service_name, "rules-engine");
        assert_eq!(config.environment, "test");
        assert_eq!(config.server.port, 7001);
        assert_eq!(config.rules.len(), 2);

        let first = &config.rules.configurations[0];
        assert_eq!(first.criteria, "Source == Account");
        assert_eq!(first.rules, vec!["Forward"]);
        assert!(!first.priority);

        let second = &config.rules.configurations[1];
        assert_eq!(second.rules, vec!["Escalate", "Forward"]);
        assert!(second.priority);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_environment_file_overrides_default() {
        let dir = temp_config_dir(&[
            ("default.toml", "[server]\nport = 7001\n"),
            ("staging.toml", "[server]\nport = 7002\n"),
        ]);

        let config = AppConfig::load_from(&dir, "rules-engine", "staging").unwrap();
        assert_eq!(config.server.port, 7002);
        assert_eq!(config.server.host, "0.0.0.0");

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_missing_files_fall_back_to_defaults() {
        let dir = temp_config_dir(&[]);

        let config = AppConfig::load_from(&dir, "rules-engine", "development").unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(config.rules.is_empty());
        assert!(!config.is_production());

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_rule_configuration_builder() {
        let entry = RuleConfiguration::new("Source == Account", ["Forward"]).with_priority();
        assert_eq!(entry.rules, vec!["Forward".to_string()]);
        assert!(entry.priority);
    }
}
