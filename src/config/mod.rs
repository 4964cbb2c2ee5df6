//! # 配置管理模块
//!
//! 处理客户端配置加载、环境变量覆盖和验证

mod app_config;

pub use app_config::{ApiConfig, ClientConfig, IdentityConfig, LoggingConfig, SessionConfig};

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{ClientError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, linfo};

/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "EXPENSE_CLIENT_CONFIG_PATH";

/// 环境变量到配置路径的映射
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("EXPENSE_API_BASE_URL", "api.base_url"),
    ("EXPENSE_API_TIMEOUT", "api.timeout_seconds"),
    ("EXPENSE_SESSION_DIR", "session.store_dir"),
    ("EXPENSE_LOG_LEVEL", "logging.level"),
];

/// 加载配置
///
/// 优先使用 `EXPENSE_CLIENT_CONFIG_PATH`，否则读取 `config/config.{RUST_ENV}.toml`。
/// 配置文件不存在时使用默认值。之后应用环境变量覆盖并验证。
pub fn load_config() -> Result<ClientConfig> {
    load_config_with(|key| env::var(key).ok())
}

/// 使用给定的变量查找函数加载配置
pub fn load_config_with<F>(lookup: F) -> Result<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let config_path = resolve_config_path(&lookup);
    let mut config = if config_path.exists() {
        load_config_file(&config_path)?
    } else {
        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Config,
            "config_default",
            &format!("配置文件不存在，使用默认配置: {}", config_path.display())
        );
        ClientConfig::default()
    };

    let overrides = ENV_OVERRIDES
        .iter()
        .filter_map(|(var, path)| lookup(var).map(|value| (*path, value)));
    apply_overrides(&mut config, overrides)?;

    config.validate()?;
    Ok(config)
}

/// 从指定文件读取配置（不应用环境变量覆盖）
pub fn load_config_file(path: &Path) -> Result<ClientConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ClientError::config_with_source(format!("读取配置文件失败: {}", path.display()), e)
    })?;

    let config: ClientConfig = toml::from_str(&content).map_err(|e| {
        ClientError::config_with_source(
            format!("TOML解析失败 - 配置文件: {}, 详细错误: {e}", path.display()),
            e,
        )
    })?;

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Config,
        "config_loaded",
        &format!("已加载配置文件: {}", path.display())
    );
    Ok(config)
}

fn resolve_config_path<F>(lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    let env_name = lookup("RUST_ENV").unwrap_or_else(|| "dev".to_string());
    PathBuf::from(format!("config/config.{env_name}.toml"))
}

/// 将 (配置路径, 值) 覆盖应用到配置对象
pub fn apply_overrides<'a, I>(config: &mut ClientConfig, overrides: I) -> Result<()>
where
    I: IntoIterator<Item = (&'a str, String)>,
{
    for (path, value) in overrides {
        ldebug!(
            "system",
            LogStage::Startup,
            LogComponent::Config,
            "env_override",
            &format!("应用环境变量覆盖: {path} = {value}")
        );

        match path {
            "api.base_url" => config.api.base_url = value,
            "api.timeout_seconds" => {
                config.api.timeout_seconds = value.parse().map_err(|e| {
                    ClientError::config_with_source(format!("无效的超时时间: {value}"), e)
                })?;
            }
            "session.store_dir" => config.session.store_dir = PathBuf::from(value),
            "logging.level" => config.logging.level = value,
            other => {
                return Err(ClientError::config(format!("未知的配置覆盖路径: {other}")));
            }
        }
    }
    Ok(())
}
