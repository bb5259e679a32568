use crate::error::{AppError, AppResult, ConfigError};
use crate::models::SheetTemplate;
use crate::workflow::ScanMode;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 识别服务地址
    pub server_base_url: String,
    /// 答题卡模板标识
    pub template: String,
    /// 扫描模式
    pub scan_mode: ScanMode,
    /// 连续扫描的轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 识别成功后的冷却时间（毫秒）
    pub cooldown_ms: u64,
    /// 摄像头画面目录
    pub camera_dir: String,
    /// 期望分辨率（宽）
    pub preferred_width: u32,
    /// 期望分辨率（高）
    pub preferred_height: u32,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 批次完成后跳转的首页路由
    pub home_route: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 评分结果记录文件
    pub result_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_base_url: "http://127.0.0.1:5000".to_string(),
            template: SheetTemplate::default().id().to_string(),
            scan_mode: ScanMode::Continuous,
            poll_interval_ms: 500,
            cooldown_ms: 2000,
            camera_dir: "camera_inbox".to_string(),
            preferred_width: 1280,
            preferred_height: 720,
            request_timeout_secs: 30,
            home_route: "/".to_string(),
            verbose_logging: false,
            output_log_file: "scan_log.txt".to_string(),
            result_file: "scan_results.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载，再叠加环境变量
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })?;
        Ok(config.with_env_overrides())
    }

    fn with_env_overrides(self) -> Self {
        let base = self;
        Self {
            server_base_url: std::env::var("SCAN_SERVER_URL").unwrap_or(base.server_base_url),
            template: std::env::var("SCAN_TEMPLATE").unwrap_or(base.template),
            scan_mode: std::env::var("SCAN_MODE").ok().and_then(|v| v.parse().ok()).unwrap_or(base.scan_mode),
            poll_interval_ms: std::env::var("SCAN_POLL_INTERVAL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.poll_interval_ms),
            cooldown_ms: std::env::var("SCAN_COOLDOWN_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.cooldown_ms),
            camera_dir: std::env::var("CAMERA_DIR").unwrap_or(base.camera_dir),
            preferred_width: std::env::var("CAMERA_WIDTH").ok().and_then(|v| v.parse().ok()).unwrap_or(base.preferred_width),
            preferred_height: std::env::var("CAMERA_HEIGHT").ok().and_then(|v| v.parse().ok()).unwrap_or(base.preferred_height),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.request_timeout_secs),
            home_route: std::env::var("HOME_ROUTE").unwrap_or(base.home_route),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(base.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(base.output_log_file),
            result_file: std::env::var("RESULT_FILE").unwrap_or(base.result_file),
        }
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> AppResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(AppError::invalid_config("poll_interval_ms", "轮询间隔必须大于0"));
        }
        if self.template.trim().is_empty() {
            return Err(AppError::invalid_config("template", "模板标识不能为空"));
        }
        if let Err(e) = reqwest::Url::parse(&self.server_base_url) {
            return Err(AppError::invalid_config("server_base_url", e.to_string()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 已知模板（未知模板也允许提交）
    pub fn known_template(&self) -> Option<SheetTemplate> {
        SheetTemplate::from_id(&self.template)
    }
}
