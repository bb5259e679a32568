use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 摄像头设备错误
    #[error("设备错误: {0}")]
    Device(#[from] DeviceError),
    /// 单张答题卡提交错误
    #[error("提交错误: {0}")]
    Submit(#[from] SubmitError),
    /// 批次/会话流程错误
    #[error("批次错误: {0}")]
    Batch(#[from] BatchError),
    /// 采集记录访问错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 摄像头设备错误
#[derive(Debug, Error)]
pub enum DeviceError {
    /// 平台无法授予摄像头（会话级致命错误）
    #[error("无法打开摄像头 {device}: {reason}")]
    Unavailable { device: String, reason: String },
    /// 当前画面中还没有可用帧
    #[error("摄像头 {device} 暂无可用画面")]
    NoFrame { device: String },
    /// 读取画面失败
    #[error("读取摄像头 {device} 画面失败: {source}")]
    SnapshotFailed {
        device: String,
        #[source]
        source: std::io::Error,
    },
    /// 摄像头在会话中途断开
    #[error("摄像头 {device} 已断开")]
    Disconnected { device: String },
    /// 会话已释放摄像头
    #[error("摄像头已释放，会话已结束")]
    Released,
}

impl DeviceError {
    /// 是否会终止整个会话
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DeviceError::Unavailable { .. } | DeviceError::Disconnected { .. } | DeviceError::Released
        )
    }
}

/// 单张答题卡的提交失败
///
/// 两种失败对调度的影响完全相同（不入库、不进入冷却），只在展示上区分。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// 服务端没有在画面中识别到有效答题卡
    #[error("未识别到有效答题卡: {reason}")]
    NoSheetDetected { reason: String },
    /// 网络或服务端处理失败
    #[error("识别服务请求失败: {cause}")]
    Transport { cause: String },
}

/// 批次/会话流程错误
#[derive(Debug, Error)]
pub enum BatchError {
    /// 没有任何已采集的答题卡
    #[error("尚未扫描任何答题卡！")]
    EmptyBatch,
    /// 批次已结束（已提交或已退出），不能再次提交
    #[error("本批次已结束，不能重复提交")]
    AlreadyFinished,
    /// 当前模式不支持该操作
    #[error("当前为{actual}模式，无法执行该操作")]
    WrongMode { actual: String },
}

/// 采集记录访问错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 位置超出范围
    #[error("位置 {position} 超出范围 (共 {len} 张)")]
    OutOfRange { position: usize, len: usize },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 配置项不合法
    #[error("配置项 {field} 不合法: {reason}")]
    Invalid { field: String, reason: String },
    /// HTTP 客户端构建失败
    #[error("HTTP客户端初始化失败: {source}")]
    HttpClient {
        #[source]
        source: reqwest::Error,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建摄像头不可用错误
    pub fn device_unavailable(device: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Device(DeviceError::Unavailable {
            device: device.into(),
            reason: reason.into(),
        })
    }

    /// 创建非法配置错误
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Config(ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        })
    }

    /// 是否为会话级致命错误
    ///
    /// 只有设备层面的失败会终止会话，单帧失败永远不会。
    pub fn is_fatal(&self) -> bool {
        match self {
            AppError::Device(e) => e.is_fatal(),
            _ => false,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
