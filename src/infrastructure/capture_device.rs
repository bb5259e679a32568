//! 摄像头设备 - 基础设施层
//!
//! 持有唯一的摄像头句柄，只暴露"拍一张"的能力

use crate::error::{AppResult, DeviceError};
use crate::models::ImagePayload;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// 分辨率
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// 摄像头朝向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    /// 后置（朝向环境）
    Environment,
    /// 前置（朝向用户）
    User,
}

/// 打开摄像头时的期望参数
///
/// 只是偏好：平台授予什么分辨率就用什么分辨率。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub facing: FacingMode,
    pub preferred: Resolution,
}

impl CaptureConstraints {
    /// 后置摄像头 + 期望分辨率
    pub fn rear(preferred: Resolution) -> Self {
        Self {
            facing: FacingMode::Environment,
            preferred,
        }
    }
}

/// 已打开的摄像头句柄
///
/// 不可克隆：释放时按值交还给设备。
#[derive(Debug)]
pub struct DeviceHandle {
    label: String,
    granted: Option<Resolution>,
}

impl DeviceHandle {
    pub fn new(label: impl Into<String>, granted: Option<Resolution>) -> Self {
        Self {
            label: label.into(),
            granted,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// 平台实际授予的分辨率（未知时为 `None`）
    pub fn granted(&self) -> Option<Resolution> {
        self.granted
    }
}

/// 摄像头设备
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// 打开摄像头，失败时返回 `DeviceError::Unavailable`
    async fn acquire(&self, constraints: &CaptureConstraints) -> AppResult<DeviceHandle>;

    /// 从实时画面中截取一张静态图片
    async fn snapshot(&self, handle: &DeviceHandle) -> AppResult<ImagePayload>;

    /// 释放摄像头
    fn release(&self, handle: DeviceHandle);
}

/// 摄像头租约
///
/// 职责：
/// - 持有唯一的 DeviceHandle
/// - 暴露 snapshot() 能力
/// - 任何退出路径上都会释放设备（包括 Drop）
/// - 释放之后不会再产生任何画面
pub struct DeviceLease {
    device: Arc<dyn CaptureDevice>,
    handle: Option<DeviceHandle>,
}

impl DeviceLease {
    /// 打开摄像头并创建租约
    pub async fn acquire(
        device: Arc<dyn CaptureDevice>,
        constraints: &CaptureConstraints,
    ) -> AppResult<Self> {
        let handle = device.acquire(constraints).await?;

        match handle.granted() {
            Some(granted) if granted != constraints.preferred => {
                info!(
                    "📷 摄像头 {} 已打开，期望 {}，实际 {}",
                    handle.label(),
                    constraints.preferred,
                    granted
                );
            }
            Some(granted) => info!("📷 摄像头 {} 已打开 ({})", handle.label(), granted),
            None => info!("📷 摄像头 {} 已打开 (分辨率未知)", handle.label()),
        }

        Ok(Self {
            device,
            handle: Some(handle),
        })
    }

    pub fn is_released(&self) -> bool {
        self.handle.is_none()
    }

    pub fn granted(&self) -> Option<Resolution> {
        self.handle.as_ref().and_then(DeviceHandle::granted)
    }

    /// 截取一张画面
    pub async fn snapshot(&self) -> AppResult<ImagePayload> {
        let handle = self.handle.as_ref().ok_or(DeviceError::Released)?;
        self.device.snapshot(handle).await
    }

    /// 释放摄像头（可重复调用）
    pub fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("释放摄像头: {}", handle.label());
            self.device.release(handle);
        }
    }
}

impl Drop for DeviceLease {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for DeviceLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceLease")
            .field("handle", &self.handle)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingDevice {
        released: AtomicUsize,
    }

    #[async_trait]
    impl CaptureDevice for CountingDevice {
        async fn acquire(&self, _constraints: &CaptureConstraints) -> AppResult<DeviceHandle> {
            Ok(DeviceHandle::new("fake", Some(Resolution::new(640, 480))))
        }

        async fn snapshot(&self, _handle: &DeviceHandle) -> AppResult<ImagePayload> {
            Ok(ImagePayload::png(vec![1u8]))
        }

        fn release(&self, _handle: DeviceHandle) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_release_is_idempotent_and_blocks_snapshot() {
        let device = Arc::new(CountingDevice::default());
        let mut lease = DeviceLease::acquire(
            device.clone(),
            &CaptureConstraints::rear(Resolution::new(1280, 720)),
        )
        .await
        .unwrap();

        assert_eq!(lease.granted(), Some(Resolution::new(640, 480)));
        assert!(lease.snapshot().await.is_ok());

        lease.release();
        lease.release();
        assert_eq!(device.released.load(Ordering::SeqCst), 1);
        assert!(matches!(
            lease.snapshot().await,
            Err(AppError::Device(DeviceError::Released))
        ));
    }

    #[tokio::test]
    async fn test_drop_releases_device() {
        let device = Arc::new(CountingDevice::default());
        {
            let _lease = DeviceLease::acquire(
                device.clone(),
                &CaptureConstraints::rear(Resolution::new(1280, 720)),
            )
            .await
            .unwrap();
        }
        assert_eq!(device.released.load(Ordering::SeqCst), 1);
    }
}
