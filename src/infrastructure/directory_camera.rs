//! 目录摄像头
//!
//! 把一个目录当作摄像头：目录中最新写入的图片文件就是"当前画面"。
//! 外部采集程序（手机同步、扫描仪、`ffmpeg -update 1`）不断覆盖或追加帧即可。

use crate::error::{AppError, AppResult, DeviceError};
use crate::infrastructure::capture_device::{
    CaptureConstraints, CaptureDevice, DeviceHandle, FacingMode, Resolution,
};
use crate::models::ImagePayload;
use async_trait::async_trait;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::{debug, info, warn};

/// 目录摄像头
pub struct DirectoryCamera {
    dir: PathBuf,
}

impl DirectoryCamera {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn label(&self) -> String {
        self.dir.display().to_string()
    }

    /// 查找最新的一帧
    async fn latest_frame(&self) -> AppResult<Option<(PathBuf, ImageFormat)>> {
        let mut entries = fs::read_dir(&self.dir).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                AppError::Device(DeviceError::Disconnected {
                    device: self.label(),
                })
            } else {
                AppError::Device(DeviceError::SnapshotFailed {
                    device: self.label(),
                    source,
                })
            }
        })?;

        let mut latest: Option<(SystemTime, PathBuf, ImageFormat)> = None;

        while let Some(entry) = entries.next_entry().await.map_err(|source| {
            AppError::Device(DeviceError::SnapshotFailed {
                device: self.label(),
                source,
            })
        })? {
            let path = entry.path();
            let Some(format) = frame_format(&path) else {
                continue;
            };
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            if latest.as_ref().map_or(true, |(t, _, _)| modified > *t) {
                latest = Some((modified, path, format));
            }
        }

        Ok(latest.map(|(_, path, format)| (path, format)))
    }
}

/// 只接受能识别格式的图片文件
fn frame_format(path: &Path) -> Option<ImageFormat> {
    match ImageFormat::from_path(path) {
        Ok(format @ (ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Bmp | ImageFormat::WebP)) => {
            Some(format)
        }
        _ => None,
    }
}

#[async_trait]
impl CaptureDevice for DirectoryCamera {
    async fn acquire(&self, constraints: &CaptureConstraints) -> AppResult<DeviceHandle> {
        let metadata = fs::metadata(&self.dir)
            .await
            .map_err(|e| AppError::device_unavailable(self.label(), e.to_string()))?;

        if !metadata.is_dir() {
            return Err(AppError::device_unavailable(self.label(), "不是目录"));
        }

        if constraints.facing == FacingMode::User {
            debug!("目录摄像头不区分朝向，忽略前置摄像头请求");
        }

        // 分辨率协商是尽力而为：以当前画面的实际尺寸为准
        let granted = match self.latest_frame().await? {
            Some((path, _)) => match image::image_dimensions(&path) {
                Ok((width, height)) => Some(Resolution::new(width, height)),
                Err(e) => {
                    warn!("无法读取画面尺寸 {}: {}", path.display(), e);
                    None
                }
            },
            None => None,
        };

        info!("正在监听摄像头目录: {}", self.label());
        Ok(DeviceHandle::new(self.label(), granted))
    }

    async fn snapshot(&self, handle: &DeviceHandle) -> AppResult<ImagePayload> {
        let (path, format) = self.latest_frame().await?.ok_or_else(|| DeviceError::NoFrame {
            device: handle.label().to_string(),
        })?;

        let bytes = fs::read(&path).await.map_err(|source| DeviceError::SnapshotFailed {
            device: handle.label().to_string(),
            source,
        })?;

        debug!(
            "截取画面: {} ({} 字节)",
            path.file_name().unwrap_or_default().to_string_lossy(),
            bytes.len()
        );

        Ok(ImagePayload::new(format.to_mime_type(), bytes))
    }

    fn release(&self, handle: DeviceHandle) {
        info!("📷 已停止监听摄像头目录: {}", handle.label());
    }
}
