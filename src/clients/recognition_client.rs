/// 识别服务 API 客户端
///
/// 封装所有与答题卡识别服务相关的调用逻辑
use crate::config::Config;
use crate::error::{AppResult, ConfigError};
use crate::models::{Capture, ScanResult, Score, SubmissionOutcome};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// 识别接口路径
pub const PROCESS_IMAGE_ENDPOINT: &str = "process_camera_image";

/// 提交客户端
///
/// 每次调用只提交一张答题卡，所有失败都折叠进 `SubmissionOutcome`。
#[async_trait]
pub trait SubmissionClient: Send + Sync {
    async fn submit(&self, capture: &Capture) -> SubmissionOutcome;
}

/// 请求体
#[derive(Debug, Serialize)]
pub struct ProcessImageRequest<'a> {
    pub image_data: String,
    pub template: &'a str,
}

/// 响应体
#[derive(Debug, Default, Deserialize)]
pub struct ProcessImageResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Option<WireResult>,
}

#[derive(Debug, Deserialize)]
pub struct WireResult {
    pub scan_id: u64,
    pub student: WireStudent,
    pub score: Score,
}

#[derive(Debug, Deserialize)]
pub struct WireStudent {
    pub name: String,
}

/// 识别服务客户端
pub struct RecognitionClient {
    http: reqwest::Client,
    endpoint: String,
}

impl RecognitionClient {
    /// 创建新的识别服务客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|source| ConfigError::HttpClient { source })?;

        Ok(Self {
            http,
            endpoint: format!(
                "{}/{}",
                config.server_base_url.trim_end_matches('/'),
                PROCESS_IMAGE_ENDPOINT
            ),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SubmissionClient for RecognitionClient {
    async fn submit(&self, capture: &Capture) -> SubmissionOutcome {
        let request = ProcessImageRequest {
            image_data: capture.image().to_data_uri(),
            template: capture.template_id(),
        };

        debug!(
            "提交答题卡: 模板 {}, 图片 {} 字节",
            capture.template_id(),
            capture.image().len()
        );

        let response = match self.http.post(&self.endpoint).json(&request).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("识别服务请求失败 ({}): {}", self.endpoint, e);
                return SubmissionOutcome::TransportError {
                    cause: e.to_string(),
                };
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                return SubmissionOutcome::TransportError {
                    cause: format!("读取响应失败 (HTTP {}): {}", status.as_u16(), e),
                };
            }
        };

        debug!("识别服务响应: HTTP {}", status.as_u16());

        classify_response(status, serde_json::from_slice(&body))
    }
}

/// 根据状态码和响应体判定提交结果
///
/// - 无 `error` 且 `success` 为真并带有 `result` → 接受
/// - 带 `error`：5xx 视为传输失败，其余视为未识别到答题卡
/// - `success` 为假且无 `error` → 未识别到答题卡
/// - 响应体无法解析 → 传输失败
pub fn classify_response(
    status: StatusCode,
    body: Result<ProcessImageResponse, serde_json::Error>,
) -> SubmissionOutcome {
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            return SubmissionOutcome::TransportError {
                cause: format!("响应解析失败 (HTTP {}): {}", status.as_u16(), e),
            };
        }
    };

    if let Some(error) = body.error {
        return if status.is_server_error() {
            SubmissionOutcome::TransportError { cause: error }
        } else {
            SubmissionOutcome::Rejected { reason: error }
        };
    }

    if body.success != Some(true) {
        return SubmissionOutcome::Rejected {
            reason: body
                .message
                .unwrap_or_else(|| "未检测到有效答题卡".to_string()),
        };
    }

    match body.result {
        Some(result) => SubmissionOutcome::Accepted(ScanResult {
            scan_id: result.scan_id,
            student_name: result.student.name,
            score: result.score,
        }),
        None => SubmissionOutcome::TransportError {
            cause: "响应缺少 result 字段".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<ProcessImageResponse, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn test_success_response_is_accepted() {
        let outcome = classify_response(
            StatusCode::OK,
            parse(
                r#"{
                    "success": true,
                    "scan_id": 7,
                    "message": "Image processed successfully",
                    "result": {
                        "scan_id": 7,
                        "student": { "name": "Lin", "id": "S-01" },
                        "score": { "correct": 15, "total": 20, "percentage": 75.0 }
                    }
                }"#,
            ),
        );

        match outcome {
            SubmissionOutcome::Accepted(result) => {
                assert_eq!(result.scan_id, 7);
                assert_eq!(result.student_name, "Lin");
                assert_eq!(result.score.correct, 15);
                assert_eq!(result.score.total, 20);
            }
            other => panic!("应该被接受: {:?}", other),
        }
    }

    #[test]
    fn test_not_detected_is_rejected() {
        let outcome = classify_response(
            StatusCode::OK,
            parse(
                r#"{
                    "success": false,
                    "message": "No valid exam sheet detected",
                    "result": {
                        "scan_id": 8,
                        "student": { "name": "" },
                        "score": { "correct": 0, "total": 20, "percentage": 0.0 }
                    }
                }"#,
            ),
        );
        assert_eq!(
            outcome,
            SubmissionOutcome::Rejected {
                reason: "No valid exam sheet detected".to_string()
            }
        );
    }

    #[test]
    fn test_error_field_depends_on_status() {
        let client_side = classify_response(
            StatusCode::BAD_REQUEST,
            parse(r#"{ "error": "Could not find sheet corners" }"#),
        );
        assert!(matches!(client_side, SubmissionOutcome::Rejected { .. }));

        let server_side = classify_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            parse(r#"{ "success": false, "error": "database locked" }"#),
        );
        assert_eq!(
            server_side,
            SubmissionOutcome::TransportError {
                cause: "database locked".to_string()
            }
        );
    }

    #[test]
    fn test_unparsable_body_is_transport_error() {
        let outcome = classify_response(StatusCode::BAD_GATEWAY, parse("<html>502</html>"));
        assert!(matches!(outcome, SubmissionOutcome::TransportError { .. }));
    }

    #[test]
    fn test_success_without_result_is_transport_error() {
        let outcome = classify_response(StatusCode::OK, parse(r#"{ "success": true }"#));
        assert!(matches!(outcome, SubmissionOutcome::TransportError { .. }));
    }

    #[test]
    fn test_request_body_shape() {
        let capture = Capture::new(crate::models::ImagePayload::png(vec![1u8, 2, 3]), "standard_20");
        let request = ProcessImageRequest {
            image_data: capture.image().to_data_uri(),
            template: capture.template_id(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["template"], "standard_20");
        assert_eq!(json["image_data"], "data:image/png;base64,AQID");
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let config = Config {
            server_base_url: "http://scanner.local:5000/".to_string(),
            ..Config::default()
        };
        let client = RecognitionClient::new(&config).unwrap();
        assert_eq!(client.endpoint(), "http://scanner.local:5000/process_camera_image");
    }
}
