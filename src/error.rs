use std::fmt;

use regex::Regex;

/// 导入错误分类
///
/// 所有网络、解析、存储失败在重试边界处被归一化为这里的某一类，
/// 每一类携带机器可读的种类、可选的 HTTP 状态码和人类可读的消息。
#[derive(Debug, Clone)]
pub enum ImportError {
    /// 网络传输层错误（可重试）
    Network { message: String },
    /// API 返回错误状态码（>=500 可重试，其余 4xx 不可重试）
    Api { status: u16, message: String },
    /// 认证失败（401/403，不可重试）
    Authentication { status: u16 },
    /// 请求频率限制（429，可重试）
    RateLimit { message: String },
    /// 输入验证失败
    Validation { rule: String, message: String },
    /// 响应内容解析失败
    Parsing { message: String },
    /// 宿主存储操作失败
    HostOperation { message: String },
    /// 用户取消了操作
    UserCancelled,
    /// 未知错误
    Unknown { message: String },
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Network { message } => write!(f, "网络错误: {}", message),
            ImportError::Api { status, message } => {
                write!(f, "API错误 (HTTP {}): {}", status, message)
            }
            ImportError::Authentication { status } => {
                write!(f, "认证失败 (HTTP {}): 请检查访问权限", status)
            }
            ImportError::RateLimit { message } => {
                write!(f, "请求频率限制: {}", message)
            }
            ImportError::Validation { rule, message } => {
                write!(f, "验证失败 ({}): {}", rule, message)
            }
            ImportError::Parsing { message } => write!(f, "解析错误: {}", message),
            ImportError::HostOperation { message } => {
                write!(f, "存储操作失败: {}", message)
            }
            ImportError::UserCancelled => write!(f, "用户取消了操作"),
            ImportError::Unknown { message } => write!(f, "未知错误: {}", message),
        }
    }
}

impl std::error::Error for ImportError {}

// ========== 便捷构造函数 ==========

impl ImportError {
    pub fn network(message: impl Into<String>) -> Self {
        ImportError::Network {
            message: message.into(),
        }
    }

    pub fn parsing(message: impl Into<String>) -> Self {
        ImportError::Parsing {
            message: message.into(),
        }
    }

    pub fn validation(rule: impl Into<String>, message: impl Into<String>) -> Self {
        ImportError::Validation {
            rule: rule.into(),
            message: message.into(),
        }
    }

    pub fn host_operation(message: impl Into<String>) -> Self {
        ImportError::HostOperation {
            message: message.into(),
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        ImportError::Unknown {
            message: message.into(),
        }
    }

    /// 根据 HTTP 状态码归类
    ///
    /// 401/403 → 认证失败；429 → 频率限制；其余 → API 错误
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            401 | 403 => ImportError::Authentication { status },
            429 => ImportError::RateLimit {
                message: message.into(),
            },
            _ => ImportError::Api {
                status,
                message: message.into(),
            },
        }
    }

    /// 该错误是否允许自动重试
    pub fn retryable(&self) -> bool {
        match self {
            ImportError::Network { .. } | ImportError::RateLimit { .. } => true,
            ImportError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// 携带的 HTTP 状态码（如果有）
    pub fn status(&self) -> Option<u16> {
        match self {
            ImportError::Api { status, .. } | ImportError::Authentication { status } => {
                Some(*status)
            }
            ImportError::RateLimit { .. } => Some(429),
            _ => None,
        }
    }

    /// 将任意失败归一化为分类错误
    ///
    /// 归类优先级：已分类的错误原样透传 → 传输层失败 → 携带状态码的
    /// 失败（通过消息模式 `HTTP error ... status: <code>` 识别）→
    /// 响应解析失败 → 宿主存储失败 → 未知错误。
    pub fn classify(err: anyhow::Error) -> Self {
        let err = match err.downcast::<ImportError>() {
            Ok(classified) => return classified,
            Err(err) => err,
        };

        if let Some(reqwest_err) = err.downcast_ref::<reqwest::Error>() {
            return classify_reqwest(reqwest_err);
        }
        if err.downcast_ref::<serde_json::Error>().is_some() {
            return ImportError::parsing(format!("{:#}", err));
        }

        let message = format!("{:#}", err);
        if let Some(status) = parse_http_status(&message) {
            return ImportError::from_status(status, message);
        }

        if err.downcast_ref::<std::io::Error>().is_some() {
            return ImportError::host_operation(message);
        }

        ImportError::Unknown { message }
    }

    /// 归一化存储协作方的失败
    ///
    /// 已分类的错误原样透传；其余一律归为宿主存储失败，
    /// 存储实现拒绝写入的任何理由都不落入未知错误
    pub fn classify_host(err: anyhow::Error) -> Self {
        match err.downcast::<ImportError>() {
            Ok(classified) => classified,
            Err(err) => ImportError::host_operation(format!("{:#}", err)),
        }
    }
}

fn classify_reqwest(err: &reqwest::Error) -> ImportError {
    if let Some(status) = err.status() {
        return ImportError::from_status(status.as_u16(), err.to_string());
    }
    if err.is_decode() {
        return ImportError::parsing(err.to_string());
    }
    ImportError::network(err.to_string())
}

impl From<reqwest::Error> for ImportError {
    fn from(err: reqwest::Error) -> Self {
        classify_reqwest(&err)
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::parsing(err.to_string())
    }
}

/// 从错误消息中提取 HTTP 状态码
///
/// 识别 `HTTP error ... status: <code>` 形式的消息
fn parse_http_status(message: &str) -> Option<u16> {
    let re = Regex::new(r"HTTP error.*?status:\s*(\d{3})").ok()?;
    let caps = re.captures(message)?;
    caps.get(1)?.as_str().parse().ok()
}

/// 导入结果类型别名
pub type ImportResult<T> = Result<T, ImportError>;
