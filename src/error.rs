//! 统一错误处理框架
//!
//! 每个输入文件的致命错误都在这里分类，CLI据此映射退出码。
//! 数值退化（静音、分片不足）不是错误，由 `core::dr_calculator::ChannelOutcome` 表达。

use std::fmt;
use std::io;

/// 音频处理相关的统一错误类型
#[derive(Debug)]
pub enum AudioError {
    /// 调用方误用（状态机非法调用、参数无效）
    InvalidInput(String),

    /// 文件I/O错误
    IoError(io::Error),

    /// 容器/流探测错误（打开失败、找不到音频轨道）
    FormatError(String),

    /// 解码错误（解复用或解码调用失败）
    DecodingError(String),

    /// 不支持的样本格式（在处理任何样本之前报告）
    UnsupportedSampleFormat(String),

    /// 声道数超过上限
    TooManyChannels { channels: usize, max: usize },

    /// 分片数超过上限（输入过长）
    InputTooLong {
        max_fragments: usize,
        max_seconds: f64,
    },

    /// 计算异常
    CalculationError(String),
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::InvalidInput(msg) => write!(f, "输入验证失败 / Invalid input: {msg}"),
            AudioError::IoError(err) => write!(f, "文件I/O错误 / I/O error: {err}"),
            AudioError::FormatError(msg) => write!(f, "音频格式错误 / Format error: {msg}"),
            AudioError::DecodingError(msg) => write!(f, "音频解码失败 / Decoding failed: {msg}"),
            AudioError::UnsupportedSampleFormat(msg) => {
                write!(f, "不支持的样本格式 / Unsupported sample format: {msg}")
            }
            AudioError::TooManyChannels { channels, max } => write!(
                f,
                "声道数过多 / Too many channels: {channels} (最大 / max {max})"
            ),
            AudioError::InputTooLong {
                max_fragments,
                max_seconds,
            } => write!(
                f,
                "输入过长 / Input too long: 超过 {max_fragments} 个分片 / more than {max_fragments} fragments (最大时长 / max length {max_seconds:.0}s)"
            ),
            AudioError::CalculationError(msg) => write!(f, "计算异常 / Calculation error: {msg}"),
        }
    }
}

impl std::error::Error for AudioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AudioError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for AudioError {
    fn from(err: io::Error) -> Self {
        AudioError::IoError(err)
    }
}

/// 音频处理操作的标准Result类型
pub type AudioResult<T> = Result<T, AudioError>;

// ==================== 错误转换Helper函数 ====================

/// 创建格式错误的helper函数
#[inline]
pub fn format_error<E: fmt::Display>(context: &str, err: E) -> AudioError {
    AudioError::FormatError(format!("{context}: {err}"))
}

/// 创建解码错误的helper函数
#[inline]
pub fn decoding_error<E: fmt::Display>(context: &str, err: E) -> AudioError {
    AudioError::DecodingError(format!("{context}: {err}"))
}

/// 创建计算错误的helper函数
#[inline]
pub fn calculation_error<E: fmt::Display>(context: &str, err: E) -> AudioError {
    AudioError::CalculationError(format!("{context}: {err}"))
}

// ==================== 错误分类系统 ====================

/// 错误类别枚举（用于多文件统计与退出码映射）
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum ErrorCategory {
    /// 容器或样本格式不受支持
    Format,
    /// 解码器失败
    Decoding,
    /// 声道数、分片数等硬上限
    Limit,
    /// I/O相关错误
    Io,
    /// 计算相关错误
    Calculation,
    /// 其他未分类错误
    Other,
}

impl ErrorCategory {
    /// 从AudioError提取错误类别
    pub fn from_audio_error(e: &AudioError) -> Self {
        match e {
            AudioError::FormatError(_) | AudioError::UnsupportedSampleFormat(_) => Self::Format,
            AudioError::DecodingError(_) => Self::Decoding,
            AudioError::TooManyChannels { .. } | AudioError::InputTooLong { .. } => Self::Limit,
            AudioError::IoError(_) => Self::Io,
            AudioError::CalculationError(_) => Self::Calculation,
            AudioError::InvalidInput(_) => Self::Other,
        }
    }

    /// 获取错误类别的显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Format => "格式错误 / format",
            Self::Decoding => "解码错误 / decoding",
            Self::Limit => "超出限制 / limit",
            Self::Io => "I/O错误 / I/O",
            Self::Calculation => "计算错误 / calculation",
            Self::Other => "其他错误 / other",
        }
    }
}
