//! symphonia错误映射
//!
//! 在适配器边界把symphonia错误转换为 `AudioError`，保留底层诊断信息。
//! 注意：此模块仅供 universal_decoder 内部使用

use crate::error::{self, AudioError};
use symphonia::core::errors::Error as SymphoniaError;

/// 容器读到结尾时symphonia以 `UnexpectedEof` 报告
pub(super) fn is_end_of_stream(err: &SymphoniaError) -> bool {
    matches!(err, SymphoniaError::IoError(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
}

/// 解复用/解码阶段的错误映射
pub(super) fn map_decode_error(context: &str, err: SymphoniaError) -> AudioError {
    match err {
        SymphoniaError::IoError(e) => AudioError::IoError(e),
        SymphoniaError::Unsupported(feature) => {
            error::format_error(context, format!("不支持 / unsupported: {feature}"))
        }
        other => error::decoding_error(context, other),
    }
}

/// 打开/探测阶段的错误映射（全部归为格式错误，I/O错误除外）
pub(super) fn map_open_error(context: &str, err: SymphoniaError) -> AudioError {
    match err {
        SymphoniaError::IoError(e) if e.kind() != std::io::ErrorKind::UnexpectedEof => {
            AudioError::IoError(e)
        }
        other => error::format_error(context, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eof_detection() {
        let eof = SymphoniaError::IoError(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "end of stream",
        ));
        assert!(is_end_of_stream(&eof));
        assert!(!is_end_of_stream(&SymphoniaError::DecodeError("bad")));
    }

    #[test]
    fn test_decode_error_keeps_message() {
        let err = map_decode_error("解码失败", SymphoniaError::DecodeError("invalid sync word"));
        assert!(matches!(err, AudioError::DecodingError(ref msg) if msg.contains("invalid sync word")));

        let err = map_decode_error("解码失败", SymphoniaError::Unsupported("feature"));
        assert!(matches!(err, AudioError::FormatError(_)));
    }

    #[test]
    fn test_open_error_is_format_error() {
        let err = map_open_error("格式探测失败", SymphoniaError::Unsupported("core (probe): no suitable format reader found"));
        assert!(matches!(err, AudioError::FormatError(_)));
    }
}
