//! StreamDR Meter - 主程序入口
//!
//! 纯流程控制器，负责协调各个工具模块完成DR分析任务。

use std::process;
use streamdr_meter::{
    audio::UniversalDecoder,
    error::{AudioError, AudioResult, ErrorCategory},
    tools::{self, AnalysisOutput, AppConfig, InputSource},
};

/// 错误退出码定义
mod exit_codes {
    /// 通用错误（含I/O）
    pub const GENERAL_ERROR: i32 = 1;
    /// 无法打开/探测的容器，或找不到音频流
    pub const FORMAT_ERROR: i32 = 2;
    /// 解码失败
    pub const DECODING_ERROR: i32 = 3;
    /// 声道数过多
    pub const TOO_MANY_CHANNELS: i32 = 4;
    /// 解码器输出不支持的样本格式
    pub const UNSUPPORTED_SAMPLE_FORMAT: i32 = 5;
    /// 输入过长
    pub const INPUT_TOO_LONG: i32 = 240;
    /// 命令行用法错误
    pub const USAGE_ERROR: i32 = 64;
}

/// 错误对应的退出码
fn exit_code_for(error: &AudioError) -> i32 {
    match error {
        AudioError::TooManyChannels { .. } => exit_codes::TOO_MANY_CHANNELS,
        AudioError::InputTooLong { .. } => exit_codes::INPUT_TOO_LONG,
        AudioError::UnsupportedSampleFormat(_) => exit_codes::UNSUPPORTED_SAMPLE_FORMAT,
        AudioError::FormatError(_) => exit_codes::FORMAT_ERROR,
        AudioError::DecodingError(_) => exit_codes::DECODING_ERROR,
        AudioError::InvalidInput(_) | AudioError::IoError(_) | AudioError::CalculationError(_) => {
            exit_codes::GENERAL_ERROR
        }
    }
}

/// 获取错误建议文本
fn get_error_suggestion(error: &AudioError) -> &'static str {
    match error {
        AudioError::TooManyChannels { .. } => {
            "声道数超出支持范围，请先下混或拆分声道 / Channel count exceeds the supported maximum, downmix or split first"
        }
        AudioError::InputTooLong { .. } => {
            "输入超过最大时长，请拆分后分别分析 / Input exceeds the maximum length, split it and analyse the parts"
        }
        _ => match ErrorCategory::from_audio_error(error) {
            ErrorCategory::Io => {
                "检查文件路径是否正确，文件是否存在且可读 / Check if file path is correct, file exists and is readable"
            }
            ErrorCategory::Format => {
                "确保输入文件为支持的格式 / Ensure input file is in a supported format"
            }
            ErrorCategory::Decoding => {
                "文件可能损坏或使用不支持的音频编码 / File may be corrupted or use unsupported audio encoding"
            }
            ErrorCategory::Calculation => {
                "计算过程出现异常，请检查音频文件是否包含有效数据 / Calculation error occurred, check if audio file contains valid data"
            }
            ErrorCategory::Limit | ErrorCategory::Other => {
                "请检查输入文件和参数设置 / Please check input file and parameter settings"
            }
        },
    }
}

/// 报告单个输入的失败（不退出，继续处理其他输入）
fn report_error(input: &InputSource, error: &AudioError, config: &AppConfig) {
    eprintln!("[ERROR] {}: {error}", input.label());

    let category = ErrorCategory::from_audio_error(error);
    if config.verbose {
        eprintln!("      类别 / Category: {}", category.display_name());
        if let Some(source) = std::error::Error::source(error) {
            eprintln!("      原因 / Cause: {source}");
        }
    }
    eprintln!("[INFO] 建议 / Suggestion: {}", get_error_suggestion(error));

    // 对于格式错误，额外显示支持的格式列表
    if matches!(category, ErrorCategory::Format) {
        let formats = UniversalDecoder::new().supported_formats();
        let uppercase_formats: Vec<String> = formats
            .extensions
            .iter()
            .map(|s| s.to_uppercase())
            .collect();
        eprintln!(
            "   Supported formats / 支持的格式: {}",
            uppercase_formats.join(", ")
        );
    }
}

/// 应用程序主逻辑，返回退出码
fn run(config: &AppConfig) -> i32 {
    tools::show_startup_info(config);

    let inputs = tools::resolve_inputs(config);
    if inputs.is_empty() {
        eprintln!("[ERROR] 没有可分析的输入 / Nothing to analyse");
        return exit_codes::GENERAL_ERROR;
    }

    let mut first_failure: Option<i32> = None;
    let mut batch = tools::BatchOutput::new(config);
    let mut accept = |input: &InputSource, result: AudioResult<AnalysisOutput>| {
        if let Err(e) = &result {
            report_error(input, e, config);
            first_failure.get_or_insert(exit_code_for(e));
        }
        batch.accept(input, result);
    };

    let degree = config
        .parallel_files
        .map(|degree| tools::utils::effective_parallel_degree(degree, Some(inputs.len())))
        .unwrap_or(1);

    if degree > 1 {
        match tools::process_batch_parallel(&inputs, config, degree) {
            Ok(results) => {
                for (input, result) in inputs.iter().zip(results) {
                    accept(input, result);
                }
            }
            Err(e) => {
                eprintln!(
                    "[WARNING] 并行处理失败 / Parallel processing failed: {e}，回退到串行模式 / fallback to serial"
                );
                for input in &inputs {
                    accept(input, tools::analyze_input(input, config));
                }
            }
        }
    } else {
        for (index, input) in inputs.iter().enumerate() {
            if config.verbose && inputs.len() > 1 {
                eprintln!(
                    "[PROCESSING] [{}/{}] 处理 / Processing: {}",
                    index + 1,
                    inputs.len(),
                    input.short_label()
                );
            }
            accept(input, tools::analyze_input(input, config));
        }
    }

    if let Err(e) = batch.finish() {
        eprintln!("[ERROR] 输出失败 / Output failed: {e}");
        first_failure.get_or_insert(exit_code_for(&e));
    }

    first_failure.unwrap_or(0)
}

fn main() {
    let config = match tools::parse_args() {
        Ok(config) => config,
        Err(e) => {
            // --help / --version 走这里，属于正常退出
            let _ = e.print();
            let code = if e.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                0
            };
            process::exit(code);
        }
    };

    process::exit(run(&config));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_distinct_per_fatal_class() {
        assert_eq!(
            exit_code_for(&AudioError::TooManyChannels {
                channels: 40,
                max: 32
            }),
            4
        );
        assert_eq!(
            exit_code_for(&AudioError::InputTooLong {
                max_fragments: 32768,
                max_seconds: 98304.0
            }),
            240
        );
        assert_eq!(
            exit_code_for(&AudioError::UnsupportedSampleFormat("U24".to_string())),
            5
        );
        assert_eq!(exit_code_for(&AudioError::FormatError("x".to_string())), 2);
        assert_ne!(
            exit_code_for(&AudioError::UnsupportedSampleFormat("U24".to_string())),
            exit_code_for(&AudioError::FormatError("probe failed".to_string()))
        );
        assert_eq!(exit_code_for(&AudioError::DecodingError("x".to_string())), 3);
        assert_eq!(
            exit_code_for(&AudioError::IoError(std::io::Error::other("x"))),
            1
        );
    }
}
