//! 输出格式化模块
//!
//! 文本报告（逐声道行 + 整体DR）与JSON报告。

use super::cli::VERSION;
use super::processor::AnalysisOutput;
use super::utils::{self, db_string};
use crate::core::{DrResult, to_db};
use crate::error::{AudioError, AudioResult};
use serde::Serialize;
use std::path::Path;

/// 格式化单声道结果行
pub fn format_channel_line(result: &DrResult) -> String {
    match (result.dr_value, result.outcome.reason()) {
        (Some(dr), _) => format!(
            "Ch. {}:  Peak {} ({}) dB    RMS {} ({}) dB    DR = {dr:6.2}",
            result.channel,
            db_string(result.primary_peak, 8),
            db_string(result.peak, 8),
            db_string(result.raw_rms, 8),
            db_string(result.rms, 8),
        ),
        (None, reason) => format!(
            "Ch. {}:  {}",
            result.channel,
            reason.unwrap_or("无结果 / no result")
        ),
    }
}

/// 格式化整体DR行
pub fn format_overall_line(output: &AnalysisOutput) -> String {
    match output.analysis.overall {
        Some(dr) => format!("Overall dynamic range: DR{dr}"),
        None => format!(
            "Overall dynamic range: n/a ({})",
            output
                .analysis
                .overall_reason()
                .unwrap_or("无结果 / no result")
        ),
    }
}

/// 单输入的文本报告
///
/// `name` 为 `None` 时（只读标准输入）不输出文件名行。
pub fn format_text_report(output: &AnalysisOutput, name: Option<&str>) -> String {
    let mut report = String::new();
    if let Some(name) = name {
        report.push_str(name);
        report.push('\n');
    }
    for result in &output.analysis.channels {
        report.push_str(&format_channel_line(result));
        report.push('\n');
    }
    report.push_str(&format_overall_line(output));
    report.push('\n');
    report
}

/// 失败输入的文本报告
pub fn format_failure_report(name: Option<&str>, error: &AudioError) -> String {
    match name {
        Some(name) => format!("{name}\n[FAIL] {error}\n"),
        None => format!("[FAIL] {error}\n"),
    }
}

/// 输出文件头部信息（版本与时间戳）
pub fn create_output_header() -> String {
    let mut output = String::new();
    output.push_str(&format!("StreamDR Meter v{VERSION} / Dynamic Range Meter\n"));
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    output.push_str(&format!("log date: {now}\n"));
    output.push_str(
        "--------------------------------------------------------------------------------\n\n",
    );
    output
}

/// 写入报告文件
pub fn write_output(path: &Path, content: &str) -> AudioResult<()> {
    std::fs::write(path, content).map_err(AudioError::IoError)?;
    eprintln!(
        "[INFO] 结果已保存 / Results saved to: {}",
        utils::extract_filename_lossy(path)
    );
    Ok(())
}

/// JSON中的单声道条目（附带dB值）
#[derive(Debug, Serialize)]
struct JsonChannel<'a> {
    #[serde(flatten)]
    result: &'a DrResult,
    peak_db: Option<f64>,
    peak_2nd_db: Option<f64>,
    rms_db: Option<f64>,
    rms_top_db: Option<f64>,
    reason: Option<&'static str>,
}

/// JSON中的单输入条目
#[derive(Debug, Serialize)]
pub struct JsonFileReport<'a> {
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a crate::audio::AudioFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fragments: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    channels: Vec<JsonChannel<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    overall: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    overall_precise: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    overall_reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    decode_stats: Option<&'a crate::audio::DecodeStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> JsonFileReport<'a> {
    /// 由单输入的分析结果（或错误）构建JSON条目
    pub fn new(source: String, result: &'a AudioResult<AnalysisOutput>) -> Self {
        match result {
            Ok(output) => Self {
                source,
                format: Some(&output.format),
                duration_seconds: Some(output.duration_seconds),
                fragments: Some(output.fragments),
                channels: output
                    .analysis
                    .channels
                    .iter()
                    .map(|result| JsonChannel {
                        result,
                        peak_db: to_db(result.primary_peak),
                        peak_2nd_db: to_db(result.peak),
                        rms_db: to_db(result.raw_rms),
                        rms_top_db: to_db(result.rms),
                        reason: result.outcome.reason(),
                    })
                    .collect(),
                overall: output.analysis.overall,
                overall_precise: output.analysis.overall_precise,
                overall_reason: output.analysis.overall_reason(),
                decode_stats: Some(&output.decode_stats),
                error: None,
            },
            Err(e) => Self {
                source,
                format: None,
                duration_seconds: None,
                fragments: None,
                channels: Vec::new(),
                overall: None,
                overall_precise: None,
                overall_reason: None,
                decode_stats: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// JSON文档（所有输入，按输入顺序）
pub fn format_json_report(reports: &[JsonFileReport<'_>]) -> AudioResult<String> {
    #[derive(Serialize)]
    struct Document<'r, 'a> {
        tool: &'static str,
        version: &'static str,
        files: &'r [JsonFileReport<'a>],
    }

    serde_json::to_string_pretty(&Document {
        tool: "streamdr",
        version: VERSION,
        files: reports,
    })
    .map_err(|e| AudioError::IoError(e.into()))
}
