//! 批处理状态管理模块
//!
//! 统计成功/失败数量并按输入顺序汇总报告（stdout文本、JSON文档、`--output` 文件）。

use super::cli::AppConfig;
use super::formatter::{self, JsonFileReport};
use super::processor::AnalysisOutput;
use super::scanner::InputSource;
use crate::error::{AudioResult, ErrorCategory};
use std::collections::HashMap;

/// 批处理统计快照
#[derive(Debug, Clone)]
pub struct BatchStatsSnapshot {
    /// 成功处理的输入数
    pub processed: usize,
    /// 失败的输入数
    pub failed: usize,
    /// 错误分类统计（错误类型 -> 失败输入列表）
    pub error_stats: HashMap<ErrorCategory, Vec<String>>,
}

/// 批处理统计
#[derive(Debug, Default)]
pub struct BatchStats {
    processed: usize,
    failed: usize,
    error_stats: HashMap<ErrorCategory, Vec<String>>,
}

impl BatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 增加成功处理计数
    #[inline]
    pub fn inc_processed(&mut self) -> usize {
        self.processed += 1;
        self.processed
    }

    /// 增加失败计数并记录错误分类
    #[inline]
    pub fn inc_failed(&mut self, category: ErrorCategory, name: String) -> usize {
        self.failed += 1;
        self.error_stats.entry(category).or_default().push(name);
        self.failed
    }

    /// 获取统计快照
    pub fn snapshot(&self) -> BatchStatsSnapshot {
        BatchStatsSnapshot {
            processed: self.processed,
            failed: self.failed,
            error_stats: self.error_stats.clone(),
        }
    }
}

/// 生成统计摘要（用于 `--output` 文件尾部和verbose输出）
pub fn create_batch_summary(snapshot: &BatchStatsSnapshot) -> String {
    let total = snapshot.processed + snapshot.failed;
    let mut output = String::new();
    output.push_str(&format!(
        "处理统计 / Summary: {} / {} 成功 / succeeded\n",
        snapshot.processed, total
    ));

    // 固定顺序输出，避免HashMap迭代顺序带来的抖动
    let mut categories: Vec<_> = snapshot.error_stats.iter().collect();
    categories.sort_by_key(|(category, _)| category.display_name());
    for (category, names) in categories {
        output.push_str(&format!(
            "   [{}] {}: {}\n",
            category.display_name(),
            names.len(),
            names.join(", ")
        ));
    }
    output
}

/// 按输入顺序接收结果并汇总输出
pub struct BatchOutput<'c> {
    config: &'c AppConfig,
    show_names: bool,
    stats: BatchStats,
    text_log: String,
    json_entries: Vec<(String, AudioResult<AnalysisOutput>)>,
}

impl<'c> BatchOutput<'c> {
    pub fn new(config: &'c AppConfig) -> Self {
        Self {
            config,
            show_names: !config.reads_stdin_only(),
            stats: BatchStats::new(),
            text_log: String::new(),
            json_entries: Vec::new(),
        }
    }

    /// 接收一个输入的结果（文本模式下立即打印）
    pub fn accept(&mut self, input: &InputSource, result: AudioResult<AnalysisOutput>) {
        let label = input.label();
        let name = self.show_names.then_some(label.as_str());

        match &result {
            Ok(output) => {
                self.stats.inc_processed();
                let report = formatter::format_text_report(output, name);
                if !self.config.json {
                    print!("{report}");
                    if self.show_names {
                        println!();
                    }
                }
                self.text_log.push_str(&report);
            }
            Err(e) => {
                self.stats
                    .inc_failed(ErrorCategory::from_audio_error(e), input.short_label());
                self.text_log
                    .push_str(&formatter::format_failure_report(name, e));
            }
        }
        self.text_log.push('\n');

        if self.config.json {
            self.json_entries.push((label, result));
        }
    }

    pub fn snapshot(&self) -> BatchStatsSnapshot {
        self.stats.snapshot()
    }

    /// 输出JSON文档、写入报告文件
    pub fn finish(self) -> AudioResult<BatchStatsSnapshot> {
        let snapshot = self.stats.snapshot();

        if self.config.json {
            let reports: Vec<JsonFileReport<'_>> = self
                .json_entries
                .iter()
                .map(|(label, result)| JsonFileReport::new(label.clone(), result))
                .collect();
            println!("{}", formatter::format_json_report(&reports)?);
        }

        let total = snapshot.processed + snapshot.failed;
        if let Some(path) = &self.config.output_path {
            let mut content = formatter::create_output_header();
            content.push_str(&self.text_log);
            if total > 1 {
                content.push_str(&create_batch_summary(&snapshot));
            }
            formatter::write_output(path, &content)?;
        }

        if self.config.verbose && total > 1 {
            eprint!("{}", create_batch_summary(&snapshot));
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AudioError;
    use std::path::PathBuf;

    #[test]
    fn test_stats_counting() {
        let mut stats = BatchStats::new();
        assert_eq!(stats.inc_processed(), 1);
        assert_eq!(stats.inc_failed(ErrorCategory::Decoding, "a.mp3".to_string()), 1);
        assert_eq!(stats.inc_failed(ErrorCategory::Decoding, "b.mp3".to_string()), 2);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.processed, 1);
        assert_eq!(snapshot.failed, 2);
        assert_eq!(snapshot.error_stats[&ErrorCategory::Decoding].len(), 2);

        let summary = create_batch_summary(&snapshot);
        assert!(summary.contains("1 / 3"));
        assert!(summary.contains("a.mp3, b.mp3"));
    }

    #[test]
    fn test_failures_recorded_in_output_file() {
        let path = std::env::temp_dir().join(format!(
            "streamdr_batch_output_{}.txt",
            std::process::id()
        ));
        let config = AppConfig {
            inputs: vec![PathBuf::from("x.flac"), PathBuf::from("y.flac")],
            output_path: Some(path.clone()),
            json: true,
            ..AppConfig::default()
        };

        let mut batch = BatchOutput::new(&config);
        batch.accept(
            &InputSource::File(PathBuf::from("x.flac")),
            Err(AudioError::FormatError("no track".to_string())),
        );
        batch.accept(
            &InputSource::File(PathBuf::from("y.flac")),
            Err(AudioError::DecodingError("bad frame".to_string())),
        );
        let snapshot = batch.finish().unwrap();
        assert_eq!(snapshot.failed, 2);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("log date: "));
        assert!(content.contains("x.flac\n[FAIL]"));
        assert!(content.contains("bad frame"));
        std::fs::remove_file(&path).ok();
    }
}
