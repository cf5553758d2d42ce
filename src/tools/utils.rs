//! 工具函数模块
//!
//! 提供dB显示、文件路径处理、并发度计算和进度行等通用工具函数。

use super::constants::{defaults, parallel_limits};

/// 音频值转换工具函数
pub mod audio {
    use crate::core::to_db;

    /// 将线性值转换为格式化的dB字符串，0没有dB表示
    #[inline]
    pub fn db_string(value: f64, width: usize) -> String {
        match to_db(value) {
            Some(db) => format!("{db:width$.2}"),
            None => format!("{:>width$}", "-inf"),
        }
    }
}

/// 文件路径处理工具函数
pub mod path {
    use std::path::Path;

    /// 提取文件名（返回String，用于日志显示）
    #[inline]
    pub fn extract_filename_lossy(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string())
    }
}

/// 计算有效并发度：限制在允许范围内，且不超过文件数
pub fn effective_parallel_degree(requested: usize, file_count: Option<usize>) -> usize {
    let degree = requested.clamp(
        parallel_limits::MIN_PARALLEL_DEGREE,
        parallel_limits::MAX_PARALLEL_DEGREE,
    );
    match file_count {
        Some(count) if count > 0 => degree.min(count),
        _ => degree,
    }
}

/// 秒数格式化为 `mm:ss`
pub fn format_mm_ss(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:2}:{:02}", total / 60, total % 60)
}

const THROBBER: [char; 4] = ['|', '/', '-', '\\'];

/// stderr进度行（旋转指示符 + 已处理时长）
#[derive(Debug)]
pub struct ProgressLine {
    enabled: bool,
    stage: usize,
}

impl ProgressLine {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, stage: 0 }
    }

    /// 每处理完一批分片调用一次，按固定间隔刷新
    pub fn tick(&mut self, processed_seconds: f64) {
        if !self.enabled {
            return;
        }
        if self.stage % defaults::PROGRESS_EVERY_FRAGMENTS == 0 {
            let glyph = THROBBER[(self.stage / defaults::PROGRESS_EVERY_FRAGMENTS) % THROBBER.len()];
            eprint!(
                "\x1b[1K\x1b[1G {glyph}  {} ",
                format_mm_ss(processed_seconds)
            );
        }
        self.stage = self.stage.wrapping_add(1);
    }

    /// 结束进度行（换行）
    pub fn finish(&mut self, processed_seconds: f64) {
        if self.enabled {
            eprintln!("\x1b[1K\x1b[1G    {} ", format_mm_ss(processed_seconds));
        }
    }
}

// 重新导出为平级函数
pub use audio::db_string;
pub use path::extract_filename_lossy;
