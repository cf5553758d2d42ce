//! 输入扫描模块
//!
//! 把命令行参数展开为输入列表：文件原样保留，目录展开为其中的音频文件，`-` 表示标准输入。

use super::cli::AppConfig;
use super::utils;
use crate::audio::UniversalDecoder;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 单个分析输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    /// 报告中显示的名称
    pub fn label(&self) -> String {
        match self {
            Self::Stdin => "<stdin>".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }

    /// 简短名称（进度/日志）
    pub fn short_label(&self) -> String {
        match self {
            Self::Stdin => "<stdin>".to_string(),
            Self::File(path) => utils::extract_filename_lossy(path),
        }
    }
}

/// 扫描目录中的音频文件（按路径排序）
pub fn scan_audio_files(dir_path: &Path, recursive: bool) -> Vec<PathBuf> {
    let decoder = UniversalDecoder::new();
    let max_depth = if recursive { usize::MAX } else { 1 };

    let mut audio_files: Vec<PathBuf> = WalkDir::new(dir_path)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                eprintln!("[WARNING] 无法访问 / Cannot access: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && decoder.can_decode(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    audio_files.sort();
    audio_files
}

/// 展开命令行输入
///
/// 不存在的路径原样保留，打开时以I/O错误报告，不影响其他输入。
pub fn resolve_inputs(config: &AppConfig) -> Vec<InputSource> {
    if config.reads_stdin_only() {
        return vec![InputSource::Stdin];
    }

    let mut inputs = Vec::new();
    for path in &config.inputs {
        if AppConfig::is_stdin_arg(path) {
            inputs.push(InputSource::Stdin);
        } else if path.is_dir() {
            let files = scan_audio_files(path, config.recursive);
            if files.is_empty() {
                let decoder = UniversalDecoder::new();
                eprintln!(
                    "[WARNING] 目录中没有支持的音频文件 / No supported audio files in: {}",
                    path.display()
                );
                eprintln!(
                    "   支持的格式 / Supported formats: {}",
                    decoder.supported_formats().extensions.join(", ").to_uppercase()
                );
            } else if config.verbose {
                eprintln!(
                    "[INFO] 扫描目录 / Scanned {}: {} 个文件 / files",
                    path.display(),
                    files.len()
                );
            }
            inputs.extend(files.into_iter().map(InputSource::File));
        } else {
            inputs.push(InputSource::File(path.clone()));
        }
    }
    inputs
}
