//! 命令行接口模块
//!
//! 负责命令行参数解析、配置管理和程序信息展示。

use super::constants::{defaults, parallel_limits};
use clap::{Arg, ArgAction, Command, value_parser};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// 表示标准输入的参数
pub const STDIN_ARG: &str = "-";

/// 应用程序配置
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// 输入文件或目录（为空时读取标准输入）
    pub inputs: Vec<PathBuf>,

    /// 是否显示详细信息（含stderr进度行）
    pub verbose: bool,

    /// 以JSON输出结果
    pub json: bool,

    /// 额外写入文本报告的文件路径
    pub output_path: Option<PathBuf>,

    /// 目录参数是否递归扫描
    pub recursive: bool,

    /// 多文件并行并发度（None 表示串行）
    pub parallel_files: Option<usize>,
}

impl AppConfig {
    /// 没有给出任何路径参数
    #[inline]
    pub fn reads_stdin_only(&self) -> bool {
        self.inputs.is_empty()
    }

    /// 某个参数是否代表标准输入
    #[inline]
    pub fn is_stdin_arg(path: &Path) -> bool {
        path.as_os_str() == STDIN_ARG
    }
}

/// 构建命令行定义
pub fn build_command() -> Command {
    Command::new("streamdr")
        .version(VERSION)
        .about(DESCRIPTION)
        .author("MacinMeter Team")
        .arg(
            Arg::new("INPUT")
                .help("音频文件或目录路径，'-' 或省略表示标准输入 / Audio files or directories, '-' or none reads stdin")
                .num_args(0..)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("显示详细处理信息和进度 / Show detailed progress")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("以JSON格式输出结果 / Print results as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("同时将文本报告写入文件 / Also write the text report to FILE")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("recursive")
                .long("recursive")
                .short('r')
                .help("递归扫描目录 / Descend into subdirectories")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("parallel-files")
                .long("parallel-files")
                .help("多文件并行处理的并发度 / Number of files analysed concurrently")
                .value_name("N")
                .num_args(0..=1)
                .default_missing_value(defaults::PARALLEL_FILES_DEGREE_STR)
                .value_parser(
                    value_parser!(u64).range(
                        parallel_limits::MIN_PARALLEL_DEGREE as u64
                            ..=parallel_limits::MAX_PARALLEL_DEGREE as u64,
                    ),
                ),
        )
}

/// 从给定参数解析配置（用法错误以 `clap::Error` 返回，由调用方决定退出码）
pub fn parse_args_from<I, T>(args: I) -> Result<AppConfig, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_command().try_get_matches_from(args)?;

    Ok(AppConfig {
        inputs: matches
            .get_many::<PathBuf>("INPUT")
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
        verbose: matches.get_flag("verbose"),
        json: matches.get_flag("json"),
        output_path: matches.get_one::<PathBuf>("output").cloned(),
        recursive: matches.get_flag("recursive"),
        parallel_files: matches
            .get_one::<u64>("parallel-files")
            .map(|&degree| degree as usize),
    })
}

/// 解析进程命令行参数
pub fn parse_args() -> Result<AppConfig, clap::Error> {
    parse_args_from(std::env::args_os())
}

/// 显示程序启动信息（stderr，避免污染报告输出）
pub fn show_startup_info(config: &AppConfig) {
    if config.verbose {
        eprintln!("StreamDR Meter v{VERSION} 启动 / starting");
        eprintln!("{DESCRIPTION}");
    }
}
