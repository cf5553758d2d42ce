//! 工具模块集合
//!
//! 包含CLI、输入扫描、单输入管线、格式化等工具模块，支持main.rs的流程控制。

pub mod batch_state;
pub mod cli;
pub mod constants;
pub mod formatter;
pub mod parallel_processor;
pub mod processor;
pub mod scanner;
pub mod utils;

// 重新导出主要的公共接口
pub use batch_state::{BatchOutput, BatchStats, BatchStatsSnapshot};
pub use cli::{AppConfig, parse_args, parse_args_from, show_startup_info};
pub use formatter::{create_output_header, format_text_report, write_output};
pub use parallel_processor::process_batch_parallel;
pub use processor::{AnalysisOutput, analyze_input, analyze_path, analyze_stdin, analyze_stream};
pub use scanner::{InputSource, resolve_inputs, scan_audio_files};
