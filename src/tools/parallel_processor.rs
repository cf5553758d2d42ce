//! 多输入并行处理模块
//!
//! 使用rayon实现输入级并行：每个输入仍是独立的串行管线，结果按输入顺序返回。

use super::cli::AppConfig;
use super::processor::{AnalysisOutput, analyze_input};
use super::scanner::InputSource;
use crate::error::{AudioError, AudioResult};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 多输入并行处理
///
/// 工作线程内关闭verbose（进度行会相互覆盖），完成情况以单行形式报告到stderr。
pub fn process_batch_parallel(
    inputs: &[InputSource],
    config: &AppConfig,
    parallel_degree: usize,
) -> AudioResult<Vec<AudioResult<AnalysisOutput>>> {
    if config.verbose {
        eprintln!("[INFO] 多输入并行处理 / Parallel analysis: {parallel_degree} 并发度 / workers");
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(parallel_degree)
        .thread_name(|i| format!("dr-worker-{i}"))
        .build()
        .map_err(|e| AudioError::IoError(std::io::Error::other(format!("线程池创建失败 / thread pool: {e}"))))?;

    let completed = AtomicUsize::new(0);
    let silent_config = AppConfig {
        verbose: false,
        ..config.clone()
    };

    // par_iter + collect 保持输入顺序
    let results = pool.install(|| {
        inputs
            .par_iter()
            .map(|input| {
                let result = analyze_input(input, &silent_config);
                let count = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if config.verbose {
                    let mark = if result.is_ok() { "OK" } else { "FAIL" };
                    eprintln!(
                        "[{mark}] [{count}/{}] {}",
                        inputs.len(),
                        input.short_label()
                    );
                }
                result
            })
            .collect()
    });

    Ok(results)
}
