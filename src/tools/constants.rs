//! 常量和默认配置集中管理
//!
//! 将所有重要常量集中定义，避免"默认值漂移"和重复定义

/// DR分析算法常量
pub mod dr_analysis {
    /// 分片时长（秒）
    ///
    /// 固定3秒窗口，与经典DR测量保持一致
    pub const FRAGMENT_DURATION_SECONDS: f64 = 3.0;

    /// RMS平方和加倍因子（正弦参考的整流补偿，改动会改变DR分数）
    pub const RMS_SUM_DOUBLING: f64 = 2.0;

    /// 参与RMS评分的分片比例为 1/TOP_FRAGMENT_DIVISOR（即最响的20%）
    pub const TOP_FRAGMENT_DIVISOR: usize = 5;
}

/// 硬上限
pub mod limits {
    /// 最大分片数（3秒 × 32768 ≈ 27小时）
    pub const MAX_FRAGMENTS: usize = 32768;
}

/// 默认配置值
pub mod defaults {
    /// 默认多文件并行并发度（`--parallel-files` 不带值时）
    pub const PARALLEL_FILES_DEGREE: usize = 4;

    /// 同上，供clap的 `default_missing_value` 使用（必须与数值保持一致）
    pub const PARALLEL_FILES_DEGREE_STR: &str = "4";

    /// 进度行刷新间隔（分片数）
    pub const PROGRESS_EVERY_FRAGMENTS: usize = 4;
}

/// 并发度限制常量
pub mod parallel_limits {
    /// 最小并发度
    pub const MIN_PARALLEL_DEGREE: usize = 1;

    /// 最大并发度
    pub const MAX_PARALLEL_DEGREE: usize = 16;
}
