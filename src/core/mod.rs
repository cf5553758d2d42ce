//! 核心算法模块
//!
//! 分片计量与DR计算。

pub mod dr_calculator;
pub mod fragment_meter;
pub mod peak_selection;

// 重新导出公共接口
pub use dr_calculator::{ChannelOutcome, DrAnalysis, DrCalculator, DrResult, to_db};
pub use fragment_meter::{FragmentMeter, FragmentSeries};
pub use peak_selection::PeakPair;
