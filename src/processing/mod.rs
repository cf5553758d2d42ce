//! 样本处理模块
//!
//! 目前只有格式转换：原始PCM字节 → 归一化幅度。

pub mod sample_conversion;

pub use sample_conversion::{SampleFormat, denormalize, normalize};
