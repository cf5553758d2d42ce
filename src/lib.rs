//! StreamDR Meter - 流式音频动态范围测量
//!
//! 把任意长度的压缩音频包序列变成交错PCM字节流，再以3秒分片统计每声道的
//! 峰值与RMS，得到DR分数。
//!
//! ## 核心特性
//! - 解码状态机：部分消耗、解码延迟、流末冲刷，字节级 `read(n)` 拉取接口
//! - 样本归一化：U8 / S16 / S32 / F32 / F64
//! - 分片RMS：RMS = sqrt(2 * Σ(smp²)/n)
//! - 上位20%分片RMS与次峰(Pk_2nd)选择
//! - 基于symphonia的容器/编解码支持，文件与标准输入统一处理

pub mod audio;
pub mod core;
pub mod error;
pub mod processing;
pub mod tools;

// 重新导出核心类型
pub use audio::{AudioFormat, SampleDecoder, StreamBuffer, UniversalDecoder};
pub use core::{ChannelOutcome, DrAnalysis, DrCalculator, DrResult, FragmentMeter, FragmentSeries};
pub use error::{AudioError, AudioResult};
pub use processing::SampleFormat;
