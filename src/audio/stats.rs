//! 解码统计模块
//!
//! 记录状态机推进过程中的包与PCM缓冲区统计，供verbose输出和测试断言使用。

use serde::Serialize;

/// 解码统计信息
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecodeStats {
    /// 提交给解码器的包数（选中流）
    pub packets_decoded: usize,
    /// 未解码即丢弃的包数（其他流的包，或选中流的空包）
    pub packets_skipped: usize,
    /// 解码器只消耗部分包数据的次数
    pub partial_decodes: usize,
    /// 产出的非空PCM缓冲区数量
    pub buffers: usize,
    /// 产出的PCM字节总数（含冲刷）
    pub decoded_bytes: u64,
    /// 冲刷阶段产出的PCM字节数
    pub flushed_bytes: u64,
    pub min_buffer: usize,
    pub max_buffer: usize,
}

impl DecodeStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个非空PCM缓冲区
    pub fn add_buffer(&mut self, size: usize) {
        if size == 0 {
            return;
        }
        self.min_buffer = if self.buffers == 0 {
            size
        } else {
            self.min_buffer.min(size)
        };
        self.max_buffer = self.max_buffer.max(size);
        self.buffers += 1;
        self.decoded_bytes = self.decoded_bytes.saturating_add(size as u64);
    }

    /// 平均缓冲区大小（字节）
    pub fn mean_buffer(&self) -> f64 {
        if self.buffers == 0 {
            0.0
        } else {
            self.decoded_bytes as f64 / self.buffers as f64
        }
    }
}
