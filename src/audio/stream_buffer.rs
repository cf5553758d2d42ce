//! 流式字节缓冲（解码状态机）
//!
//! 把"包 → 解码 → 变长PCM"的过程包装成只进不退的字节流：
//! 下游按任意长度 `read`，不需要关心包边界、部分消耗、解码延迟和冲刷。
//!
//! 状态转换：
//!
//! ```text
//! Initialized --open--> Open --包(选中流)--> ValidPacket --整包消耗--> Open
//!                         |                    |
//!                         |                    +--部分消耗--> ValidPacket(offset前进)
//!                         +--源结束--> NeedFlush --冲刷返回--> Closed
//! ```
//!
//! 任意状态下解码失败：立即返回错误，状态保持调用前的值。

use super::format::AudioFormat;
use super::stats::DecodeStats;
use super::streaming::{Packet, SampleDecoder};
use crate::error::{AudioError, AudioResult};

#[cfg(debug_assertions)]
macro_rules! debug_decode {
    ($($arg:tt)*) => {
        eprintln!("[DECODE_DEBUG] {}", format_args!($($arg)*));
    };
}

#[cfg(not(debug_assertions))]
macro_rules! debug_decode {
    ($($arg:tt)*) => {};
}

/// 解码状态
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DecodeState {
    /// 转换计算期间的占位值，调用返回后不可见
    #[default]
    Uninitialized,
    /// 解码器已绑定，媒体源尚未打开
    Initialized,
    /// 源已打开，等待下一个包
    Open,
    /// 正在提交一个包，`offset` 之前的字节已被解码器消耗
    ValidPacket { packet: Packet, offset: usize },
    /// 源已结束，下一次解码为冲刷调用
    NeedFlush,
    /// 冲刷完成，编解码器已释放
    Closed,
}

impl DecodeState {
    pub fn name(&self) -> &'static str {
        match self {
            DecodeState::Uninitialized => "Uninitialized",
            DecodeState::Initialized => "Initialized",
            DecodeState::Open => "Open",
            DecodeState::ValidPacket { .. } => "ValidPacket",
            DecodeState::NeedFlush => "NeedFlush",
            DecodeState::Closed => "Closed",
        }
    }
}

/// 流式字节缓冲
///
/// 拥有解码器句柄，保证在任何退出路径上恰好释放一次：
/// 冲刷完成、显式 `close()`、`open()` 失败，或者被丢弃（中途出错）。
pub struct StreamBuffer<D: SampleDecoder> {
    decoder: D,
    state: DecodeState,
    format: Option<AudioFormat>,
    /// 最近解码出的PCM字节，`cursor` 之前的部分已被读走
    buffer: Vec<u8>,
    cursor: usize,
    released: bool,
    stats: DecodeStats,
}

impl<D: SampleDecoder> StreamBuffer<D> {
    /// 绑定解码器，状态为 `Initialized`
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            state: DecodeState::Initialized,
            format: None,
            buffer: Vec::new(),
            cursor: 0,
            released: false,
            stats: DecodeStats::new(),
        }
    }

    /// 打开媒体源并发现音频流（`Initialized → Open`）
    ///
    /// 校验声道数上限；失败时释放解码器，状态不变。
    pub fn open(&mut self) -> AudioResult<&AudioFormat> {
        if self.state != DecodeState::Initialized || self.released {
            return Err(AudioError::InvalidInput(format!(
                "只能在 Initialized 状态打开流 / stream can only be opened once (state: {})",
                self.state.name()
            )));
        }

        let opened = self.decoder.open().and_then(|format| {
            format.validate()?;
            Ok(format)
        });

        match opened {
            Ok(format) => {
                self.state = DecodeState::Open;
                Ok(&*self.format.insert(format))
            }
            Err(e) => {
                self.release_decoder();
                Err(e)
            }
        }
    }

    /// 产出至多一个新的解码缓冲区
    ///
    /// - `Ok(true)` - 有新的PCM字节可读
    /// - `Ok(false)` - 已 `Closed`，不会再有数据
    /// - `Err(_)` - 解码/解复用失败，状态保持不变，流应视为不可用
    pub fn refill(&mut self) -> AudioResult<bool> {
        // 丢弃已读部分，未读字节保留在前面
        self.buffer.drain(..self.cursor);
        self.cursor = 0;

        loop {
            match std::mem::take(&mut self.state) {
                DecodeState::Closed => {
                    self.state = DecodeState::Closed;
                    return Ok(false);
                }
                state @ (DecodeState::Uninitialized | DecodeState::Initialized) => {
                    let name = state.name();
                    self.state = state;
                    return Err(AudioError::InvalidInput(format!(
                        "流尚未打开 / stream not opened (state: {name})"
                    )));
                }
                DecodeState::Open => self.advance_open()?,
                DecodeState::ValidPacket { packet, offset } => {
                    if self.decode_packet(packet, offset)? {
                        return Ok(true);
                    }
                }
                DecodeState::NeedFlush => return self.flush(),
            }
        }
    }

    /// `Open` 状态：读取下一个包
    fn advance_open(&mut self) -> AudioResult<()> {
        match self.decoder.read_packet() {
            Ok(Some(packet)) if packet.stream_id != self.decoder.selected_stream() => {
                self.stats.packets_skipped += 1;
                self.state = DecodeState::Open;
            }
            Ok(Some(packet)) if packet.data.is_empty() => {
                // 空包：没有可提交的数据，且空输入会被解释为冲刷
                self.stats.packets_skipped += 1;
                self.state = DecodeState::Open;
            }
            Ok(Some(packet)) => {
                self.state = DecodeState::ValidPacket { packet, offset: 0 };
            }
            Ok(None) => {
                debug_decode!("源结束，进入冲刷阶段 / end of source, flushing");
                self.state = DecodeState::NeedFlush;
            }
            Err(e) => {
                self.state = DecodeState::Open;
                return Err(e);
            }
        }
        Ok(())
    }

    /// `ValidPacket` 状态：提交包的剩余部分，返回本次是否产出了PCM
    ///
    /// 每次成功返回要么剩余字节严格减少，要么状态回到 `Open`。
    fn decode_packet(&mut self, packet: Packet, offset: usize) -> AudioResult<bool> {
        let remaining = packet.data.len() - offset;
        let before = self.buffer.len();

        let consumed = match self.decoder.decode(&packet.data[offset..], &mut self.buffer) {
            Ok(0) => {
                self.buffer.truncate(before);
                self.state = DecodeState::ValidPacket { packet, offset };
                return Err(AudioError::DecodingError(format!(
                    "解码器未消耗任何数据 / decoder made no progress ({remaining} bytes pending)"
                )));
            }
            Ok(consumed) => consumed.min(remaining),
            Err(e) => {
                self.buffer.truncate(before);
                self.state = DecodeState::ValidPacket { packet, offset };
                return Err(e);
            }
        };

        if consumed < remaining {
            self.stats.partial_decodes += 1;
            self.state = DecodeState::ValidPacket {
                packet,
                offset: offset + consumed,
            };
        } else {
            self.stats.packets_decoded += 1;
            self.state = DecodeState::Open;
        }

        let produced = self.buffer.len() - before;
        self.stats.add_buffer(produced);
        Ok(produced > 0)
    }

    /// `NeedFlush` 状态：提交空包，无论是否有尾部样本都进入 `Closed`
    fn flush(&mut self) -> AudioResult<bool> {
        let before = self.buffer.len();
        if let Err(e) = self.decoder.decode(&[], &mut self.buffer) {
            self.buffer.truncate(before);
            self.state = DecodeState::NeedFlush;
            return Err(e);
        }

        self.release_decoder();
        self.state = DecodeState::Closed;

        let produced = self.buffer.len() - before;
        self.stats.add_buffer(produced);
        self.stats.flushed_bytes += produced as u64;
        debug_decode!("冲刷完成 / flush done: {produced} bytes");
        Ok(produced > 0)
    }

    /// 读取至多 `out.len()` 字节，按需透明地 `refill`
    ///
    /// 返回实际读取的字节数，只有到达真正的流末尾时才会少于请求值。
    pub fn read(&mut self, out: &mut [u8]) -> AudioResult<usize> {
        let mut written = 0;
        while written < out.len() {
            if self.cursor >= self.buffer.len() {
                if !self.refill()? {
                    break;
                }
                continue;
            }
            let available = &self.buffer[self.cursor..];
            let n = available.len().min(out.len() - written);
            out[written..written + n].copy_from_slice(&available[..n]);
            self.cursor += n;
            written += n;
        }
        Ok(written)
    }

    /// 状态为 `Closed` 时为真
    pub fn is_end_of_stream(&self) -> bool {
        self.state == DecodeState::Closed
    }

    /// 提前结束：释放解码器并进入 `Closed`（幂等）
    pub fn close(&mut self) {
        self.release_decoder();
        self.state = DecodeState::Closed;
    }

    pub fn state(&self) -> &DecodeState {
        &self.state
    }

    /// 打开后报告的格式；未打开时为 `None`
    pub fn format(&self) -> Option<&AudioFormat> {
        self.format.as_ref()
    }

    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    /// 已解码但尚未读取的字节数
    pub fn buffered(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    fn release_decoder(&mut self) {
        if !self.released {
            self.decoder.release();
            self.released = true;
        }
    }
}

impl<D: SampleDecoder> Drop for StreamBuffer<D> {
    fn drop(&mut self) {
        self.release_decoder();
    }
}
