//! 流式解码接口模块
//!
//! 定义外部解码协作者（容器解复用 + 编解码器）的最小接口。
//! 状态机本身在 `stream_buffer` 中，这里只描述协作者能做什么。

use super::format::AudioFormat;
use crate::error::AudioResult;

/// 解复用得到的压缩包
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// 所属流ID（容器内可能交织多个流）
    pub stream_id: u32,
    /// 压缩数据
    pub data: Vec<u8>,
}

impl Packet {
    pub fn new(stream_id: u32, data: Vec<u8>) -> Self {
        Self { stream_id, data }
    }
}

/// 样本解码器trait（外部协作者）
///
/// # 数据格式约定
///
/// - **原始字节**：`decode` 追加的是交错PCM字节，本机字节序，格式为 `open` 报告的 `sample_format`
/// - **变长输出**：每个包产出的PCM长度由编解码器决定，可以为0（解码延迟）
/// - **部分消耗**：`decode` 可以只消耗包的一部分，调用方负责把剩余部分重新提交
/// - **冲刷**：以空切片调用 `decode` 表示输入已耗尽，编解码器应吐出内部缓存的样本
///
/// # 线程安全性
///
/// 不要求 `Send`/`Sync`，一个实例只在一条分析管线中顺序使用。
pub trait SampleDecoder {
    /// 打开媒体源并发现音频流，报告声道数、采样率和样本格式
    fn open(&mut self) -> AudioResult<AudioFormat>;

    /// 被选中音频流的ID（`open` 成功后有效）
    fn selected_stream(&self) -> u32;

    /// 读取下一个压缩包
    ///
    /// - `Ok(Some(packet))` - 任意流的一个包
    /// - `Ok(None)` - 媒体源结束
    /// - `Err(_)` - 解复用失败
    fn read_packet(&mut self) -> AudioResult<Option<Packet>>;

    /// 解码（`data` 为空时为冲刷调用）
    ///
    /// 解码得到的PCM字节追加到 `out`，返回消耗的输入字节数。
    /// 非冲刷调用必须消耗至少1字节。
    fn decode(&mut self, data: &[u8], out: &mut Vec<u8>) -> AudioResult<usize>;

    /// 释放编解码器句柄与内部缓冲区
    fn release(&mut self);
}

impl<D: SampleDecoder + ?Sized> SampleDecoder for Box<D> {
    fn open(&mut self) -> AudioResult<AudioFormat> {
        (**self).open()
    }

    fn selected_stream(&self) -> u32 {
        (**self).selected_stream()
    }

    fn read_packet(&mut self) -> AudioResult<Option<Packet>> {
        (**self).read_packet()
    }

    fn decode(&mut self, data: &[u8], out: &mut Vec<u8>) -> AudioResult<usize> {
        (**self).decode(data, out)
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// 契约级单测与管线单测共用的Mock解码器
#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use crate::error::AudioError;
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// 恒等"编解码器"：包字节即PCM字节
    ///
    /// - `max_consume` 限制每次 `decode` 消耗的字节数，模拟部分消耗
    /// - `lag` 让编解码器扣留最后N字节，直到冲刷才吐出，模拟解码延迟
    pub(crate) struct MockDecoder {
        pub format: AudioFormat,
        pub stream_id: u32,
        pub packets: VecDeque<Packet>,
        pub max_consume: usize,
        pub lag: usize,
        pub fail_open: bool,
        /// 在第N次非冲刷 `decode` 调用时注入错误（从1开始）
        pub fail_on_decode: Option<usize>,
        pub zero_progress: bool,
        pub releases: Rc<Cell<usize>>,
        pub decode_calls: usize,
        held: Vec<u8>,
    }

    impl MockDecoder {
        pub(crate) fn new(format: AudioFormat, packets: Vec<Packet>) -> Self {
            Self {
                format,
                stream_id: 0,
                packets: packets.into(),
                max_consume: usize::MAX,
                lag: 0,
                fail_open: false,
                fail_on_decode: None,
                zero_progress: false,
                releases: Rc::new(Cell::new(0)),
                decode_calls: 0,
                held: Vec::new(),
            }
        }

        /// 把一段PCM字节切成固定大小的包（全部属于流0）
        pub(crate) fn from_pcm(format: AudioFormat, pcm: &[u8], packet_size: usize) -> Self {
            let packets = pcm
                .chunks(packet_size.max(1))
                .map(|chunk| Packet::new(0, chunk.to_vec()))
                .collect();
            Self::new(format, packets)
        }
    }

    impl SampleDecoder for MockDecoder {
        fn open(&mut self) -> AudioResult<AudioFormat> {
            if self.fail_open {
                return Err(AudioError::FormatError("mock open failure".to_string()));
            }
            Ok(self.format.clone())
        }

        fn selected_stream(&self) -> u32 {
            self.stream_id
        }

        fn read_packet(&mut self) -> AudioResult<Option<Packet>> {
            Ok(self.packets.pop_front())
        }

        fn decode(&mut self, data: &[u8], out: &mut Vec<u8>) -> AudioResult<usize> {
            if data.is_empty() {
                out.append(&mut self.held);
                return Ok(0);
            }
            self.decode_calls += 1;
            if self.fail_on_decode == Some(self.decode_calls) {
                return Err(AudioError::DecodingError(
                    "Injected error for testing".to_string(),
                ));
            }
            if self.zero_progress {
                return Ok(0);
            }
            let consumed = data.len().min(self.max_consume);
            self.held.extend_from_slice(&data[..consumed]);
            let emit = self.held.len().saturating_sub(self.lag);
            out.extend(self.held.drain(..emit));
            Ok(consumed)
        }

        fn release(&mut self) {
            self.held.clear();
            self.releases.set(self.releases.get() + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockDecoder;
    use super::*;
    use crate::processing::SampleFormat;

    fn fmt() -> AudioFormat {
        AudioFormat::new(8, 1, SampleFormat::U8, 0)
    }

    #[test]
    fn test_mock_partial_consumption_contract() {
        let mut decoder = MockDecoder::new(fmt(), vec![Packet::new(0, vec![1, 2, 3, 4, 5])]);
        decoder.max_consume = 2;
        let mut out = Vec::new();

        assert_eq!(decoder.decode(&[1, 2, 3, 4, 5], &mut out).unwrap(), 2);
        assert_eq!(decoder.decode(&[3, 4, 5], &mut out).unwrap(), 2);
        assert_eq!(decoder.decode(&[5], &mut out).unwrap(), 1);
        assert_eq!(out, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_mock_lag_released_on_flush() {
        let mut decoder = MockDecoder::new(fmt(), Vec::new());
        decoder.lag = 3;
        let mut out = Vec::new();

        decoder.decode(&[9, 8, 7, 6], &mut out).unwrap();
        assert_eq!(out, vec![9]);
        assert_eq!(decoder.decode(&[], &mut out).unwrap(), 0);
        assert_eq!(out, vec![9, 8, 7, 6]);
    }

    #[test]
    fn test_boxed_decoder_forwards() {
        let mut boxed: Box<dyn SampleDecoder> =
            Box::new(MockDecoder::new(fmt(), vec![Packet::new(0, vec![42])]));
        assert_eq!(boxed.open().unwrap().sample_rate, 8);
        assert_eq!(boxed.read_packet().unwrap(), Some(Packet::new(0, vec![42])));
        assert_eq!(boxed.read_packet().unwrap(), None);
    }
}
