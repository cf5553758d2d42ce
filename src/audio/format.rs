//! 音频格式信息模块
//!
//! 解码器在打开流时报告的元数据，整个分析过程中保持不变。

use crate::error::{self, AudioError, AudioResult};
use crate::processing::SampleFormat;
use crate::tools::constants::dr_analysis;
use serde::Serialize;

/// 支持的最大声道数（超过即为致命配置错误，不做截断）
pub const MAX_CHANNELS: u16 = 32;

/// 音频格式信息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    /// 解码器输出的样本格式（即字节流中的格式，不一定等于源文件位深）
    pub sample_format: SampleFormat,
    /// 每声道样本数估算，0表示未知（流式输入常见）
    pub sample_count: u64,
    /// 编解码器短名（如 "flac"、"mp3"），来自解码器而非扩展名
    pub codec: Option<String>,
}

impl AudioFormat {
    /// 创建新的音频格式
    pub fn new(
        sample_rate: u32,
        channels: u16,
        sample_format: SampleFormat,
        sample_count: u64,
    ) -> Self {
        Self {
            sample_rate,
            channels,
            sample_format,
            sample_count,
            codec: None,
        }
    }

    /// 附加编解码器名称
    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = Some(codec.into());
        self
    }

    /// 验证格式参数的有效性
    pub fn validate(&self) -> AudioResult<()> {
        if self.sample_rate == 0 {
            return Err(error::format_error("采样率不能为0 / sample rate is 0", ""));
        }
        if self.channels == 0 {
            return Err(error::format_error("声道数不能为0 / channel count is 0", ""));
        }
        if self.channels > MAX_CHANNELS {
            return Err(AudioError::TooManyChannels {
                channels: self.channels as usize,
                max: MAX_CHANNELS as usize,
            });
        }
        Ok(())
    }

    /// 每个分片的目标帧数（每声道样本数）
    pub fn frames_per_fragment(&self) -> usize {
        ((self.sample_rate as f64 * dr_analysis::FRAGMENT_DURATION_SECONDS).round() as usize).max(1)
    }

    /// 一帧（所有声道各一个样本）的字节数
    pub fn frame_bytes(&self) -> usize {
        self.channels_usize() * self.bytes_per_sample()
    }

    /// 获取每样本的字节数
    pub fn bytes_per_sample(&self) -> usize {
        self.sample_format.bytes_per_sample()
    }

    /// 获取声道数（usize类型）
    pub fn channels_usize(&self) -> usize {
        self.channels as usize
    }

    /// 获取持续时长（秒），样本数未知时为0
    pub fn duration_seconds(&self) -> f64 {
        self.sample_count as f64 / self.sample_rate as f64
    }

    /// 日志用的简短描述，例如 `44100 Hz, 2 ch, s16 (16-bit int), flac`
    pub fn describe(&self) -> String {
        let kind = if self.sample_format.is_float() {
            "float"
        } else {
            "int"
        };
        let mut text = format!(
            "{} Hz, {} ch, {} ({}-bit {kind})",
            self.sample_rate,
            self.channels,
            self.sample_format,
            self.sample_format.bit_depth()
        );
        if let Some(codec) = &self.codec {
            text.push_str(&format!(", {codec}"));
        }
        text
    }

    /// 更新样本数（流结束后以实际值覆盖估算值）
    pub fn update_sample_count(&mut self, sample_count: u64) {
        self.sample_count = sample_count;
    }
}

/// 格式支持信息
#[derive(Debug, Clone)]
pub struct FormatSupport {
    /// 支持的文件扩展名
    pub extensions: &'static [&'static str],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_channel_limit() {
        let ok = AudioFormat::new(44100, MAX_CHANNELS, SampleFormat::S16, 0);
        assert!(ok.validate().is_ok());

        let too_many = AudioFormat::new(44100, MAX_CHANNELS + 1, SampleFormat::S16, 0);
        assert!(matches!(
            too_many.validate(),
            Err(AudioError::TooManyChannels { channels: 33, max: 32 })
        ));
    }

    #[test]
    fn test_describe() {
        let pcm = AudioFormat::new(44100, 2, SampleFormat::S16, 0).with_codec("flac");
        assert_eq!(pcm.describe(), "44100 Hz, 2 ch, s16 (16-bit int), flac");

        let lossy = AudioFormat::new(48000, 1, SampleFormat::F32, 0);
        assert_eq!(lossy.describe(), "48000 Hz, 1 ch, f32 (32-bit float)");
    }

    #[test]
    fn test_validate_rejects_zero_fields() {
        assert!(matches!(
            AudioFormat::new(0, 2, SampleFormat::S16, 0).validate(),
            Err(AudioError::FormatError(_))
        ));
        assert!(matches!(
            AudioFormat::new(48000, 0, SampleFormat::S16, 0).validate(),
            Err(AudioError::FormatError(_))
        ));
    }

    #[test]
    fn test_fragment_geometry() {
        let format = AudioFormat::new(44100, 2, SampleFormat::S16, 44100 * 15);
        assert_eq!(format.frames_per_fragment(), 132_300);
        assert_eq!(format.frame_bytes(), 4);
        assert_eq!(format.duration_seconds(), 15.0);

        let format = AudioFormat::new(48000, 6, SampleFormat::F64, 0);
        assert_eq!(format.frames_per_fragment(), 144_000);
        assert_eq!(format.frame_bytes(), 48);
    }
}
