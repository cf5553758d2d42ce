//! 3秒分片计量器
//!
//! 消费交错PCM字节，按声道累积平方和与绝对峰值，每满3秒结算为一个分片。
//!
//! ## 结算公式
//!
//! - RMS = sqrt(2 * Σ(smp²) / n)，其中n为该分片该声道实际收到的样本数
//! - Peak = 分片内最大绝对值
//!
//! 分片序列只追加不修改，最后一个不完整分片以实际样本数结算。

use crate::audio::{AudioFormat, MAX_CHANNELS};
use crate::error::{AudioError, AudioResult};
use crate::processing::{SampleFormat, normalize};
use crate::tools::constants::{dr_analysis, limits};
use serde::Serialize;

/// 分片序列（按 `[声道][分片]` 组织）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FragmentSeries {
    pub channels: usize,
    pub sample_rate: u32,
    pub rms: Vec<Vec<f64>>,
    pub peak: Vec<Vec<f64>>,
    /// 每个分片实际收到的样本数
    pub samples: Vec<Vec<u64>>,
}

impl FragmentSeries {
    fn new(channels: usize, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
            rms: vec![Vec::new(); channels],
            peak: vec![Vec::new(); channels],
            samples: vec![Vec::new(); channels],
        }
    }

    /// 已结算的分片数（所有声道相同）
    pub fn fragment_count(&self) -> usize {
        self.rms.first().map_or(0, Vec::len)
    }

    pub fn channel_rms(&self, channel: usize) -> &[f64] {
        &self.rms[channel]
    }

    pub fn channel_peaks(&self, channel: usize) -> &[f64] {
        &self.peak[channel]
    }

    pub fn is_empty(&self) -> bool {
        self.fragment_count() == 0
    }
}

/// 分片计量器
#[derive(Debug)]
pub struct FragmentMeter {
    channels: usize,
    sample_rate: u32,
    format: SampleFormat,
    frames_per_fragment: usize,
    max_fragments: usize,

    // 当前分片的累加器
    sum_squares: Vec<f64>,
    peaks: Vec<f64>,
    counts: Vec<u64>,
    frames_in_fragment: usize,
    in_progress: bool,

    /// 交错位置：下一个样本属于哪个声道
    channel_cursor: usize,
    total_frames: u64,
    series: FragmentSeries,
}

impl FragmentMeter {
    /// 创建计量器（默认分片上限）
    pub fn new(channels: usize, sample_rate: u32, format: SampleFormat) -> AudioResult<Self> {
        Self::with_limits(channels, sample_rate, format, limits::MAX_FRAGMENTS)
    }

    /// 按解码器报告的格式创建计量器
    pub fn for_format(format: &AudioFormat) -> AudioResult<Self> {
        Self::new(
            format.channels_usize(),
            format.sample_rate,
            format.sample_format,
        )
    }

    /// 创建计量器并指定分片上限
    pub fn with_limits(
        channels: usize,
        sample_rate: u32,
        format: SampleFormat,
        max_fragments: usize,
    ) -> AudioResult<Self> {
        if channels == 0 {
            return Err(AudioError::InvalidInput(
                "声道数必须大于0 / channel count must be positive".to_string(),
            ));
        }
        if channels > MAX_CHANNELS as usize {
            return Err(AudioError::TooManyChannels {
                channels,
                max: MAX_CHANNELS as usize,
            });
        }
        if sample_rate == 0 {
            return Err(AudioError::InvalidInput(
                "采样率必须大于0 / sample rate must be positive".to_string(),
            ));
        }

        let frames_per_fragment =
            ((sample_rate as f64 * dr_analysis::FRAGMENT_DURATION_SECONDS).round() as usize).max(1);

        Ok(Self {
            channels,
            sample_rate,
            format,
            frames_per_fragment,
            max_fragments,
            sum_squares: vec![0.0; channels],
            peaks: vec![0.0; channels],
            counts: vec![0; channels],
            frames_in_fragment: 0,
            in_progress: false,
            channel_cursor: 0,
            total_frames: 0,
            series: FragmentSeries::new(channels, sample_rate),
        })
    }

    /// 喂入一段交错PCM字节
    ///
    /// `sample_count` 是缓冲区中的样本总数（所有声道合计）。
    /// 超出缓冲区长度的部分以及不足一个样本的尾部字节被忽略。
    /// 分片满额时立即结算，即使在缓冲区中途。
    pub fn feed(&mut self, buffer: &[u8], sample_count: usize) -> AudioResult<()> {
        let bytes_per_sample = self.format.bytes_per_sample();
        let available = sample_count.min(buffer.len() / bytes_per_sample);

        let mut offset = 0;
        for _ in 0..available {
            if !self.in_progress {
                self.begin_fragment()?;
            }

            let value = normalize(buffer, offset, self.format);
            offset += bytes_per_sample;

            let ch = self.channel_cursor;
            self.sum_squares[ch] += value * value;
            let abs = value.abs();
            if abs > self.peaks[ch] {
                self.peaks[ch] = abs;
            }
            self.counts[ch] += 1;

            self.channel_cursor += 1;
            if self.channel_cursor == self.channels {
                self.channel_cursor = 0;
                self.frames_in_fragment += 1;
                self.total_frames += 1;
                if self.frames_in_fragment == self.frames_per_fragment {
                    self.finalize_fragment();
                }
            }
        }

        Ok(())
    }

    /// 结束计量：结算未完成的分片并返回序列
    pub fn finish(mut self) -> FragmentSeries {
        if self.in_progress {
            self.finalize_fragment();
        }
        self.series
    }

    pub fn fragments_completed(&self) -> usize {
        self.series.fragment_count()
    }

    pub fn is_fragment_in_progress(&self) -> bool {
        self.in_progress
    }

    /// 已处理的音频时长（秒）
    pub fn processed_duration_seconds(&self) -> f64 {
        self.total_frames as f64 / self.sample_rate as f64
    }

    /// 已处理的完整帧数
    pub fn frames_processed(&self) -> u64 {
        self.total_frames
    }

    pub fn frames_per_fragment(&self) -> usize {
        self.frames_per_fragment
    }

    fn begin_fragment(&mut self) -> AudioResult<()> {
        if self.series.fragment_count() >= self.max_fragments {
            return Err(AudioError::InputTooLong {
                max_fragments: self.max_fragments,
                max_seconds: self.max_fragments as f64 * dr_analysis::FRAGMENT_DURATION_SECONDS,
            });
        }

        self.sum_squares.fill(0.0);
        self.peaks.fill(0.0);
        self.counts.fill(0);
        self.frames_in_fragment = 0;
        self.in_progress = true;
        Ok(())
    }

    fn finalize_fragment(&mut self) {
        for ch in 0..self.channels {
            let n = self.counts[ch];
            let rms = if n > 0 {
                (dr_analysis::RMS_SUM_DOUBLING * self.sum_squares[ch] / n as f64).sqrt()
            } else {
                0.0
            };
            self.series.rms[ch].push(rms);
            self.series.peak[ch].push(self.peaks[ch]);
            self.series.samples[ch].push(n);
        }
        self.in_progress = false;
    }
}
