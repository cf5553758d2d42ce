//! 音频处理模块
//!
//! 把解码状态机、分片计量器和DR计算器串成单输入管线。
//! 每个输入都有独立的解码器、缓冲区和计量器，彼此不共享状态。

use super::cli::AppConfig;
use super::scanner::InputSource;
use super::utils::ProgressLine;
use crate::audio::{AudioFormat, DecodeStats, SampleDecoder, StreamBuffer, UniversalDecoder};
use crate::core::{DrAnalysis, DrCalculator, FragmentMeter};
use crate::error::AudioResult;
use serde::Serialize;
use std::path::Path;

/// 单输入分析结果
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutput {
    /// 音频格式（sample_count 为实际处理的帧数）
    pub format: AudioFormat,
    pub analysis: DrAnalysis,
    pub fragments: usize,
    pub duration_seconds: f64,
    pub decode_stats: DecodeStats,
}

/// 流式分析：打开 → 按分片大小整帧读取 → 计量 → DR计算
pub fn analyze_stream<D: SampleDecoder>(
    mut stream: StreamBuffer<D>,
    config: &AppConfig,
) -> AudioResult<AnalysisOutput> {
    let mut format = stream.open()?.clone();
    let mut meter = FragmentMeter::for_format(&format)?;

    if config.verbose {
        eprintln!("[INFO] {}", format.describe());
        eprintln!("收集分片信息 / Collecting fragments information...");
    }

    let frame_bytes = format.frame_bytes();
    let bytes_per_sample = format.bytes_per_sample();
    let mut chunk = vec![0u8; meter.frames_per_fragment() * frame_bytes];
    let mut progress = ProgressLine::new(config.verbose);

    loop {
        let read = stream.read(&mut chunk)?;
        let whole = read - read % frame_bytes;
        meter.feed(&chunk[..whole], whole / bytes_per_sample)?;
        progress.tick(meter.processed_duration_seconds());

        // 短读只发生在流结束时
        if read < chunk.len() {
            break;
        }
    }

    let duration_seconds = meter.processed_duration_seconds();
    progress.finish(duration_seconds);
    format.update_sample_count(meter.frames_processed());

    let decode_stats = stream.stats().clone();
    stream.close();

    if config.verbose {
        eprintln!("统计中 / Doing some statistics...");
        eprintln!(
            "[INFO] 解码包 / packets: {}, 跳过 / skipped: {}, 缓冲区 / buffers: {} (平均 / mean {:.0} B)",
            decode_stats.packets_decoded,
            decode_stats.packets_skipped,
            decode_stats.buffers,
            decode_stats.mean_buffer()
        );
    }

    let series = meter.finish();
    let fragments = series.fragment_count();
    let analysis = DrCalculator::new().analyze(&series)?;

    Ok(AnalysisOutput {
        format,
        analysis,
        fragments,
        duration_seconds,
        decode_stats,
    })
}

/// 分析音频文件
pub fn analyze_path(path: &Path, config: &AppConfig) -> AudioResult<AnalysisOutput> {
    let decoder = UniversalDecoder::new().open_path(path)?;
    analyze_stream(StreamBuffer::new(decoder), config)
}

/// 分析标准输入
pub fn analyze_stdin(config: &AppConfig) -> AudioResult<AnalysisOutput> {
    let decoder = UniversalDecoder::new().open_stdin();
    analyze_stream(StreamBuffer::new(decoder), config)
}

/// 按输入类型分派
pub fn analyze_input(input: &InputSource, config: &AppConfig) -> AudioResult<AnalysisOutput> {
    match input {
        InputSource::Stdin => analyze_stdin(config),
        InputSource::File(path) => analyze_path(path, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::streaming::mock::MockDecoder;
    use crate::core::ChannelOutcome;
    use crate::error::AudioError;
    use crate::processing::SampleFormat;

    fn s16_pcm(frames: usize, channels: usize, f: impl Fn(usize, usize) -> i16) -> Vec<u8> {
        (0..frames)
            .flat_map(|i| (0..channels).map(move |ch| (i, ch)))
            .flat_map(|(i, ch)| f(i, ch).to_ne_bytes())
            .collect()
    }

    #[test]
    fn test_pipeline_counts_fragments() {
        // 100Hz → 每分片300帧，1650帧 = 5个完整分片 + 150帧
        let format = AudioFormat::new(100, 2, SampleFormat::S16, 0);
        let pcm = s16_pcm(1650, 2, |i, _| if i % 2 == 0 { 1000 } else { -1000 });
        let mut decoder = MockDecoder::from_pcm(format, &pcm, 333);
        decoder.max_consume = 100;
        decoder.lag = 17;

        let output = analyze_stream(StreamBuffer::new(decoder), &AppConfig::default()).unwrap();
        assert_eq!(output.fragments, 6);
        assert_eq!(output.format.sample_count, 1650);
        assert!((output.duration_seconds - 16.5).abs() < 1e-12);
        assert!(output.decode_stats.partial_decodes > 0);
        assert!(output.decode_stats.flushed_bytes > 0);
        // 方波：每分片RMS = sqrt(2) * 幅度，DR ≈ -3.01dB
        let ch0 = &output.analysis.channels[0];
        assert_eq!(ch0.outcome, ChannelOutcome::Measured);
        assert!((ch0.dr_value.unwrap() + 3.0103).abs() < 1e-3);
    }

    #[test]
    fn test_pipeline_silence() {
        let format = AudioFormat::new(10, 1, SampleFormat::U8, 0);
        let pcm = vec![128u8; 30 * 5];
        let decoder = MockDecoder::from_pcm(format, &pcm, 64);

        let output = analyze_stream(StreamBuffer::new(decoder), &AppConfig::default()).unwrap();
        assert_eq!(output.fragments, 5);
        assert_eq!(output.analysis.channels[0].outcome, ChannelOutcome::Silent);
        assert_eq!(output.analysis.overall, None);
    }

    #[test]
    fn test_pipeline_drops_partial_trailing_frame() {
        let format = AudioFormat::new(10, 2, SampleFormat::S16, 0);
        let mut pcm = s16_pcm(31, 2, |_, _| 500);
        pcm.extend_from_slice(&123i16.to_ne_bytes());
        let decoder = MockDecoder::from_pcm(format, &pcm, 40);

        let output = analyze_stream(StreamBuffer::new(decoder), &AppConfig::default()).unwrap();
        assert_eq!(output.format.sample_count, 31);
        assert_eq!(output.fragments, 2);
    }

    #[test]
    fn test_pipeline_propagates_decode_error_and_releases() {
        let format = AudioFormat::new(10, 1, SampleFormat::U8, 0);
        let mut decoder = MockDecoder::from_pcm(format, &[128u8; 90], 10);
        decoder.fail_on_decode = Some(4);
        let releases = decoder.releases.clone();

        let err = analyze_stream(StreamBuffer::new(decoder), &AppConfig::default()).unwrap_err();
        assert!(matches!(err, AudioError::DecodingError(_)));
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn test_pipeline_too_many_channels() {
        let format = AudioFormat::new(44100, 33, SampleFormat::S16, 0);
        let decoder = MockDecoder::new(format, Vec::new());
        let releases = decoder.releases.clone();

        let err = analyze_stream(StreamBuffer::new(decoder), &AppConfig::default()).unwrap_err();
        assert!(matches!(err, AudioError::TooManyChannels { channels: 33, .. }));
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = analyze_path(Path::new("/definitely/not/here.flac"), &AppConfig::default())
            .unwrap_err();
        assert!(matches!(err, AudioError::IoError(_)));
    }
}
