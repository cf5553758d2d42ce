//! 统一音频解码器
//!
//! 基于symphonia的 `SampleDecoder` 实现：容器探测、选流、逐包解码为原始交错PCM字节。
//! 文件路径与标准输入共用同一个适配器，区别只在媒体源。

use super::error_handling;
use super::format::{AudioFormat, FormatSupport};
use super::streaming::{Packet, SampleDecoder};
use crate::error::{self, AudioError, AudioResult};
use crate::processing::SampleFormat;
use std::path::Path;
use symphonia::core::audio::{AudioBufferRef, RawSampleBuffer};
use symphonia::core::codecs::{
    CODEC_TYPE_NULL, CODEC_TYPE_PCM_F32BE, CODEC_TYPE_PCM_F32LE, CODEC_TYPE_PCM_F64BE,
    CODEC_TYPE_PCM_F64LE, CodecParameters, Decoder, DecoderOptions,
};
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSource, MediaSourceStream, ReadOnlySource};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::SampleFormat as CodecSampleFormat;

/// 统一解码器入口
///
/// 负责格式支持判断和为每个输入创建独立的 `SymphoniaDecoder`。
#[derive(Debug, Default, Clone, Copy)]
pub struct UniversalDecoder;

impl UniversalDecoder {
    pub fn new() -> Self {
        Self
    }

    /// 获取支持的格式信息
    pub fn supported_formats(&self) -> &'static FormatSupport {
        static SUPPORT: FormatSupport = FormatSupport {
            extensions: &[
                "wav", "flac", "aiff", "aif", "au", "caf", "m4a", "mp4", "aac", "alac", "mp3",
                "mp1", "ogg", "oga", "mka", "mkv", "webm",
            ],
        };
        &SUPPORT
    }

    /// 按扩展名检测是否能解码指定文件
    pub fn can_decode(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| {
                self.supported_formats()
                    .extensions
                    .contains(&ext.to_lowercase().as_str())
            })
    }

    /// 为文件创建解码器（仅打开文件句柄，探测在 `open` 中进行）
    pub fn open_path(&self, path: &Path) -> AudioResult<SymphoniaDecoder> {
        let file = std::fs::File::open(path)?;

        let mut hint = Hint::new();
        if let Some(extension) = path.extension() {
            hint.with_extension(&extension.to_string_lossy());
        }

        Ok(SymphoniaDecoder::new(Box::new(file), hint))
    }

    /// 为标准输入创建解码器（不可寻址，全靠内容探测）
    pub fn open_stdin(&self) -> SymphoniaDecoder {
        let source = ReadOnlySource::new(std::io::stdin());
        SymphoniaDecoder::new(Box::new(source), Hint::new())
    }
}

/// symphonia适配器
///
/// symphonia的解码器总是消耗整个包，也没有延迟输出，
/// 因此 `decode` 返回 `data.len()`，冲刷调用不产出任何字节。
pub struct SymphoniaDecoder {
    source: Option<MediaSourceStream>,
    hint: Hint,
    reader: Option<Box<dyn FormatReader>>,
    decoder: Option<Box<dyn Decoder>>,
    track_id: u32,
    channels: usize,
    sample_format: SampleFormat,
    // 最近一个包的时间戳，重建symphonia包时回填
    last_ts: u64,
    last_dur: u64,
}

impl SymphoniaDecoder {
    pub fn new(source: Box<dyn MediaSource>, hint: Hint) -> Self {
        Self {
            source: Some(MediaSourceStream::new(source, Default::default())),
            hint,
            reader: None,
            decoder: None,
            track_id: 0,
            channels: 0,
            sample_format: SampleFormat::F32,
            last_ts: 0,
            last_dur: 0,
        }
    }

    /// 由编解码参数确定字节流的样本格式
    ///
    /// 优先使用声明的样本格式；浮点PCM按编解码器类型；只有位深时按位深推断；
    /// 都没有（有损编码）时为F32。
    fn output_sample_format(params: &CodecParameters) -> AudioResult<SampleFormat> {
        if let Some(declared) = params.sample_format {
            return match declared {
                CodecSampleFormat::U8 => Ok(SampleFormat::U8),
                CodecSampleFormat::S16 => Ok(SampleFormat::S16),
                CodecSampleFormat::S24 | CodecSampleFormat::S32 => Ok(SampleFormat::S32),
                CodecSampleFormat::F32 => Ok(SampleFormat::F32),
                CodecSampleFormat::F64 => Ok(SampleFormat::F64),
                other => Err(AudioError::UnsupportedSampleFormat(format!("{other:?}"))),
            };
        }

        match params.codec {
            CODEC_TYPE_PCM_F32LE | CODEC_TYPE_PCM_F32BE => return Ok(SampleFormat::F32),
            CODEC_TYPE_PCM_F64LE | CODEC_TYPE_PCM_F64BE => return Ok(SampleFormat::F64),
            _ => {}
        }

        match params.bits_per_sample {
            Some(1..=8) => Ok(SampleFormat::U8),
            Some(9..=16) => Ok(SampleFormat::S16),
            Some(17..=32) => Ok(SampleFormat::S32),
            Some(bits) => Err(AudioError::UnsupportedSampleFormat(format!(
                "{bits}位 / {bits}-bit"
            ))),
            None => Ok(SampleFormat::F32),
        }
    }

    /// 把解码缓冲区按目标格式转为交错原始字节并追加
    fn append_interleaved(decoded: AudioBufferRef<'_>, format: SampleFormat, out: &mut Vec<u8>) {
        let spec = *decoded.spec();
        let duration = decoded.capacity() as u64;

        macro_rules! copy_as {
            ($sample:ty) => {{
                let mut raw = RawSampleBuffer::<$sample>::new(duration, spec);
                raw.copy_interleaved_ref(decoded);
                out.extend_from_slice(raw.as_bytes());
            }};
        }

        match format {
            SampleFormat::U8 => copy_as!(u8),
            SampleFormat::S16 => copy_as!(i16),
            SampleFormat::S32 => copy_as!(i32),
            SampleFormat::F32 => copy_as!(f32),
            SampleFormat::F64 => copy_as!(f64),
        }
    }
}

impl SampleDecoder for SymphoniaDecoder {
    fn open(&mut self) -> AudioResult<AudioFormat> {
        let mss = self.source.take().ok_or_else(|| {
            AudioError::InvalidInput("媒体源已被打开 / media source already opened".to_string())
        })?;

        let probed = symphonia::default::get_probe()
            .format(
                &self.hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| error_handling::map_open_error("格式探测失败 / probe failed", e))?;
        let reader = probed.format;

        let track = reader
            .default_track()
            .filter(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .or_else(|| {
                reader
                    .tracks()
                    .iter()
                    .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            })
            .ok_or_else(|| error::format_error("未找到音频轨道 / no audio track", ""))?;

        let track_id = track.id;
        let params = track.codec_params.clone();

        let sample_rate = params
            .sample_rate
            .ok_or_else(|| error::format_error("无法获取采样率 / sample rate unknown", ""))?;
        let channels = params
            .channels
            .map(|ch| ch.count())
            .ok_or_else(|| error::format_error("无法获取声道数信息 / channel count unknown", ""))?;
        let channels_u16 = u16::try_from(channels).map_err(|_| AudioError::TooManyChannels {
            channels,
            max: super::format::MAX_CHANNELS as usize,
        })?;
        let sample_format = Self::output_sample_format(&params)?;

        let codecs = symphonia::default::get_codecs();
        let decoder = codecs
            .make(&params, &DecoderOptions::default())
            .map_err(|e| error_handling::map_open_error("创建解码器失败 / codec init failed", e))?;
        let codec_name = codecs.get_codec(params.codec).map(|d| d.short_name);

        let mut format = AudioFormat::new(
            sample_rate,
            channels_u16,
            sample_format,
            params.n_frames.unwrap_or(0),
        );
        if let Some(name) = codec_name {
            format = format.with_codec(name);
        }

        self.track_id = track_id;
        self.channels = channels;
        self.sample_format = sample_format;
        self.reader = Some(reader);
        self.decoder = Some(decoder);

        Ok(format)
    }

    fn selected_stream(&self) -> u32 {
        self.track_id
    }

    fn read_packet(&mut self) -> AudioResult<Option<Packet>> {
        let reader = self.reader.as_mut().ok_or_else(|| {
            AudioError::InvalidInput("解复用器未打开 / demuxer not open".to_string())
        })?;

        loop {
            match reader.next_packet() {
                Ok(packet) => {
                    self.last_ts = packet.ts();
                    self.last_dur = packet.dur();
                    return Ok(Some(Packet::new(packet.track_id(), packet.data.into_vec())));
                }
                Err(e) if error_handling::is_end_of_stream(&e) => return Ok(None),
                Err(symphonia::core::errors::Error::ResetRequired) => {
                    if let Some(decoder) = self.decoder.as_mut() {
                        decoder.reset();
                    }
                }
                Err(e) => {
                    return Err(error_handling::map_decode_error(
                        "读取包失败 / demux failed",
                        e,
                    ));
                }
            }
        }
    }

    fn decode(&mut self, data: &[u8], out: &mut Vec<u8>) -> AudioResult<usize> {
        let decoder = self.decoder.as_mut().ok_or_else(|| {
            AudioError::InvalidInput("解码器已释放 / decoder released".to_string())
        })?;

        if data.is_empty() {
            return Ok(0);
        }

        let packet = symphonia::core::formats::Packet::new_from_slice(
            self.track_id,
            self.last_ts,
            self.last_dur,
            data,
        );
        let decoded = decoder
            .decode(&packet)
            .map_err(|e| error_handling::map_decode_error("解码失败 / decode failed", e))?;

        let decoded_channels = decoded.spec().channels.count();
        if decoded_channels != self.channels {
            return Err(error::decoding_error(
                "声道数在流中途改变 / channel count changed mid-stream",
                format!("{} -> {decoded_channels}", self.channels),
            ));
        }

        if decoded.frames() > 0 {
            Self::append_interleaved(decoded, self.sample_format, out);
        }

        Ok(data.len())
    }

    fn release(&mut self) {
        self.decoder = None;
        self.reader = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_can_decode_by_extension() {
        let decoder = UniversalDecoder::new();
        assert!(decoder.can_decode(Path::new("album/track.FLAC")));
        assert!(decoder.can_decode(Path::new("a.wav")));
        assert!(!decoder.can_decode(Path::new("notes.txt")));
        assert!(!decoder.can_decode(Path::new("no_extension")));
    }

    #[test]
    fn test_output_sample_format_mapping() {
        let mut params = CodecParameters::new();
        params.with_sample_format(CodecSampleFormat::S24);
        assert_eq!(
            SymphoniaDecoder::output_sample_format(&params).unwrap(),
            SampleFormat::S32
        );

        let mut params = CodecParameters::new();
        params.with_sample_format(CodecSampleFormat::U24);
        assert!(matches!(
            SymphoniaDecoder::output_sample_format(&params),
            Err(AudioError::UnsupportedSampleFormat(_))
        ));

        let mut params = CodecParameters::new();
        params.with_bits_per_sample(16);
        assert_eq!(
            SymphoniaDecoder::output_sample_format(&params).unwrap(),
            SampleFormat::S16
        );

        let mut params = CodecParameters::new();
        params.for_codec(CODEC_TYPE_PCM_F32LE).with_bits_per_sample(32);
        assert_eq!(
            SymphoniaDecoder::output_sample_format(&params).unwrap(),
            SampleFormat::F32
        );

        // 有损编码：无位深信息
        let params = CodecParameters::new();
        assert_eq!(
            SymphoniaDecoder::output_sample_format(&params).unwrap(),
            SampleFormat::F32
        );
    }

    #[test]
    fn test_garbage_input_is_format_error() {
        let source = ReadOnlySource::new(Cursor::new(vec![0x5Au8; 4096]));
        let mut decoder = SymphoniaDecoder::new(Box::new(source), Hint::new());
        assert!(matches!(decoder.open(), Err(AudioError::FormatError(_))));
    }

    #[test]
    fn test_open_twice_is_invalid() {
        let source = ReadOnlySource::new(Cursor::new(Vec::<u8>::new()));
        let mut decoder = SymphoniaDecoder::new(Box::new(source), Hint::new());
        let _ = decoder.open();
        assert!(matches!(decoder.open(), Err(AudioError::InvalidInput(_))));
    }

    #[test]
    fn test_decode_after_release_is_invalid() {
        let source = ReadOnlySource::new(Cursor::new(Vec::<u8>::new()));
        let mut decoder = SymphoniaDecoder::new(Box::new(source), Hint::new());
        decoder.release();
        let mut out = Vec::new();
        assert!(matches!(
            decoder.decode(&[1, 2, 3], &mut out),
            Err(AudioError::InvalidInput(_))
        ));
    }
}
