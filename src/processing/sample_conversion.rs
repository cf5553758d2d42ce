//! 音频样本格式转换
//!
//! 把解码器输出的原始字节（本机字节序）映射为归一化浮点幅度。
//! 纯函数，仅依据格式标签分支。

use serde::Serialize;
use std::fmt;

/// 2^31，32位有符号整数的归一化因子
const S32_SCALE: f64 = 2_147_483_648.0;

/// 音频样本格式枚举（流打开后不可变）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    /// 8位无符号整数 [0, 255]，128为零点
    U8,
    /// 16位有符号整数 [-32768, 32767]
    S16,
    /// 32位有符号整数
    S32,
    /// 32位浮点数 [-1.0, 1.0]
    F32,
    /// 64位浮点数 [-1.0, 1.0]
    F64,
}

impl SampleFormat {
    /// 每个样本占用的字节数
    #[inline]
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::U8 => 1,
            SampleFormat::S16 => 2,
            SampleFormat::S32 | SampleFormat::F32 => 4,
            SampleFormat::F64 => 8,
        }
    }

    /// 获取样本格式的位深度
    #[inline]
    pub const fn bit_depth(self) -> u16 {
        (self.bytes_per_sample() * 8) as u16
    }

    /// 是否为浮点格式
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, SampleFormat::F32 | SampleFormat::F64)
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SampleFormat::U8 => "u8",
            SampleFormat::S16 => "s16",
            SampleFormat::S32 => "s32",
            SampleFormat::F32 => "f32",
            SampleFormat::F64 => "f64",
        };
        f.write_str(name)
    }
}

#[inline]
fn read_array<const N: usize>(raw: &[u8], offset: usize) -> [u8; N] {
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(&raw[offset..offset + N]);
    bytes
}

/// 将 `raw[offset..]` 处的一个样本归一化为浮点幅度
///
/// 调用方保证 `offset + format.bytes_per_sample() <= raw.len()`。
/// 整数格式结果位于 [-1.0, 1.0]；浮点格式按约定原样透传。
#[inline]
pub fn normalize(raw: &[u8], offset: usize, format: SampleFormat) -> f64 {
    match format {
        SampleFormat::U8 => (raw[offset] as f64 - 128.0) / 128.0,
        SampleFormat::S16 => i16::from_ne_bytes(read_array(raw, offset)) as f64 / 32768.0,
        SampleFormat::S32 => i32::from_ne_bytes(read_array(raw, offset)) as f64 / S32_SCALE,
        SampleFormat::F32 => f32::from_ne_bytes(read_array(raw, offset)) as f64,
        SampleFormat::F64 => f64::from_ne_bytes(read_array(raw, offset)),
    }
}

/// `normalize` 的逆映射：把归一化幅度放大回该格式的数值域
///
/// 结果未取整，调用方自行决定量化方式。
#[inline]
pub fn denormalize(value: f64, format: SampleFormat) -> f64 {
    match format {
        SampleFormat::U8 => value * 128.0 + 128.0,
        SampleFormat::S16 => value * 32768.0,
        SampleFormat::S32 => value * S32_SCALE,
        SampleFormat::F32 | SampleFormat::F64 => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u8_midpoint_and_extremes() {
        assert_eq!(normalize(&[128], 0, SampleFormat::U8), 0.0);
        assert_eq!(normalize(&[0], 0, SampleFormat::U8), -1.0);
        assert_eq!(normalize(&[255], 0, SampleFormat::U8), 127.0 / 128.0);
    }

    #[test]
    fn test_s16_respects_offset() {
        let mut raw = vec![0xAA];
        raw.extend_from_slice(&i16::MIN.to_ne_bytes());
        raw.extend_from_slice(&16384i16.to_ne_bytes());
        assert_eq!(normalize(&raw, 1, SampleFormat::S16), -1.0);
        assert_eq!(normalize(&raw, 3, SampleFormat::S16), 0.5);
    }

    #[test]
    fn test_s32_full_scale() {
        let raw = i32::MIN.to_ne_bytes();
        assert_eq!(normalize(&raw, 0, SampleFormat::S32), -1.0);
        let raw = (1i32 << 30).to_ne_bytes();
        assert_eq!(normalize(&raw, 0, SampleFormat::S32), 0.5);
    }

    #[test]
    fn test_float_passthrough() {
        let raw = 0.25f32.to_ne_bytes();
        assert_eq!(normalize(&raw, 0, SampleFormat::F32), 0.25);
        let raw = (-0.75f64).to_ne_bytes();
        assert_eq!(normalize(&raw, 0, SampleFormat::F64), -0.75);
    }

    #[test]
    fn test_round_trip_within_quantisation() {
        for value in [0u8, 1, 64, 127, 128, 200, 255] {
            let back = denormalize(normalize(&[value], 0, SampleFormat::U8), SampleFormat::U8);
            assert!((back - value as f64).abs() < 1e-9);
        }
        for value in [i16::MIN, -1234, -1, 0, 1, 4321, i16::MAX] {
            let raw = value.to_ne_bytes();
            let back = denormalize(normalize(&raw, 0, SampleFormat::S16), SampleFormat::S16);
            assert!((back - value as f64).abs() < 1e-6);
        }
        for value in [i32::MIN, -7_654_321, 0, 123_456_789, i32::MAX] {
            let raw = value.to_ne_bytes();
            let back = denormalize(normalize(&raw, 0, SampleFormat::S32), SampleFormat::S32);
            assert!((back - value as f64).abs() < 1e-3);
        }
        for value in [-1.0f32, -0.3, 0.0, 0.123, 1.0] {
            let raw = value.to_ne_bytes();
            let back = denormalize(normalize(&raw, 0, SampleFormat::F32), SampleFormat::F32);
            assert_eq!(back, value as f64);
        }
    }

    #[test]
    fn test_bytes_per_sample() {
        assert_eq!(SampleFormat::U8.bytes_per_sample(), 1);
        assert_eq!(SampleFormat::S16.bytes_per_sample(), 2);
        assert_eq!(SampleFormat::S32.bit_depth(), 32);
        assert_eq!(SampleFormat::F64.bit_depth(), 64);
        assert!(SampleFormat::F32.is_float());
        assert!(!SampleFormat::S32.is_float());
    }
}
