//! DR计算核心引擎
//!
//! 输入分片序列，输出每声道DR与整体DR：
//!
//! 1. 分片RMS降序排序，取前 `floor(n/5)` 个（上位20%）
//! 2. rms_score = sqrt(mean(top²))
//! 3. peak_score = 次峰（见 `peak_selection`）
//! 4. DR = 20·log10(peak_score / rms_score)
//!
//! 数值退化（分片不足、静音、非有限样本）是声道级结果，不是错误。

use super::fragment_meter::FragmentSeries;
use super::peak_selection::PeakPair;
use crate::error::{self, AudioResult};
use crate::tools::constants::dr_analysis;
use serde::Serialize;

/// 线性幅度转dB，0（或非正值）没有dB表示
pub fn to_db(value: f64) -> Option<f64> {
    if value > 0.0 {
        Some(20.0 * value.log10())
    } else {
        None
    }
}

/// 声道测量结果类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelOutcome {
    /// 正常得到DR值
    Measured,
    /// 分片数不足以选出上位20%
    InsufficientData,
    /// 上位分片RMS为0
    Silent,
    /// 分片统计中出现NaN或无穷大（浮点流中的非有限样本）
    InvalidData,
}

impl ChannelOutcome {
    /// 无法测量时的原因说明
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Self::Measured => None,
            Self::InsufficientData => Some("音频过短，分片不足 / not enough fragments"),
            Self::Silent => Some("静音声道 / silent channel"),
            Self::InvalidData => Some("样本含NaN或无穷大 / non-finite samples"),
        }
    }
}

/// 单声道DR计算结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrResult {
    /// 声道索引
    pub channel: usize,

    pub outcome: ChannelOutcome,

    /// DR值（仅 `Measured` 时存在）
    pub dr_value: Option<f64>,

    /// 上位20%分片的RMS（线性）
    pub rms: f64,

    /// DR计算使用的峰值（线性）
    pub peak: f64,

    /// 主峰值
    pub primary_peak: f64,

    /// 次峰值
    pub secondary_peak: f64,

    /// 全部分片的RMS（线性）
    pub raw_rms: f64,

    /// 参与上位20%统计的分片数
    pub fragments_used: usize,

    pub fragment_count: usize,
}

impl DrResult {
    /// 格式化DR值为整数显示
    pub fn dr_value_rounded(&self) -> Option<i32> {
        self.dr_value.map(|dr| dr.round() as i32)
    }

    pub fn is_measured(&self) -> bool {
        self.outcome == ChannelOutcome::Measured
    }
}

/// 整体分析结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrAnalysis {
    pub channels: Vec<DrResult>,
    /// 已测量声道DR均值（未取整）
    pub overall_precise: Option<f64>,
    /// 整体DR（四舍五入）
    pub overall: Option<i32>,
}

impl DrAnalysis {
    /// 整体DR缺失时的原因（取第一个未测量声道的原因）
    pub fn overall_reason(&self) -> Option<&'static str> {
        if self.overall.is_some() {
            return None;
        }
        self.channels
            .iter()
            .find_map(|r| r.outcome.reason())
            .or(Some("没有声道 / no channels"))
    }
}

/// DR计算器（无状态，可重复使用）
#[derive(Debug, Clone)]
pub struct DrCalculator {
    top_divisor: usize,
}

impl Default for DrCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl DrCalculator {
    pub fn new() -> Self {
        Self {
            top_divisor: dr_analysis::TOP_FRAGMENT_DIVISOR,
        }
    }

    /// 分析全部声道并计算整体DR
    pub fn analyze(&self, series: &FragmentSeries) -> AudioResult<DrAnalysis> {
        if series.rms.len() != series.channels || series.peak.len() != series.channels {
            return Err(error::calculation_error(
                "分片序列声道数不一致 / fragment series channel mismatch",
                format!(
                    "channels={}, rms={}, peak={}",
                    series.channels,
                    series.rms.len(),
                    series.peak.len()
                ),
            ));
        }

        let channels = (0..series.channels)
            .map(|ch| self.analyze_channel(ch, series.channel_rms(ch), series.channel_peaks(ch)))
            .collect::<AudioResult<Vec<_>>>()?;

        let measured: Vec<f64> = channels.iter().filter_map(|r| r.dr_value).collect();
        let overall_precise = if measured.is_empty() {
            None
        } else {
            Some(measured.iter().sum::<f64>() / measured.len() as f64)
        };

        #[cfg(debug_assertions)]
        {
            eprintln!("🔍 [DR_DEBUG] 分片数: {}", series.fragment_count());
            for r in &channels {
                eprintln!(
                    "🔍 [DR_DEBUG] Ch{}: outcome={:?} rms={:.6} peak={:.6} dr={:?}",
                    r.channel, r.outcome, r.rms, r.peak, r.dr_value
                );
            }
        }

        Ok(DrAnalysis {
            channels,
            overall_precise,
            overall: overall_precise.map(|dr| dr.round() as i32),
        })
    }

    /// 计算单声道DR
    pub fn analyze_channel(
        &self,
        channel: usize,
        rms_values: &[f64],
        peaks: &[f64],
    ) -> AudioResult<DrResult> {
        if rms_values.len() != peaks.len() {
            return Err(error::calculation_error(
                "RMS与Peak分片数不一致 / rms/peak length mismatch",
                format!("{} vs {}", rms_values.len(), peaks.len()),
            ));
        }

        let fragment_count = rms_values.len();
        let peak_pair = PeakPair::from_fragment_peaks(peaks);
        let raw_rms = if fragment_count > 0 {
            (rms_values.iter().map(|r| r * r).sum::<f64>() / fragment_count as f64).sqrt()
        } else {
            0.0
        };

        let mut sorted = rms_values.to_vec();
        sorted.sort_by(|a, b| b.total_cmp(a));

        let k = fragment_count / self.top_divisor;
        let rms = if k > 0 {
            (sorted[..k].iter().map(|r| r * r).sum::<f64>() / k as f64).sqrt()
        } else {
            0.0
        };
        let peak = peak_pair.select();

        // NaN/inf 不参与评分
        let non_finite = rms_values.iter().chain(peaks).any(|v| !v.is_finite());

        let (outcome, dr_value) = if non_finite {
            (ChannelOutcome::InvalidData, None)
        } else if k == 0 {
            (ChannelOutcome::InsufficientData, None)
        } else if rms <= 0.0 {
            (ChannelOutcome::Silent, None)
        } else {
            (ChannelOutcome::Measured, Some(20.0 * (peak / rms).log10()))
        };

        Ok(DrResult {
            channel,
            outcome,
            dr_value,
            rms,
            peak,
            primary_peak: peak_pair.primary,
            secondary_peak: peak_pair.secondary,
            raw_rms,
            fragments_used: k,
            fragment_count,
        })
    }
}
