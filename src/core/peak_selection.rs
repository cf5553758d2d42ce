//! 峰值选择模块
//!
//! 从分片峰值序列中找出主峰（最大）与次峰（第二大），并决定DR计算使用哪一个。
//!
//! ## 选择规则
//!
//! - 优先使用次峰(Pk_2nd)，单个瞬态不会主导结果
//! - 次峰无效（不足两个分片，或次峰为0）时回退到主峰

/// 主峰/次峰对
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PeakPair {
    /// 最大分片峰值
    pub primary: f64,
    /// 第二大分片峰值（不足两个分片时为0）
    pub secondary: f64,
}

impl PeakPair {
    /// 单次遍历找出前两名，等价于降序排序后取下标0和1
    pub fn from_fragment_peaks(peaks: &[f64]) -> Self {
        let mut pair = Self::default();
        for &peak in peaks {
            if peak > pair.primary {
                pair.secondary = pair.primary;
                pair.primary = peak;
            } else if peak > pair.secondary {
                pair.secondary = peak;
            }
        }
        pair
    }

    /// 选择用于DR计算的峰值
    #[inline]
    pub fn select(&self) -> f64 {
        if self.secondary > 0.0 {
            self.secondary
        } else {
            self.primary
        }
    }
}
