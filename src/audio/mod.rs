//! 音频解码模块
//!
//! 外部解码协作者接口、symphonia适配器，以及把"包→PCM"变成字节流的解码状态机。

// 内部子模块（仅供universal_decoder使用）
mod error_handling;

pub mod format;
pub mod stats;
pub mod stream_buffer;
pub mod streaming;
pub mod universal_decoder;

pub use format::{AudioFormat, FormatSupport, MAX_CHANNELS};
pub use stats::DecodeStats;
pub use stream_buffer::{DecodeState, StreamBuffer};
pub use streaming::{Packet, SampleDecoder};
pub use universal_decoder::{SymphoniaDecoder, UniversalDecoder};
