//! 运行时错误.

use crate::{Idx2d, LabelIndex};
use thiserror::Error;

/// 标签图引擎的运行时错误.
#[derive(Debug, Error)]
pub enum EngineError {
    /// 宿主当前没有加载图像 (或没有可用的查看器).
    #[error("no image loaded")]
    NoImageLoaded,

    /// 导入的样本集文档格式非法. 参数为具体原因.
    #[error("invalid sample set format: {0}")]
    InvalidSampleSetFormat(String),

    /// 宿主缺少某项必要能力 (如分割/涂抹支持). 参数为能力名称.
    #[error("host capability unavailable: {0}")]
    HostCapabilityUnavailable(&'static str),

    /// 标签不属于当前分类方案.
    #[error("label {0} is not part of the active taxonomy")]
    UnknownLabel(LabelIndex),

    /// 试图向标签图写入背景标签 0.
    #[error("label 0 is reserved for background and cannot be painted")]
    ReservedLabel,

    /// 一批样本与正在收集的样本集不属于同一个切片.
    #[error("inconsistent slice index: expected {expected}, found {found}")]
    InconsistentSlice {
        /// 正在收集的样本集的切片.
        expected: u32,
        /// 新样本所属的切片.
        found: u32,
    },

    /// 当前没有正在收集的样本集.
    #[error("no open sample set")]
    NoOpenSampleSet,

    /// 数据形状 `(高, 宽)` 不一致.
    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        /// 期望的形状.
        expected: Idx2d,
        /// 实际的形状.
        found: Idx2d,
    },

    /// 参数非法.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// 底层 I/O 错误.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 图像编解码错误.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// JSON 编码错误.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// 标签图引擎运行时结果.
pub type EngineResult<T> = Result<T, EngineError>;
