#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 将稀疏的像素样本 (手工涂抹或批量导入的掩膜) 重建为稠密的逐像素组织分类图
//! (labelmap), 并在此基础上计算心脏组织的定量临床指标.
//!
//! 该 crate 目前仅提供 `safe` 接口, 且所有操作都是同步的.
//!
//! # 注意
//!
//! 1. 图像解码、屏幕渲染、视口管理和报告排版都不在该 crate 的职责范围内,
//!   宿主只需要实现 [`host::ImagingHost`] 这一个能力接口.
//! 2. 一个 [`LabelBuffer`] 只属于一个 (图像, 切片) 对, 且同一时刻只允许一个写者.
//!   若宿主是异步的, 需要由宿主自行串行化 (如 `Mutex` 或 actor 边界).
//!
//! # 开发计划
//!
//! ### 样本坐标在不同像素间距之间的重映射 ✅
//!
//! 优先使用归一化坐标 (原始坐标除以原始像素间距), 否则按照间距比例缩放原始坐标.
//! 缺失的间距一律视为 1.0 mm/像素.
//!
//! 实现位于 `seg-berry/src/mapping.rs`.
//!
//! ### 稀疏样本的区域重建 ✅
//!
//! 按标签分组 -> 近圆形结构元膨胀 -> 4-邻接连通分量 -> 剔除小区域 -> 按标签升序写回.
//!
//! 实现位于 `seg-berry/src/reconstruct`.
//!
//! ### 多标签 labelmap ✅
//!
//! 稠密 `u16` 标签数组, 附带颜色查找表. 支持涂抹、按标签擦除、全部清空、快照、
//! 镜像恢复、压缩存储和 PNG 持久化.
//!
//! 实现位于 `seg-berry/src/data/labelmap`.
//!
//! ### 组织定量与临床分级 ✅
//!
//! 每个标签的像素数、面积 (mm², cm²) 与占比, 心肌相关的各类比值,
//! 以及梗死/无复流的严重程度分级. 整个组件是纯函数.
//!
//! 实现位于 `seg-berry/src/quantify`.
//!
//! ### 样本集与报告的序列化 ✅
//!
//! 与原有 JSON 文档格式兼容, 导入是原子的.
//!
//! 实现位于 `seg-berry/src/export`.
//!
//! ### 会话对象 ✅
//!
//! 取代全局可变的 "当前分割数据", 每个会话显式持有各切片的 labelmap.
//!
//! 实现位于 `seg-berry/src/session.rs`.
//!
//! ### 膨胀阈值与最小区域是否应随分辨率缩放 ⌛️
//!
//! 目前保持 0.75 与 8 两个默认值, 可通过 [`ReconstructParams`] 覆盖.
//! 参数网格实验位于 `ablations/region8`.

/// 二维索引 `(高, 宽)`, 即 `(行, 列)`, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 标签值. 0 永远代表背景.
pub type LabelIndex = u16;

/// 一个区域, 即若干像素索引.
type Area2d = Vec<Idx2d>;

/// 若干区域.
type Areas2d = Vec<Area2d>;

pub mod consts;

pub mod config;

mod error;

/// 标签图等基础数据结构.
mod data;

pub mod export;

pub mod host;

pub mod mapping;

pub mod quantify;

pub mod reconstruct;

pub mod sample;

pub mod session;

pub mod taxonomy;

pub mod prelude;

pub use config::EngineConfig;
pub use data::labelmap;
pub use data::{
    CompactLabelmap, ImgWriteRaw, ImgWriteVis, LabelBuffer, LabelMirror, LabelSnapshot, Rescale,
    SliceKey,
};
pub use error::{EngineError, EngineResult};
pub use mapping::{CoordinateMapper, MapStats, TargetGeometry};
pub use quantify::{TissueMetrics, TissueQuantifier};
pub use reconstruct::{ReconstructParams, ReconstructReport, RegionReconstructor};
pub use sample::{PixelSampleStore, PixelSpacing, Sample, SampleSet};
pub use session::SegmentationSession;
pub use taxonomy::{LabelDefinition, Rgba, Taxonomy};

/// 测试时输出 `debug!` 及以上级别的日志. 可以重复调用.
#[cfg(test)]
pub(crate) fn init_test_logger() {
    // 全局 logger 只能设置一次, 之后的调用返回的错误无需理会.
    let _ = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Debug)
        .init();
}
