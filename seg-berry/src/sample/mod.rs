//! 像素样本与样本集.
//!
//! 样本是区域重建的输入: 一个 (坐标, 标签) 观测, 附带原始像素值与模态值.
//! 样本集只属于一个 (图像, 切片), 并记录采集时的像素间距,
//! 以便在另一个分辨率下重映射坐标.

mod store;

pub use store::PixelSampleStore;

use crate::consts::DEFAULT_SPACING_MM;
use crate::data::Rescale;
use crate::{LabelIndex, SliceKey};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 像素间距 (mm/像素).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PixelSpacing {
    /// 相邻两行之间的距离 (y 方向).
    pub row: f64,

    /// 相邻两列之间的距离 (x 方向).
    pub col: f64,
}

impl Default for PixelSpacing {
    fn default() -> Self {
        Self::uniform(DEFAULT_SPACING_MM)
    }
}

impl PixelSpacing {
    /// 构造. 两个分量必须都是有限的正数.
    pub fn new(row: f64, col: f64) -> Option<Self> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        (ok(row) && ok(col)).then_some(Self { row, col })
    }

    /// 各向同性间距.
    #[inline]
    pub const fn uniform(mm: f64) -> Self {
        Self { row: mm, col: mm }
    }

    /// 单个像素的面积 (mm²).
    #[inline]
    pub fn pixel_area_mm2(&self) -> f64 {
        self.row * self.col
    }
}

/// 一个像素样本.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// 原始图像中的列坐标.
    pub x: i32,

    /// 原始图像中的行坐标.
    pub y: i32,

    /// 归一化坐标 `(x / col_spacing, y / row_spacing)`, 即物理坐标 (mm).
    pub normalized: Option<(f64, f64)>,

    /// 标签值.
    pub label: LabelIndex,

    /// 原始存储像素值.
    pub raw_value: i32,

    /// 模态值 (如 CT 的 HU).
    pub modality_value: f64,
}

impl Sample {
    /// 只有坐标与标签的样本. 像素值均为 0, 没有归一化坐标.
    pub fn new(x: i32, y: i32, label: LabelIndex) -> Self {
        Self {
            x,
            y,
            normalized: None,
            label,
            raw_value: 0,
            modality_value: 0.0,
        }
    }

    /// 根据采集时的像素间距补全归一化坐标.
    pub fn with_spacing(mut self, spacing: PixelSpacing) -> Self {
        self.normalized = Some((self.x as f64 / spacing.col, self.y as f64 / spacing.row));
        self
    }

    /// 补全原始像素值与模态值.
    pub fn with_value(mut self, raw: i32, rescale: Rescale) -> Self {
        self.raw_value = raw;
        self.modality_value = rescale.eval(raw);
        self
    }
}

/// 样本集. 属于同一个 (图像, 切片), 按采集顺序排列.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleSet {
    /// 采集样本的图像标识.
    pub image_id: String,

    /// 采集样本的切片下标.
    pub slice_index: u32,

    /// 采集时的像素间距.
    pub source_spacing: PixelSpacing,

    /// 采集 (或导出) 时间.
    pub captured_at: DateTime<Utc>,

    samples: Vec<Sample>,
}

impl SampleSet {
    /// 空样本集, 时间戳为当前时间.
    pub fn new(image_id: impl Into<String>, slice_index: u32, source_spacing: PixelSpacing) -> Self {
        Self {
            image_id: image_id.into(),
            slice_index,
            source_spacing,
            captured_at: Utc::now(),
            samples: vec![],
        }
    }

    /// 由已有样本构造.
    pub fn with_samples(
        image_id: impl Into<String>,
        slice_index: u32,
        source_spacing: PixelSpacing,
        samples: Vec<Sample>,
    ) -> Self {
        let mut set = Self::new(image_id, slice_index, source_spacing);
        set.samples = samples;
        set
    }

    /// 所属切片.
    pub fn key(&self) -> SliceKey {
        SliceKey::new(self.image_id.clone(), self.slice_index)
    }

    /// 全部样本.
    #[inline]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// 取出全部样本.
    #[inline]
    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }

    /// 样本个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// 是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub(crate) fn extend(&mut self, samples: impl IntoIterator<Item = Sample>) {
        self.samples.extend(samples);
    }

    /// 每个标签的样本个数, 按标签值升序.
    pub fn count_by_label(&self) -> BTreeMap<LabelIndex, usize> {
        self.samples.iter().fold(BTreeMap::new(), |mut acc, s| {
            *acc.entry(s.label).or_insert(0) += 1;
            acc
        })
    }

    /// 出现过的所有标签, 升序且互不相同.
    pub fn segments_found(&self) -> Vec<LabelIndex> {
        self.samples.iter().map(|s| s.label).sorted_unstable().dedup().collect()
    }

    /// 除时间戳以外是否完全相同?
    pub fn same_content(&self, other: &Self) -> bool {
        self.image_id == other.image_id
            && self.slice_index == other.slice_index
            && self.source_spacing == other.source_spacing
            && self.samples == other.samples
    }
}
