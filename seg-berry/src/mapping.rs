//! 样本坐标在不同像素间距之间的重映射.

use crate::consts::DEFAULT_SPACING_MM;
use crate::sample::{PixelSpacing, Sample};
use crate::{Idx2d, LabelIndex};
use num::ToPrimitive;

/// 目标图像的几何信息.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TargetGeometry {
    /// 宽 (列数).
    pub width: usize,

    /// 高 (行数).
    pub height: usize,

    /// 像素间距, 可能未知.
    pub spacing: Option<PixelSpacing>,
}

impl TargetGeometry {
    /// 构造.
    pub fn new(width: usize, height: usize, spacing: Option<PixelSpacing>) -> Self {
        Self {
            width,
            height,
            spacing,
        }
    }

    /// 形状 `(高, 宽)`.
    #[inline]
    pub fn shape(&self) -> Idx2d {
        (self.height, self.width)
    }
}

/// 一次批量映射的统计.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MapStats {
    /// 落在目标图像内的样本个数.
    pub accepted: usize,

    /// 越界 (或坐标无法表示) 而被丢弃的样本个数.
    pub rejected: usize,
}

/// 坐标映射器.
///
/// 样本带有归一化坐标且原始间距已知时, 目标坐标为 `round(归一化坐标 × 目标间距)`;
/// 否则为 `round(原始坐标 × 原始间距 / 目标间距)`. 未知的间距视为默认值.
#[derive(Copy, Clone, Debug)]
pub struct CoordinateMapper {
    target: TargetGeometry,
    default_spacing: PixelSpacing,
}

/// 四舍五入, `.5` 向正无穷方向取整. 超出 `i64` 范围或非有限值返回 `None`.
#[inline]
fn round_half_up(v: f64) -> Option<i64> {
    (v + 0.5).floor().to_i64()
}

impl CoordinateMapper {
    /// 构造, 缺失间距时采用 1.0 mm.
    pub fn new(target: TargetGeometry) -> Self {
        Self {
            target,
            default_spacing: PixelSpacing::uniform(DEFAULT_SPACING_MM),
        }
    }

    /// 修改缺失间距时采用的默认值.
    pub fn with_default_spacing(mut self, mm: f64) -> Self {
        self.default_spacing = PixelSpacing::uniform(mm);
        self
    }

    /// 目标几何信息.
    #[inline]
    pub fn target(&self) -> &TargetGeometry {
        &self.target
    }

    /// 将目标坐标转换为索引; 越界返回 `None`.
    fn index_of(&self, fx: f64, fy: f64) -> Option<Idx2d> {
        let x = round_half_up(fx)?;
        let y = round_half_up(fy)?;
        let (x, y) = (x.to_usize()?, y.to_usize()?);
        (x < self.target.width && y < self.target.height).then_some((y, x))
    }

    /// 映射一个样本. 落在目标图像外时返回 `None`.
    pub fn map(&self, sample: &Sample, source: Option<PixelSpacing>) -> Option<Idx2d> {
        let dst = self.target.spacing.unwrap_or(self.default_spacing);
        match (sample.normalized, source) {
            (Some((nx, ny)), Some(_)) => self.index_of(nx * dst.col, ny * dst.row),
            _ => {
                let src = source.unwrap_or(self.default_spacing);
                let fx = sample.x as f64 * (src.col / dst.col);
                let fy = sample.y as f64 * (src.row / dst.row);
                self.index_of(fx, fy)
            }
        }
    }

    /// 批量映射, 保持输入顺序, 并统计越界个数.
    pub fn map_all<'a>(
        &self,
        samples: impl IntoIterator<Item = &'a Sample>,
        source: Option<PixelSpacing>,
    ) -> (Vec<(LabelIndex, Idx2d)>, MapStats) {
        let mut stats = MapStats::default();
        let mapped = samples
            .into_iter()
            .filter_map(|s| {
                let pos = self.map(s, source);
                match pos {
                    Some(_) => stats.accepted += 1,
                    None => stats.rejected += 1,
                }
                pos.map(|p| (s.label, p))
            })
            .collect();
        (mapped, stats)
    }
}
