//! 稀疏样本的区域重建.
//!
//! 对每个标签 (按标签值升序) 独立执行:
//!
//! 1. 将样本坐标映射到目标标签图上;
//! 2. 以近圆形结构元膨胀映射后的点, 得到候选掩膜;
//! 3. 按 4-邻接规则求候选掩膜的连通分量;
//! 4. 像素个数不少于 `min_region_size` 的连通分量被保留, 其余视为噪声丢弃;
//! 5. 将保留的区域写入标签图.
//!
//! 不同标签的区域重叠时, 标签值较大者后写入, 因此覆盖较小者.
//! 被丢弃的连通分量中的原始样本点不会被写入.

mod footprint;

pub use footprint::Footprint;

use crate::consts::{
    DEFAULT_DILATION_RADIUS, DEFAULT_FOOTPRINT_THRESHOLD, DEFAULT_MIN_REGION_SIZE,
    DEFAULT_SPACING_MM,
};
use crate::data::areas4;
use crate::mapping::{CoordinateMapper, TargetGeometry};
use crate::sample::SampleSet;
use crate::{Areas2d, EngineError, EngineResult, Idx2d, LabelBuffer, LabelIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
    }
}

/// 区域重建参数.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconstructParams {
    /// 结构元半径 (像素).
    pub radius: u32,

    /// 结构元阈值, 见 [`Footprint`].
    pub footprint_threshold: f64,

    /// 连通分量被保留所需的最少像素个数.
    pub min_region_size: usize,
}

impl Default for ReconstructParams {
    fn default() -> Self {
        Self {
            radius: DEFAULT_DILATION_RADIUS,
            footprint_threshold: DEFAULT_FOOTPRINT_THRESHOLD,
            min_region_size: DEFAULT_MIN_REGION_SIZE,
        }
    }
}

impl ReconstructParams {
    /// 检查参数是否合法.
    pub fn validate(&self) -> EngineResult<()> {
        if !self.footprint_threshold.is_finite() || self.footprint_threshold < 0.0 {
            return Err(EngineError::InvalidParameter(format!(
                "footprint threshold must be finite and non-negative, got {}",
                self.footprint_threshold
            )));
        }
        Ok(())
    }
}

/// 单个标签的重建中间结果.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelRegions {
    /// 标签值.
    pub label: LabelIndex,

    /// 映射后的样本点个数 (可能重复).
    pub points: usize,

    /// 候选掩膜的像素个数.
    pub candidate_pixels: usize,

    /// 被保留的连通分量.
    pub kept: Areas2d,

    /// 被丢弃的连通分量个数.
    pub discarded_components: usize,

    /// 被丢弃的像素个数.
    pub discarded_pixels: usize,
}

impl LabelRegions {
    /// 被保留的像素个数.
    pub fn kept_pixels(&self) -> usize {
        self.kept.iter().map(Vec::len).sum()
    }
}

/// 单个标签的重建统计.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelOutcome {
    /// 标签值.
    pub label: LabelIndex,
    /// 映射后的样本点个数.
    pub points: usize,
    /// 候选掩膜的像素个数.
    pub candidate_pixels: usize,
    /// 被保留的连通分量个数.
    pub kept_components: usize,
    /// 被保留的像素个数.
    pub kept_pixels: usize,
    /// 被丢弃的连通分量个数.
    pub discarded_components: usize,
    /// 被丢弃的像素个数.
    pub discarded_pixels: usize,
    /// 实际发生变化的像素个数.
    pub painted_pixels: usize,
}

/// 一次区域重建的统计.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconstructReport {
    /// 输入的样本个数.
    pub samples: usize,

    /// 落在标签图内的样本个数.
    pub mapped: usize,

    /// 越界而被丢弃的样本个数.
    pub out_of_bounds: usize,

    /// 标签不属于分类方案而被丢弃的样本个数.
    pub unknown_label: usize,

    /// 每个标签的统计, 按标签值升序.
    pub labels: Vec<LabelOutcome>,
}

impl ReconstructReport {
    /// 实际发生变化的像素总数.
    pub fn painted_pixels(&self) -> usize {
        self.labels.iter().map(|l| l.painted_pixels).sum()
    }

    /// 标签图是否完全没有变化?
    pub fn is_noop(&self) -> bool {
        self.painted_pixels() == 0
    }

    /// 被保留的连通分量总数.
    pub fn kept_components(&self) -> usize {
        self.labels.iter().map(|l| l.kept_components).sum()
    }

    /// 被丢弃的连通分量总数.
    pub fn discarded_components(&self) -> usize {
        self.labels.iter().map(|l| l.discarded_components).sum()
    }
}

/// 区域重建器. 本身不持有任何可变状态.
#[derive(Clone, Debug)]
pub struct RegionReconstructor {
    params: ReconstructParams,
    footprint: Footprint,
    default_spacing_mm: f64,
}

impl RegionReconstructor {
    /// 构造.
    pub fn new(params: ReconstructParams) -> EngineResult<Self> {
        params.validate()?;
        let footprint = Footprint::new(params.radius, params.footprint_threshold)?;
        Ok(Self {
            params,
            footprint,
            default_spacing_mm: DEFAULT_SPACING_MM,
        })
    }

    /// 修改坐标映射时缺失间距所用的默认值.
    pub fn with_default_spacing(mut self, mm: f64) -> Self {
        self.default_spacing_mm = mm;
        self
    }

    /// 参数.
    #[inline]
    pub fn params(&self) -> &ReconstructParams {
        &self.params
    }

    /// 结构元.
    #[inline]
    pub fn footprint(&self) -> &Footprint {
        &self.footprint
    }

    /// 对单个标签的点集执行膨胀、连通分量与小区域剔除. 纯函数.
    pub fn regions(&self, label: LabelIndex, points: &[Idx2d], shape: Idx2d) -> LabelRegions {
        let mask = self.footprint.candidate_mask(points, shape);
        let candidate_pixels = mask.iter().filter(|&&m| m).count();
        let (kept, discarded): (Areas2d, Areas2d) = areas4(shape, |pos| mask[pos])
            .into_iter()
            .partition(|area| area.len() >= self.params.min_region_size);
        LabelRegions {
            label,
            points: points.len(),
            candidate_pixels,
            kept,
            discarded_components: discarded.len(),
            discarded_pixels: discarded.iter().map(Vec::len).sum(),
        }
    }

    #[cfg(feature = "rayon")]
    fn all_regions(&self, groups: &[(LabelIndex, Vec<Idx2d>)], shape: Idx2d) -> Vec<LabelRegions> {
        // `collect` 保持输入顺序, 写回时仍然按标签值升序.
        groups
            .par_iter()
            .map(|(label, points)| self.regions(*label, points, shape))
            .collect()
    }

    #[cfg(not(feature = "rayon"))]
    fn all_regions(&self, groups: &[(LabelIndex, Vec<Idx2d>)], shape: Idx2d) -> Vec<LabelRegions> {
        groups
            .iter()
            .map(|(label, points)| self.regions(*label, points, shape))
            .collect()
    }

    /// 将样本集合并到标签图中. 样本集被消耗, 不会被重复合并.
    ///
    /// 空样本集, 或者没有任何区域被保留时, 标签图保持不变.
    pub fn reconstruct(&self, set: SampleSet, buffer: &mut LabelBuffer) -> EngineResult<ReconstructReport> {
        let mut report = ReconstructReport {
            samples: set.len(),
            ..Default::default()
        };
        if set.is_empty() {
            return Ok(report);
        }

        let shape = buffer.shape();
        let mapper = CoordinateMapper::new(TargetGeometry::new(
            buffer.width(),
            buffer.height(),
            Some(buffer.spacing()),
        ))
        .with_default_spacing(self.default_spacing_mm);
        let (mapped, stats) = mapper.map_all(set.samples(), Some(set.source_spacing));
        report.mapped = stats.accepted;
        report.out_of_bounds = stats.rejected;

        let taxonomy = buffer.taxonomy().clone();
        let mut groups: BTreeMap<LabelIndex, Vec<Idx2d>> = BTreeMap::new();
        for (label, pos) in mapped {
            if taxonomy.check_paintable(label).is_err() {
                report.unknown_label += 1;
                continue;
            }
            groups.entry(label).or_default().push(pos);
        }
        if report.unknown_label > 0 {
            log::warn!(
                "{}: dropped {} samples with labels outside the taxonomy",
                buffer.key(),
                report.unknown_label
            );
        }
        let groups: Vec<_> = groups.into_iter().collect();

        for regions in self.all_regions(&groups, shape) {
            let mut painted_pixels = 0;
            for area in regions.kept.iter() {
                painted_pixels += buffer.paint_region(regions.label, area)?;
            }
            log::debug!(
                "{}: label {} points={} candidates={} kept={}/{}px discarded={}/{}px",
                buffer.key(),
                regions.label,
                regions.points,
                regions.candidate_pixels,
                regions.kept.len(),
                regions.kept_pixels(),
                regions.discarded_components,
                regions.discarded_pixels,
            );
            report.labels.push(LabelOutcome {
                label: regions.label,
                points: regions.points,
                candidate_pixels: regions.candidate_pixels,
                kept_components: regions.kept.len(),
                kept_pixels: regions.kept_pixels(),
                discarded_components: regions.discarded_components,
                discarded_pixels: regions.discarded_pixels,
                painted_pixels,
            });
        }

        log::info!(
            "{}: merged {} samples ({} out of bounds), painted {} pixels",
            buffer.key(),
            report.samples,
            report.out_of_bounds,
            report.painted_pixels()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::cardiac::*;
    use crate::sample::{PixelSpacing, Sample};
    use crate::taxonomy::Taxonomy;
    use crate::SliceKey;

    fn buffer() -> LabelBuffer {
        crate::init_test_logger();
        LabelBuffer::new(
            SliceKey::new("img", 0),
            (256, 256),
            PixelSpacing::default(),
            Taxonomy::cardiac(),
        )
    }

    fn set(samples: Vec<Sample>) -> SampleSet {
        SampleSet::with_samples("img", 0, PixelSpacing::default(), samples)
    }

    /// 以 `(x0, y0)` 为左上角的 `w × h` 实心矩形样本.
    fn rect(x0: i32, y0: i32, w: i32, h: i32, label: LabelIndex) -> Vec<Sample> {
        (y0..y0 + h)
            .flat_map(|y| (x0..x0 + w).map(move |x| Sample::new(x, y, label)))
            .collect()
    }

    fn reconstructor() -> RegionReconstructor {
        RegionReconstructor::new(ReconstructParams::default()).unwrap()
    }

    #[test]
    fn test_empty_set_is_noop() {
        let mut b = buffer();
        b.paint_region(BLOOD_POOL, &[(3, 3)]).unwrap();
        let before = b.mirror();
        let report = reconstructor().reconstruct(set(vec![]), &mut b).unwrap();
        assert!(report.is_noop());
        assert_eq!(report.samples, 0);
        assert_eq!(b.mirror(), before);
    }

    #[test]
    fn test_isolated_point_is_discarded() {
        let mut b = buffer();
        let report = reconstructor()
            .reconstruct(set(vec![Sample::new(100, 100, INFARCTION)]), &mut b)
            .unwrap();
        assert!(b.is_background());
        assert!(report.is_noop());
        assert_eq!(report.discarded_components(), 1);
    }

    #[test]
    fn test_cluster_of_eight_survives() {
        let mut b = buffer();
        let samples = rect(10, 20, 4, 2, NORMAL_MYOCARDIUM);
        assert_eq!(samples.len(), 8);
        let report = reconstructor().reconstruct(set(samples), &mut b).unwrap();
        assert_eq!(b.count(NORMAL_MYOCARDIUM), 8);
        assert_eq!(b[(20, 10)], NORMAL_MYOCARDIUM);
        assert_eq!(b[(21, 13)], NORMAL_MYOCARDIUM);
        assert_eq!(report.kept_components(), 1);
        assert_eq!(report.painted_pixels(), 8);
    }

    #[test]
    fn test_cluster_of_seven_is_discarded() {
        let mut b = buffer();
        let mut samples = rect(10, 20, 4, 2, NORMAL_MYOCARDIUM);
        samples.pop();
        let report = reconstructor().reconstruct(set(samples), &mut b).unwrap();
        assert!(b.is_background());
        assert_eq!(report.labels[0].discarded_pixels, 7);
    }

    #[test]
    fn test_mixed_noise_and_region() {
        let mut b = buffer();
        let mut samples = rect(50, 50, 5, 5, BLOOD_POOL);
        samples.push(Sample::new(200, 200, BLOOD_POOL));
        samples.push(Sample::new(0, 0, INFARCTION));
        let report = reconstructor().reconstruct(set(samples), &mut b).unwrap();
        assert_eq!(b.count(BLOOD_POOL), 25);
        assert_eq!(b[(200, 200)], 0);
        assert_eq!(b.count(INFARCTION), 0);
        assert_eq!(report.labels.len(), 2);
        assert_eq!(report.labels[0].label, BLOOD_POOL);
        assert_eq!(report.labels[0].discarded_components, 1);
    }

    #[test]
    fn test_higher_label_wins_overlap() {
        let mut b = buffer();
        let mut samples = rect(0, 0, 4, 4, NO_REFLOW);
        samples.extend(rect(2, 2, 4, 4, INFARCTION));
        reconstructor().reconstruct(set(samples), &mut b).unwrap();
        assert_eq!(b[(2, 2)], NO_REFLOW);
        assert_eq!(b[(3, 3)], NO_REFLOW);
        assert_eq!(b[(5, 5)], INFARCTION);
        assert_eq!(b.count(NO_REFLOW), 16);
        assert_eq!(b.count(INFARCTION), 12);
    }

    #[test]
    fn test_out_of_bounds_counted() {
        let mut b = buffer();
        let mut samples = rect(0, 0, 3, 3, BLOOD_POOL);
        samples.push(Sample::new(256, 0, BLOOD_POOL));
        samples.push(Sample::new(-1, 5, BLOOD_POOL));
        let report = reconstructor().reconstruct(set(samples), &mut b).unwrap();
        assert_eq!(report.out_of_bounds, 2);
        assert_eq!(report.mapped, 9);
        assert_eq!(b.count(BLOOD_POOL), 9);
    }

    #[test]
    fn test_unknown_label_dropped() {
        let mut b = buffer();
        let report = reconstructor()
            .reconstruct(set(rect(0, 0, 3, 3, 9)), &mut b)
            .unwrap();
        assert_eq!(report.unknown_label, 9);
        assert!(b.is_background());
    }

    #[test]
    fn test_remap_to_finer_grid() {
        // 1.0 mm 的原始坐标按比例映射到 0.5 mm 的标签图, 坐标放大一倍.
        let mut b = buffer();
        b.set_pixel_spacing(PixelSpacing::uniform(0.5));
        reconstructor()
            .reconstruct(set(rect(10, 10, 3, 3, BLOOD_POOL)), &mut b)
            .unwrap();
        // 落点之间出现空隙, 每个点单独成为连通分量, 都被丢弃.
        assert!(b.is_background());

        let wide = RegionReconstructor::new(ReconstructParams {
            radius: 1,
            footprint_threshold: 2.0,
            min_region_size: 8,
        })
        .unwrap();
        wide.reconstruct(set(rect(10, 10, 3, 3, BLOOD_POOL)), &mut b)
            .unwrap();
        // 3×3 个落点, 间隔为 2, 以 3×3 结构元膨胀后连成 7×7 的实心块.
        assert_eq!(b.count(BLOOD_POOL), 49);
        assert_eq!(b[(19, 19)], BLOOD_POOL);
        assert_eq!(b[(25, 25)], BLOOD_POOL);
        assert_eq!(b[(26, 26)], 0);
    }

    #[test]
    fn test_idempotent_merge() {
        let mut b = buffer();
        let r = reconstructor();
        r.reconstruct(set(rect(5, 5, 3, 3, BLOOD_POOL)), &mut b).unwrap();
        let second = r.reconstruct(set(rect(5, 5, 3, 3, BLOOD_POOL)), &mut b).unwrap();
        assert!(second.is_noop());
        assert_eq!(b.count(BLOOD_POOL), 9);
    }

    #[test]
    fn test_invalid_params() {
        let p = ReconstructParams {
            footprint_threshold: f64::INFINITY,
            ..Default::default()
        };
        assert!(RegionReconstructor::new(p).is_err());
    }
}
