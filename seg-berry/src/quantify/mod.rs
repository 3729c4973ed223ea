//! 组织定量.
//!
//! 整个组件是纯函数: 只读取 [`LabelSnapshot`], 相同的输入总是得到逐位相同的输出.
//! 所有比值以面积 (cm²) 计算, 分母为 0 时返回 0 而不是报错.

mod bands;
mod histogram;

pub use bands::{InfarctSeverity, NoReflowGrade};
pub use histogram::{value_histogram, HistogramEntry};

use crate::consts::{BACKGROUND, MM2_PER_CM2};
use crate::sample::PixelSpacing;
use crate::taxonomy::{CardiacRoles, Rgba, Taxonomy};
use crate::{LabelIndex, LabelSnapshot};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use ndarray::parallel::prelude::*;
    }
}

/// 百分比 `x / y × 100`. 分母为 0 (或非有限值) 时返回 0.
#[inline]
pub fn ratio(x: f64, y: f64) -> f64 {
    if y == 0.0 || !y.is_finite() {
        0.0
    } else {
        x / y * 100.0
    }
}

/// 统计每个像素值的出现次数.
#[cfg(feature = "rayon")]
pub(crate) fn count_values(view: ArrayView2<LabelIndex>) -> BTreeMap<LabelIndex, usize> {
    view.into_par_iter()
        .fold(BTreeMap::new, |mut acc, &p| {
            *acc.entry(p).or_insert(0usize) += 1;
            acc
        })
        .reduce(BTreeMap::new, |mut a, b| {
            for (k, v) in b {
                *a.entry(k).or_insert(0) += v;
            }
            a
        })
}

/// 统计每个像素值的出现次数.
#[cfg(not(feature = "rayon"))]
pub(crate) fn count_values(view: ArrayView2<LabelIndex>) -> BTreeMap<LabelIndex, usize> {
    view.iter().fold(BTreeMap::new(), |mut acc, &p| {
        *acc.entry(p).or_insert(0usize) += 1;
        acc
    })
}

/// 单个标签的定量结果.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelMetrics {
    /// 标签值.
    pub index: LabelIndex,
    /// 显示名.
    pub name: String,
    /// 显示颜色.
    pub display_color: Rgba,
    /// 临床含义.
    pub description: String,
    /// 像素个数.
    pub pixel_count: usize,
    /// 占整幅图像像素的百分比.
    pub percentage: f64,
    /// 面积 (mm²).
    pub area_mm2: f64,
    /// 面积 (cm²).
    pub area_cm2: f64,
}

/// 心脏组织的派生指标. 所有比值均为百分比.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardiacMetrics {
    /// 心脏面积 (cm²): 血池 + 三类心肌.
    pub heart_area_cm2: f64,
    /// 总心肌面积 (cm²): 正常 + 梗死 + 无复流.
    pub total_myocardium_area_cm2: f64,
    /// 梗死 / 心脏.
    pub infarct_to_heart: f64,
    /// 梗死 / 总心肌.
    pub infarct_to_myocardium: f64,
    /// 无复流 / 梗死.
    pub no_reflow_to_infarct: f64,
    /// 血池 / 心脏.
    pub cavity_to_heart: f64,
    /// 无复流 / 总心肌.
    pub no_reflow_to_myocardium: f64,
    /// 无复流 / 正常心肌.
    pub no_reflow_to_normal: f64,
    /// 正常心肌 / 总心肌.
    pub normal_to_myocardium: f64,
    /// 梗死 / 正常心肌.
    pub infarct_to_normal: f64,
    /// (梗死 + 无复流) / 总心肌.
    pub transmural_to_myocardium: f64,
    /// 无复流 / (梗死 + 无复流).
    pub no_reflow_to_transmural: f64,
}

/// 临床解读.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interpretation {
    /// 梗死分级.
    pub infarct_severity: InfarctSeverity,
    /// 梗死分级描述.
    pub infarct_description: String,
    /// 无复流分级.
    pub no_reflow_grade: NoReflowGrade,
    /// 无复流分级描述.
    pub no_reflow_description: String,
}

/// 一张标签图的定量结果.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TissueMetrics {
    /// 整幅图像的像素个数.
    pub total_pixels: usize,
    /// 背景像素个数.
    pub background_pixels: usize,
    /// 值不属于分类方案的非背景像素个数.
    pub unclassified_pixels: usize,
    /// 计算所用的像素间距.
    pub spacing: PixelSpacing,
    /// 单个像素的面积 (mm²).
    pub pixel_area_mm2: f64,
    /// 每个标签的结果, 顺序与分类方案一致.
    pub tissues: Vec<LabelMetrics>,
    /// 心脏派生指标. 分类方案无法确定四种心脏组织时为 `None`.
    pub cardiac: Option<CardiacMetrics>,
    /// 临床解读, 与 `cardiac` 同时存在.
    pub interpretation: Option<Interpretation>,
}

impl TissueMetrics {
    /// 按标签值查找.
    pub fn get(&self, index: LabelIndex) -> Option<&LabelMetrics> {
        self.tissues.iter().find(|t| t.index == index)
    }

    /// 标签的面积 (cm²). 不存在的标签面积为 0.
    pub fn area_cm2(&self, index: LabelIndex) -> f64 {
        self.get(index).map_or(0.0, |t| t.area_cm2)
    }

    /// 标签的像素个数. 不存在的标签为 0.
    pub fn pixel_count(&self, index: LabelIndex) -> usize {
        self.get(index).map_or(0, |t| t.pixel_count)
    }

    /// 百分比 `area(x) / area(y) × 100`.
    pub fn ratio(&self, x: LabelIndex, y: LabelIndex) -> f64 {
        ratio(self.area_cm2(x), self.area_cm2(y))
    }

    /// 被标注的像素总数.
    pub fn labeled_pixels(&self) -> usize {
        self.tissues.iter().map(|t| t.pixel_count).sum()
    }
}

/// 组织定量器.
#[derive(Clone, Debug)]
pub struct TissueQuantifier {
    taxonomy: Arc<Taxonomy>,
}

impl TissueQuantifier {
    /// 构造.
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self { taxonomy }
    }

    /// 分类方案.
    #[inline]
    pub fn taxonomy(&self) -> &Arc<Taxonomy> {
        &self.taxonomy
    }

    /// 以快照自身的像素间距计算.
    pub fn quantify_snapshot(&self, snapshot: &LabelSnapshot) -> TissueMetrics {
        self.quantify(snapshot, snapshot.spacing())
    }

    /// 以给定的像素间距计算快照的定量结果.
    pub fn quantify(&self, snapshot: &LabelSnapshot, spacing: PixelSpacing) -> TissueMetrics {
        let counts = count_values(snapshot.array_view());
        let total_pixels = snapshot.size();
        let pixel_area_mm2 = spacing.pixel_area_mm2();

        let tissues: Vec<LabelMetrics> = self
            .taxonomy
            .entries()
            .iter()
            .map(|e| {
                let pixel_count = counts.get(&e.index).copied().unwrap_or(0);
                let area_mm2 = pixel_count as f64 * pixel_area_mm2;
                LabelMetrics {
                    index: e.index,
                    name: e.name.clone(),
                    display_color: e.display_color,
                    description: e.description.clone(),
                    pixel_count,
                    percentage: ratio(pixel_count as f64, total_pixels as f64),
                    area_mm2,
                    area_cm2: area_mm2 / MM2_PER_CM2,
                }
            })
            .collect();

        let background_pixels = counts.get(&BACKGROUND).copied().unwrap_or(0);
        let unclassified_pixels = counts
            .iter()
            .filter(|(&k, _)| k != BACKGROUND && !self.taxonomy.contains(k))
            .map(|(_, &v)| v)
            .sum();

        let mut metrics = TissueMetrics {
            total_pixels,
            background_pixels,
            unclassified_pixels,
            spacing,
            pixel_area_mm2,
            tissues,
            cardiac: None,
            interpretation: None,
        };
        if let Some(roles) = self.taxonomy.cardiac_roles() {
            let (cardiac, interpretation) = cardiac_metrics(&metrics, roles);
            metrics.cardiac = Some(cardiac);
            metrics.interpretation = Some(interpretation);
        }
        log::debug!(
            "{}: {} of {} pixels labeled",
            snapshot.key(),
            metrics.labeled_pixels(),
            total_pixels
        );
        metrics
    }
}

fn cardiac_metrics(m: &TissueMetrics, roles: CardiacRoles) -> (CardiacMetrics, Interpretation) {
    let cavity = m.area_cm2(roles.blood_pool);
    let normal = m.area_cm2(roles.normal_myocardium);
    let infarct = m.area_cm2(roles.infarction);
    let no_reflow = m.area_cm2(roles.no_reflow);

    let myocardium = normal + infarct + no_reflow;
    let heart = cavity + myocardium;
    let transmural = infarct + no_reflow;

    let cardiac = CardiacMetrics {
        heart_area_cm2: heart,
        total_myocardium_area_cm2: myocardium,
        infarct_to_heart: ratio(infarct, heart),
        infarct_to_myocardium: ratio(infarct, myocardium),
        no_reflow_to_infarct: ratio(no_reflow, infarct),
        cavity_to_heart: ratio(cavity, heart),
        no_reflow_to_myocardium: ratio(no_reflow, myocardium),
        no_reflow_to_normal: ratio(no_reflow, normal),
        normal_to_myocardium: ratio(normal, myocardium),
        infarct_to_normal: ratio(infarct, normal),
        transmural_to_myocardium: ratio(transmural, myocardium),
        no_reflow_to_transmural: ratio(no_reflow, transmural),
    };

    let infarct_severity = InfarctSeverity::classify(cardiac.infarct_to_myocardium);
    let no_reflow_grade = NoReflowGrade::classify(
        m.pixel_count(roles.no_reflow),
        cardiac.no_reflow_to_myocardium,
    );
    let interpretation = Interpretation {
        infarct_severity,
        infarct_description: infarct_severity.description().to_owned(),
        no_reflow_grade,
        no_reflow_description: no_reflow_grade.description().to_owned(),
    };
    (cardiac, interpretation)
}
