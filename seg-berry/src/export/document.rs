//! 样本集文档.
//!
//! ```text
//! totalPixelCount: int
//! imageId: string
//! sliceIndex: int
//! segmentsFound: [{segmentIndex: int, colorName: string}]
//! pixels: [{x, y, segmentIndex, colorName, rawValue, modalityValue, normalizedX, normalizedY}]
//! originalPixelSpacing: {column: number, row: number}
//! extractedAt: ISO-8601
//! ```

use crate::sample::{PixelSpacing, Sample, SampleSet};
use crate::taxonomy::Taxonomy;
use crate::{EngineError, EngineResult, LabelIndex};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 文档中的一个分割标签.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentEntry {
    /// 标签值.
    pub segment_index: LabelIndex,
    /// 标签显示名.
    pub color_name: String,
}

/// 文档中的一个像素.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixelEntry {
    /// 列坐标.
    pub x: i32,
    /// 行坐标.
    pub y: i32,
    /// 标签值. 缺失时按 `color_name` 查找.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_index: Option<LabelIndex>,
    /// 标签显示名.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_name: Option<String>,
    /// 原始像素值.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_value: Option<i32>,
    /// 模态值.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modality_value: Option<f64>,
    /// 归一化列坐标.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_x: Option<f64>,
    /// 归一化行坐标.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_y: Option<f64>,
}

/// 文档中的像素间距.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpacingEntry {
    /// 列间距.
    pub column: f64,
    /// 行间距.
    pub row: f64,
}

/// 样本集文档. `pixels` 与 `originalPixelSpacing` 是必需字段, 其余字段可以缺失.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleSetDocument {
    /// 像素个数.
    #[serde(default)]
    pub total_pixel_count: Option<usize>,
    /// 图像标识.
    #[serde(default)]
    pub image_id: Option<String>,
    /// 切片下标.
    #[serde(default)]
    pub slice_index: Option<u32>,
    /// 出现过的标签.
    #[serde(default)]
    pub segments_found: Vec<SegmentEntry>,
    /// 全部像素.
    #[serde(default)]
    pub pixels: Option<Vec<PixelEntry>>,
    /// 采集时的像素间距.
    #[serde(default)]
    pub original_pixel_spacing: Option<SpacingEntry>,
    /// 导出时间.
    #[serde(default)]
    pub extracted_at: Option<String>,
}

fn format_error(msg: impl Into<String>) -> EngineError {
    EngineError::InvalidSampleSetFormat(msg.into())
}

impl SampleSetDocument {
    /// 由样本集生成文档. 导出时间为当前时间.
    pub fn from_sample_set(set: &SampleSet, taxonomy: &Taxonomy) -> Self {
        let pixels: Vec<PixelEntry> = set
            .samples()
            .iter()
            .map(|s| PixelEntry {
                x: s.x,
                y: s.y,
                segment_index: Some(s.label),
                color_name: Some(taxonomy.name_for(s.label).to_owned()),
                raw_value: Some(s.raw_value),
                modality_value: Some(s.modality_value),
                normalized_x: s.normalized.map(|(nx, _)| nx),
                normalized_y: s.normalized.map(|(_, ny)| ny),
            })
            .collect();
        let segments_found = set
            .segments_found()
            .into_iter()
            .map(|segment_index| SegmentEntry {
                segment_index,
                color_name: taxonomy.name_for(segment_index).to_owned(),
            })
            .collect();
        Self {
            total_pixel_count: Some(pixels.len()),
            image_id: Some(set.image_id.clone()),
            slice_index: Some(set.slice_index),
            segments_found,
            pixels: Some(pixels),
            original_pixel_spacing: Some(SpacingEntry {
                column: set.source_spacing.col,
                row: set.source_spacing.row,
            }),
            extracted_at: Some(Utc::now().to_rfc3339()),
        }
    }

    /// 转换为样本集. 整体成功或整体失败.
    ///
    /// 每个像素的标签优先取 `segmentIndex`, 缺失时按 `colorName` 在分类方案中查找.
    pub fn into_sample_set(self, taxonomy: &Taxonomy) -> EngineResult<SampleSet> {
        let pixels = self.pixels.ok_or_else(|| format_error("missing `pixels`"))?;
        let spacing = self
            .original_pixel_spacing
            .ok_or_else(|| format_error("missing `originalPixelSpacing`"))?;
        let spacing = PixelSpacing::new(spacing.row, spacing.column).ok_or_else(|| {
            format_error(format!(
                "invalid `originalPixelSpacing` {{column: {}, row: {}}}",
                spacing.column, spacing.row
            ))
        })?;

        let samples = pixels
            .into_iter()
            .enumerate()
            .map(|(i, p)| {
                let label = match (p.segment_index, p.color_name.as_deref()) {
                    (Some(index), _) => index,
                    (None, Some(name)) => taxonomy
                        .by_name(name)
                        .map(|e| e.index)
                        .ok_or_else(|| format_error(format!("pixel {i}: unknown color name `{name}`")))?,
                    (None, None) => {
                        return Err(format_error(format!("pixel {i}: missing segment index")))
                    }
                };
                taxonomy.check_paintable(label)?;
                let normalized = match (p.normalized_x, p.normalized_y) {
                    (Some(nx), Some(ny)) => Some((nx, ny)),
                    _ => None,
                };
                let raw_value = p.raw_value.unwrap_or(0);
                Ok(Sample {
                    x: p.x,
                    y: p.y,
                    normalized,
                    label,
                    raw_value,
                    modality_value: p.modality_value.unwrap_or(raw_value as f64),
                })
            })
            .collect::<EngineResult<Vec<_>>>()?;

        if let Some(total) = self.total_pixel_count {
            if total != samples.len() {
                log::warn!(
                    "sample set document claims {total} pixels but carries {}",
                    samples.len()
                );
            }
        }

        let captured_at = match self.extracted_at.as_deref() {
            Some(ts) => DateTime::parse_from_rfc3339(ts)
                .map_err(|e| format_error(format!("invalid `extractedAt` `{ts}`: {e}")))?
                .with_timezone(&Utc),
            None => Utc::now(),
        };

        let mut set = SampleSet::with_samples(
            self.image_id.unwrap_or_default(),
            self.slice_index.unwrap_or(0),
            spacing,
            samples,
        );
        set.captured_at = captured_at;
        Ok(set)
    }
}

/// 将样本集编码为 JSON 文档. 导出时间被重新生成.
pub fn export_sample_set(set: &SampleSet, taxonomy: &Taxonomy) -> EngineResult<String> {
    let doc = SampleSetDocument::from_sample_set(set, taxonomy);
    let json = serde_json::to_string_pretty(&doc)?;
    log::info!(
        "exported {} samples of `{}`#{}",
        set.len(),
        set.image_id,
        set.slice_index
    );
    Ok(json)
}

/// 解析 JSON 文档为样本集. 缺少 `pixels` 或 `originalPixelSpacing`,
/// 或任意像素非法时返回 [`EngineError::InvalidSampleSetFormat`] (或标签相关错误),
/// 且不会产生任何部分结果.
pub fn import_sample_set(json: &str, taxonomy: &Taxonomy) -> EngineResult<SampleSet> {
    let doc: SampleSetDocument =
        serde_json::from_str(json).map_err(|e| format_error(e.to_string()))?;
    let set = doc.into_sample_set(taxonomy)?;
    log::info!(
        "imported {} samples of `{}`#{}",
        set.len(),
        set.image_id,
        set.slice_index
    );
    Ok(set)
}

/// 从文件读取样本集.
pub fn read_sample_set<P: AsRef<Path>>(path: P, taxonomy: &Taxonomy) -> EngineResult<SampleSet> {
    let json = std::fs::read_to_string(path)?;
    import_sample_set(&json, taxonomy)
}

/// 将样本集写入文件.
pub fn write_sample_set<P: AsRef<Path>>(
    path: P,
    set: &SampleSet,
    taxonomy: &Taxonomy,
) -> EngineResult<()> {
    let json = export_sample_set(set, taxonomy)?;
    std::fs::write(path, json)?;
    Ok(())
}
