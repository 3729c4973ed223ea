use crate::quantify::{CardiacMetrics, Interpretation, LabelMetrics, TissueMetrics};
use crate::sample::PixelSpacing;
use crate::{EngineResult, Idx2d, SliceKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 报告中的图像信息.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    /// 图像标识.
    pub image_id: String,
    /// 切片下标.
    pub slice_index: u32,
    /// 宽.
    pub width: usize,
    /// 高.
    pub height: usize,
    /// 像素个数.
    pub total_pixels: usize,
}

/// 组织定量报告文档.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TissueReport {
    /// 图像信息.
    pub image_info: ImageInfo,
    /// 像素间距.
    pub pixel_spacing: PixelSpacing,
    /// 每个组织的指标.
    pub tissues: Vec<LabelMetrics>,
    /// 派生指标.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived: Option<CardiacMetrics>,
    /// 临床解读.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<Interpretation>,
    /// 生成时间.
    pub generated_at: DateTime<Utc>,
}

impl TissueReport {
    /// 由定量结果生成报告.
    pub fn new(key: &SliceKey, (height, width): Idx2d, metrics: &TissueMetrics) -> Self {
        Self {
            image_info: ImageInfo {
                image_id: key.image_id.clone(),
                slice_index: key.slice_index,
                width,
                height,
                total_pixels: metrics.total_pixels,
            },
            pixel_spacing: metrics.spacing,
            tissues: metrics.tissues.clone(),
            derived: metrics.cardiac.clone(),
            interpretation: metrics.interpretation.clone(),
            generated_at: Utc::now(),
        }
    }
}

/// 将定量结果编码为 JSON 报告.
pub fn report_to_json(key: &SliceKey, shape: Idx2d, metrics: &TissueMetrics) -> EngineResult<String> {
    Ok(serde_json::to_string_pretty(&TissueReport::new(key, shape, metrics))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::cardiac::*;
    use crate::quantify::TissueQuantifier;
    use crate::taxonomy::Taxonomy;
    use crate::LabelBuffer;

    #[test]
    fn test_report_json() {
        let mut b = LabelBuffer::new(
            SliceKey::new("rep", 3),
            (10, 10),
            PixelSpacing::uniform(1.0),
            Taxonomy::cardiac(),
        );
        let region: Vec<Idx2d> = (0..10).map(|w| (0, w)).collect();
        b.paint_region(INFARCTION, &region).unwrap();
        let metrics = TissueQuantifier::new(Taxonomy::cardiac()).quantify_snapshot(&b.snapshot());
        let json = report_to_json(b.key(), b.shape(), &metrics).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["imageInfo"]["sliceIndex"], 3);
        assert_eq!(v["imageInfo"]["totalPixels"], 100);
        assert_eq!(v["tissues"][2]["name"], "Infarction");
        assert_eq!(v["tissues"][2]["displayColor"], "#0066FF");
        assert_eq!(v["tissues"][2]["pixelCount"], 10);
        assert_eq!(v["derived"]["infarctToMyocardium"], 100.0);
        assert_eq!(v["interpretation"]["infarctSeverity"], "Massive");
        assert!(v["interpretation"]["noReflowDescription"]
            .as_str()
            .unwrap()
            .starts_with("No no-reflow"));
    }
}
