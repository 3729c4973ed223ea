use super::{count_values, ratio};
use crate::{LabelIndex, LabelSnapshot};
use serde::{Deserialize, Serialize};

/// 一个像素值的出现频率.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramEntry {
    /// 像素值.
    pub value: LabelIndex,
    /// 出现次数.
    pub count: usize,
    /// 占整幅图像的百分比.
    pub percentage: f64,
}

/// 出现最频繁的 `top_n` 个像素值 (包括背景), 按次数降序, 次数相同时按像素值升序.
///
/// 用于检查导入的掩膜是否真的只含有预期的标签值.
pub fn value_histogram(snapshot: &LabelSnapshot, top_n: usize) -> Vec<HistogramEntry> {
    let total = snapshot.size() as f64;
    let mut entries: Vec<HistogramEntry> = count_values(snapshot.array_view())
        .into_iter()
        .map(|(value, count)| HistogramEntry {
            value,
            count,
            percentage: ratio(count as f64, total),
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then(a.value.cmp(&b.value)));
    entries.truncate(top_n);
    entries
}
