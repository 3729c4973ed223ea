//! 样本集与定量报告的 JSON 文档.

mod document;
mod report;

pub use document::{
    export_sample_set, import_sample_set, read_sample_set, write_sample_set, PixelEntry,
    SampleSetDocument, SegmentEntry, SpacingEntry,
};
pub use report::{report_to_json, ImageInfo, TissueReport};
