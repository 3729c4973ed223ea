//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, LabelIndex};

pub use crate::data::{
    CompactLabelmap, ImgWriteRaw, ImgWriteVis, LabelBuffer, LabelMirror, LabelSnapshot, Rescale,
    SliceKey,
};

pub use crate::consts::cardiac::{BLOOD_POOL, INFARCTION, NORMAL_MYOCARDIUM, NO_REFLOW};
pub use crate::consts::BACKGROUND;

pub use crate::config::EngineConfig;
pub use crate::export::{export_sample_set, import_sample_set, report_to_json};
pub use crate::host::{ActiveImage, ImagingHost, MemoryHost};
pub use crate::quantify::{InfarctSeverity, NoReflowGrade, TissueMetrics, TissueQuantifier};
pub use crate::reconstruct::{ReconstructParams, RegionReconstructor};
pub use crate::sample::{PixelSpacing, Sample, SampleSet};
pub use crate::session::SegmentationSession;
pub use crate::taxonomy::Taxonomy;
pub use crate::{EngineError, EngineResult};
