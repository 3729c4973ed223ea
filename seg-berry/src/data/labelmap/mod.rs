//! 二维逐像素标签图 (labelmap) 的操作.

mod core;
mod mirror;
mod save;

pub use self::core::{CompactLabelmap, LabelBuffer, LabelSnapshot, SliceKey};

pub use mirror::LabelMirror;

pub use save::{ImgWriteRaw, ImgWriteVis};
