//! 标签图的持久化存储.

use super::{LabelBuffer, LabelSnapshot};
use image::error::{ParameterError, ParameterErrorKind};
use image::{ImageBuffer, ImageError, ImageResult, Luma, Rgba as ImgRgba, RgbaImage};
use std::path::Path;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// 标签图会按照分类方案的颜色查找表保存为 RGBA 图像: 背景透明,
/// 未声明的标签为浅灰.
pub trait ImgWriteVis {
    /// 按照一定的可视化规则将图片保存到 `path` 路径.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 表明一个可以通过 **按原样** 模式持久化存储的图像对象.
///
/// 标签图会保存为 16 位灰度图像, 像素值即标签值, 可以用
/// [`LabelBuffer::open_mask`] 重新读入.
pub trait ImgWriteRaw {
    /// 按原样将图片保存到 `path` 路径.
    fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

macro_rules! impl_labelmap_save {
    ($($map: ty),+) => {
        $(
            impl ImgWriteVis for $map {
                fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
                    let (height, width) = self.shape();
                    let lut = self.taxonomy().lut();
                    let mut buf = RgbaImage::new(width as u32, height as u32);
                    for ((h, w), &pix) in self.indexed_iter() {
                        let color = lut.get(pix as usize).copied().unwrap_or_else(|| self.color_for(pix));
                        buf.put_pixel(w as u32, h as u32, ImgRgba(color.0));
                    }
                    buf.save(path)
                }
            }

            impl ImgWriteRaw for $map {
                fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
                    let (height, width) = self.shape();
                    let raw = self.as_row_major_vec();
                    let buf: ImageBuffer<Luma<u16>, Vec<u16>> =
                        ImageBuffer::from_raw(width as u32, height as u32, raw).ok_or_else(|| {
                            ImageError::Parameter(ParameterError::from_kind(
                                ParameterErrorKind::DimensionMismatch,
                            ))
                        })?;
                    buf.save(path)
                }
            }
        )+
    };
}

impl_labelmap_save!(LabelBuffer, LabelSnapshot);
