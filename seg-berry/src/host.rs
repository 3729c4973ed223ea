//! 宿主成像层的能力接口.
//!
//! 标签图引擎只向宿主查询当前图像的尺寸、像素间距、模态变换与切片下标,
//! 并在标签图变化后请求重绘. 图像解码、视口与渲染全部属于宿主.

pub use crate::data::Rescale;
use crate::sample::PixelSpacing;
use crate::{EngineError, EngineResult, Idx2d, SliceKey};

/// 宿主当前显示的图像.
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveImage {
    /// 图像标识.
    pub image_id: String,

    /// 当前切片下标.
    pub slice_index: u32,

    /// 宽.
    pub width: usize,

    /// 高.
    pub height: usize,

    /// 行优先的原始存储像素值. 宿主不提供时为空.
    pixels: Vec<i32>,
}

impl ActiveImage {
    /// 不带像素值的图像.
    pub fn new(image_id: impl Into<String>, slice_index: u32, width: usize, height: usize) -> Self {
        Self {
            image_id: image_id.into(),
            slice_index,
            width,
            height,
            pixels: vec![],
        }
    }

    /// 附带行优先的原始像素值. 长度必须等于 `宽 × 高`.
    pub fn with_pixels(mut self, pixels: Vec<i32>) -> EngineResult<Self> {
        if pixels.len() != self.width * self.height {
            return Err(EngineError::InvalidParameter(format!(
                "image {}x{} cannot hold {} pixels",
                self.width,
                self.height,
                pixels.len()
            )));
        }
        self.pixels = pixels;
        Ok(self)
    }

    /// 所属 (图像, 切片).
    pub fn key(&self) -> SliceKey {
        SliceKey::new(self.image_id.clone(), self.slice_index)
    }

    /// 形状 `(高, 宽)`.
    #[inline]
    pub fn shape(&self) -> Idx2d {
        (self.height, self.width)
    }

    /// 给定位置的原始像素值. 越界或宿主未提供像素值时返回 `None`.
    pub fn raw_at(&self, (h, w): Idx2d) -> Option<i32> {
        if h >= self.height || w >= self.width {
            return None;
        }
        self.pixels.get(h * self.width + w).copied()
    }
}

/// 宿主成像层.
pub trait ImagingHost {
    /// 当前显示的图像. 没有加载图像时返回 `None`.
    fn active_image(&self) -> Option<&ActiveImage>;

    /// 当前图像的像素间距. 未知时返回 `None`.
    fn pixel_spacing(&self) -> Option<PixelSpacing>;

    /// 当前图像的模态变换.
    fn rescale(&self) -> Rescale;

    /// 请求宿主重绘标签图叠加层.
    fn request_redraw(&mut self);

    /// 宿主是否支持分割 (涂抹) 操作?
    fn supports_segmentation(&self) -> bool {
        true
    }
}

/// 完全位于内存中的宿主. 用于测试与离线批处理.
#[derive(Clone, Debug, Default)]
pub struct MemoryHost {
    image: Option<ActiveImage>,
    spacing: Option<PixelSpacing>,
    rescale: Rescale,
    segmentation: bool,
    redraws: usize,
}

impl MemoryHost {
    /// 支持分割的空宿主.
    pub fn new() -> Self {
        Self {
            segmentation: true,
            ..Default::default()
        }
    }

    /// 显示图像.
    pub fn load(&mut self, image: ActiveImage, spacing: Option<PixelSpacing>, rescale: Rescale) {
        self.image = Some(image);
        self.spacing = spacing;
        self.rescale = rescale;
    }

    /// 关闭图像.
    pub fn unload(&mut self) {
        self.image = None;
    }

    /// 切换到同一图像的另一个切片.
    pub fn set_slice(&mut self, slice_index: u32) {
        if let Some(img) = self.image.as_mut() {
            img.slice_index = slice_index;
        }
    }

    /// 开关分割能力.
    pub fn set_segmentation_support(&mut self, enabled: bool) {
        self.segmentation = enabled;
    }

    /// 收到的重绘请求次数.
    #[inline]
    pub fn redraws(&self) -> usize {
        self.redraws
    }
}

impl ImagingHost for MemoryHost {
    fn active_image(&self) -> Option<&ActiveImage> {
        self.image.as_ref()
    }

    fn pixel_spacing(&self) -> Option<PixelSpacing> {
        self.spacing
    }

    fn rescale(&self) -> Rescale {
        self.rescale
    }

    fn request_redraw(&mut self) {
        self.redraws += 1;
    }

    fn supports_segmentation(&self) -> bool {
        self.segmentation
    }
}
