use super::LabelMirror;
use crate::consts::BACKGROUND;
use crate::data::areas4;
use crate::sample::PixelSpacing;
use crate::taxonomy::{Rgba, Taxonomy};
use crate::{Areas2d, EngineError, EngineResult, Idx2d, LabelIndex};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use ndarray::iter::Iter;
use ndarray::{Array2, ArrayView2, Ix2};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{Read, Write};
use std::ops::Index;
use std::path::Path;
use std::sync::Arc;

/// 标签图的归属: (图像标识, 切片下标).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceKey {
    /// 图像标识.
    pub image_id: String,

    /// 切片下标.
    pub slice_index: u32,
}

impl SliceKey {
    /// 构造.
    pub fn new(image_id: impl Into<String>, slice_index: u32) -> Self {
        Self {
            image_id: image_id.into(),
            slice_index,
        }
    }
}

impl fmt::Display for SliceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.image_id, self.slice_index)
    }
}

/// 可变的稠密标签图. 每个像素存储一个标签值, 0 为背景.
///
/// 标签图只能通过涂抹、擦除、镜像恢复和整体替换修改;
/// 任何写入都只接受属于分类方案的非 0 标签.
#[derive(Clone, Debug)]
pub struct LabelBuffer {
    key: SliceKey,
    data: Array2<LabelIndex>,
    spacing: PixelSpacing,
    taxonomy: Arc<Taxonomy>,
}

/// 标签图在某一时刻的不可变副本. 定量分析只读取快照.
#[derive(Clone, Debug)]
pub struct LabelSnapshot {
    key: SliceKey,
    data: Array2<LabelIndex>,
    spacing: PixelSpacing,
    taxonomy: Arc<Taxonomy>,
}

/// 标签图不可变方法集合.
macro_rules! impl_labelmap_immut {
    ($($map: ty),+) => {
        $(
        /// 不可变方法集合.
        impl $map {
            /// 所属 (图像, 切片).
            #[inline]
            pub fn key(&self) -> &SliceKey {
                &self.key
            }

            /// 像素间距.
            #[inline]
            pub fn spacing(&self) -> PixelSpacing {
                self.spacing
            }

            /// 分类方案.
            #[inline]
            pub fn taxonomy(&self) -> &Arc<Taxonomy> {
                &self.taxonomy
            }

            /// 获得 **底层** 数据的一份不可变 shallow copy.
            #[inline]
            pub fn array_view(&self) -> ArrayView2<LabelIndex> {
                self.data.view()
            }

            /// 获取可以迭代图像像素的迭代器.
            #[inline]
            pub fn iter(&self) -> Iter<'_, LabelIndex, Ix2> {
                self.data.iter()
            }

            /// 以行优先规则, 获取能迭代图像所有 `(索引, 像素值)` 的迭代器.
            #[inline]
            pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &LabelIndex)> {
                self.data.indexed_iter()
            }

            /// 获取给定位置 (高, 宽) 的像素值. 越界时返回 `None`.
            #[inline]
            pub fn get(&self, pos: Idx2d) -> Option<&LabelIndex> {
                self.data.get(pos)
            }

            /// 图像的分辨率 (高, 宽).
            #[inline]
            pub fn shape(&self) -> Idx2d {
                self.data.dim()
            }

            /// 获得图像的高.
            #[inline]
            pub fn height(&self) -> usize {
                self.shape().0
            }

            /// 获得图像的宽.
            #[inline]
            pub fn width(&self) -> usize {
                self.shape().1
            }

            /// 图像的像素个数.
            #[inline]
            pub fn size(&self) -> usize {
                self.data.len()
            }

            /// 判断一个索引是否合法 (未越界).
            #[inline]
            pub fn check(&self, (h, w): Idx2d) -> bool {
                let (h_len, w_len) = self.shape();
                h < h_len && w < w_len
            }

            /// 该图是否为全背景图?
            #[inline]
            pub fn is_background(&self) -> bool {
                self.data.iter().all(|&p| p == BACKGROUND)
            }

            /// 统计图像中值为 `label` 的像素总个数.
            #[inline]
            pub fn count(&self, label: LabelIndex) -> usize {
                self.data.iter().filter(|&&p| p == label).count()
            }

            /// 统计每个 **非背景** 像素值的个数, 按像素值升序.
            pub fn label_counts(&self) -> BTreeMap<LabelIndex, usize> {
                self.data
                    .iter()
                    .filter(|&&p| p != BACKGROUND)
                    .fold(BTreeMap::new(), |mut acc, &p| {
                        *acc.entry(p).or_insert(0) += 1;
                        acc
                    })
            }

            /// 将图像转化为行优先的序列化存储.
            pub fn as_row_major_vec(&self) -> Vec<LabelIndex> {
                self.data.iter().copied().collect()
            }

            /// 获得行优先存储的序列化数据.
            /// 当原始数据本身就是行优先格式时, 可以避免一次 deepcopy.
            pub fn as_row_major_slice(&self) -> Cow<[LabelIndex]> {
                match self.data.as_slice() {
                    Some(s) => Cow::Borrowed(s),
                    None => Cow::Owned(self.as_row_major_vec()),
                }
            }

            /// 获取拥有所有权的镜像, 供以后可能的恢复.
            #[inline]
            pub fn mirror(&self) -> LabelMirror {
                LabelMirror(self.as_row_major_vec())
            }

            /// 标签值对应的显示颜色.
            #[inline]
            pub fn color_for(&self, label: LabelIndex) -> Rgba {
                self.taxonomy.color_for(label)
            }

            /// 给定位置像素的显示颜色. 越界时返回 `None`.
            #[inline]
            pub fn color_at(&self, pos: Idx2d) -> Option<Rgba> {
                self.get(pos).map(|&p| self.color_for(p))
            }

            /// 按照 4-相邻原则获得图像中所有值为 `label` 的区域.
            pub fn areas_of(&self, label: LabelIndex) -> Areas2d {
                areas4(self.shape(), |pos| self.data[pos] == label)
            }
        }

        impl Index<Idx2d> for $map {
            type Output = LabelIndex;

            #[inline]
            fn index(&self, index: Idx2d) -> &Self::Output {
                &self.data[index]
            }
        }
        )+
    };
}

impl_labelmap_immut!(LabelBuffer, LabelSnapshot);

/// 检查掩膜中的像素值都是背景或者分类方案中的标签.
fn check_mask(data: &Array2<LabelIndex>, taxonomy: &Taxonomy) -> EngineResult<()> {
    match data.iter().find(|&&p| p != BACKGROUND && !taxonomy.contains(p)) {
        Some(&p) => Err(EngineError::UnknownLabel(p)),
        None => Ok(()),
    }
}

impl LabelBuffer {
    /// 全背景标签图.
    pub fn new(key: SliceKey, shape: Idx2d, spacing: PixelSpacing, taxonomy: Arc<Taxonomy>) -> Self {
        Self {
            key,
            data: Array2::zeros(shape),
            spacing,
            taxonomy,
        }
    }

    /// 由行优先存储的掩膜构造. 掩膜中的像素值即标签值.
    ///
    /// 掩膜长度必须等于 `高 × 宽`, 且每个非 0 值都必须属于分类方案.
    pub fn from_mask(
        key: SliceKey,
        shape: Idx2d,
        values: Vec<LabelIndex>,
        spacing: PixelSpacing,
        taxonomy: Arc<Taxonomy>,
    ) -> EngineResult<Self> {
        let (h, w) = shape;
        if values.len() != h * w {
            return Err(EngineError::InvalidParameter(format!(
                "mask has {} values but the image is {h}x{w}",
                values.len()
            )));
        }
        let data = Array2::from_shape_vec(shape, values)
            .map_err(|e| EngineError::InvalidParameter(e.to_string()))?;
        check_mask(&data, &taxonomy)?;
        Ok(Self {
            key,
            data,
            spacing,
            taxonomy,
        })
    }

    /// 从灰度图像文件读取掩膜. 8 位与 16 位灰度的像素值按原样作为标签值,
    /// 其他格式先转换为 8 位灰度.
    pub fn open_mask<P: AsRef<Path>>(
        path: P,
        key: SliceKey,
        spacing: PixelSpacing,
        taxonomy: Arc<Taxonomy>,
    ) -> EngineResult<Self> {
        let img = image::open(path)?;
        let (w, h) = (img.width() as usize, img.height() as usize);
        let values: Vec<LabelIndex> = match img {
            image::DynamicImage::ImageLuma16(buf) => buf.into_raw(),
            image::DynamicImage::ImageLuma8(buf) => buf.into_raw().into_iter().map(u16::from).collect(),
            other => other.into_luma8().into_raw().into_iter().map(u16::from).collect(),
        };
        Self::from_mask(key, (h, w), values, spacing, taxonomy)
    }

    /// 修改像素间距. 这是修改间距的唯一入口.
    pub fn set_pixel_spacing(&mut self, spacing: PixelSpacing) {
        self.spacing = spacing;
    }

    /// 将 `region` 中的所有像素写为 `label`, 返回实际发生变化的像素个数.
    ///
    /// `label` 为 0 或不属于分类方案, 或者任意索引越界时, 返回错误且不修改任何像素.
    pub fn paint_region(&mut self, label: LabelIndex, region: &[Idx2d]) -> EngineResult<usize> {
        self.taxonomy.check_paintable(label)?;
        if let Some(&bad) = region.iter().find(|p| !self.check(**p)) {
            return Err(EngineError::ShapeMismatch {
                expected: self.shape(),
                found: bad,
            });
        }
        let mut cnt = 0usize;
        for &pos in region {
            let pix = &mut self.data[pos];
            if *pix != label {
                *pix = label;
                cnt += 1;
            }
        }
        Ok(cnt)
    }

    /// 将掩膜中为 `true` 的像素写为 `label`, 返回实际发生变化的像素个数.
    pub fn paint_mask(&mut self, label: LabelIndex, mask: ArrayView2<bool>) -> EngineResult<usize> {
        self.taxonomy.check_paintable(label)?;
        if mask.dim() != self.shape() {
            return Err(EngineError::ShapeMismatch {
                expected: self.shape(),
                found: mask.dim(),
            });
        }
        let mut cnt = 0usize;
        ndarray::Zip::from(&mut self.data)
            .and(&mask)
            .for_each(|pix, &m| {
                if m && *pix != label {
                    *pix = label;
                    cnt += 1;
                }
            });
        Ok(cnt)
    }

    /// 将值为 `old` 的像素全部替换为 `new`, 返回替换个数.
    fn replace(&mut self, old: LabelIndex, new: LabelIndex) -> usize {
        let mut cnt = 0usize;
        self.data.iter_mut().filter(|p| **p == old).for_each(|p| {
            cnt += 1;
            *p = new;
        });
        cnt
    }

    /// 将标签 `label` 的所有像素恢复为背景, 返回被擦除的像素个数.
    pub fn erase(&mut self, label: LabelIndex) -> usize {
        if label == BACKGROUND {
            return 0;
        }
        self.replace(label, BACKGROUND)
    }

    /// 将所有像素恢复为背景, 返回被擦除的像素个数.
    pub fn erase_all(&mut self) -> usize {
        let mut cnt = 0usize;
        self.data.iter_mut().filter(|p| **p != BACKGROUND).for_each(|p| {
            cnt += 1;
            *p = BACKGROUND;
        });
        cnt
    }

    /// 用 `mirror` 覆写原本 `self` 的内容.
    pub fn resume(&mut self, mirror: &LabelMirror) -> EngineResult<()> {
        if mirror.0.len() != self.size() {
            return Err(EngineError::InvalidParameter(format!(
                "mirror has {} pixels, expected {}",
                mirror.0.len(),
                self.size()
            )));
        }
        for (w, r) in self.data.iter_mut().zip(mirror.0.iter()) {
            *w = *r;
        }
        Ok(())
    }

    /// 用快照覆写原本 `self` 的内容, 包括像素间距.
    pub fn restore(&mut self, snapshot: &LabelSnapshot) -> EngineResult<()> {
        if snapshot.shape() != self.shape() {
            return Err(EngineError::ShapeMismatch {
                expected: self.shape(),
                found: snapshot.shape(),
            });
        }
        self.data.assign(&snapshot.data);
        self.spacing = snapshot.spacing;
        Ok(())
    }

    /// 获得当前内容的不可变快照.
    pub fn snapshot(&self) -> LabelSnapshot {
        LabelSnapshot {
            key: self.key.clone(),
            data: self.data.clone(),
            spacing: self.spacing,
            taxonomy: Arc::clone(&self.taxonomy),
        }
    }
}

impl LabelSnapshot {
    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<LabelIndex> {
        self.data
    }

    /// 压缩数据. 像素以小端 `u16` 写入 zlib 流.
    pub fn compress(&self) -> EngineResult<CompactLabelmap> {
        let mut e = ZlibEncoder::new(Vec::with_capacity(64), Compression::best());
        for p in self.data.iter() {
            e.write_all(&p.to_le_bytes())?;
        }
        Ok(CompactLabelmap {
            key: self.key.clone(),
            spacing: self.spacing,
            buf: e.finish()?,
            sh: self.shape(),
        })
    }
}

/// 压缩存储的 [`LabelSnapshot`]; 不透明类型.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactLabelmap {
    key: SliceKey,
    spacing: PixelSpacing,

    /// 压缩的不透明字节流.
    buf: Vec<u8>,

    /// 形状.
    sh: Idx2d,
}

/// 解压缩时预先分配的最大字节数.
const MAX_DECOMPRESS_RESERVE: usize = 1 << 24;

impl CompactLabelmap {
    /// 压缩后的字节数.
    #[inline]
    pub fn compressed_len(&self) -> usize {
        self.buf.len()
    }

    /// 解压缩数据. 分类方案不随压缩数据保存, 需要重新提供.
    pub fn decompress(self, taxonomy: Arc<Taxonomy>) -> EngineResult<LabelSnapshot> {
        let Self {
            key,
            spacing,
            buf,
            sh: (h, w),
        } = self;
        let expected = h
            .checked_mul(w)
            .and_then(|n| n.checked_mul(2))
            .ok_or_else(|| EngineError::InvalidParameter(format!("labelmap shape {h}x{w} overflows")))?;
        // 多读一个字节, 以发现比声明形状更长的数据.
        let mut d = ZlibDecoder::new(buf.as_slice()).take((expected as u64).saturating_add(1));
        let mut bytes = Vec::with_capacity(expected.min(MAX_DECOMPRESS_RESERVE));
        d.read_to_end(&mut bytes)?;
        if bytes.len() != expected {
            return Err(EngineError::InvalidParameter(format!(
                "compressed labelmap holds {} bytes, expected {expected}",
                bytes.len(),
            )));
        }
        let values = bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        let data = Array2::from_shape_vec((h, w), values)
            .map_err(|e| EngineError::InvalidParameter(e.to_string()))?;
        Ok(LabelSnapshot {
            key,
            data,
            spacing,
            taxonomy,
        })
    }
}
