//! 分割会话.
//!
//! 会话显式持有宿主、配置、样本收集器以及每个 (图像, 切片) 的标签图,
//! 所有修改标签图的操作都经由会话进行, 且每次修改后请求宿主重绘.

use crate::consts::BACKGROUND;
use crate::export::{export_sample_set, import_sample_set, report_to_json};
use crate::host::{ActiveImage, ImagingHost};
use crate::quantify::{TissueMetrics, TissueQuantifier};
use crate::reconstruct::{ReconstructParams, ReconstructReport, RegionReconstructor};
use crate::sample::{PixelSampleStore, PixelSpacing, Sample, SampleSet};
use crate::taxonomy::Taxonomy;
use crate::config::check_brush_radius;
use crate::{EngineConfig, EngineError, EngineResult, LabelBuffer, LabelIndex, SliceKey};
use std::collections::HashMap;
use std::sync::Arc;

/// 取出 (必要时创建) 当前图像对应的标签图.
fn ensure_buffer<'a>(
    buffers: &'a mut HashMap<SliceKey, LabelBuffer>,
    img: &ActiveImage,
    spacing: PixelSpacing,
    taxonomy: &Arc<Taxonomy>,
) -> &'a mut LabelBuffer {
    let key = img.key();
    buffers.entry(key.clone()).or_insert_with(|| {
        log::debug!("{key}: new {}x{} labelmap", img.width, img.height);
        LabelBuffer::new(key, img.shape(), spacing, taxonomy.clone())
    })
}

/// 半径为 `r` 的圆盘画笔覆盖的偏移量 `(dx, dy)`.
fn brush_offsets(r: u32) -> impl Iterator<Item = (i64, i64)> {
    let r = i64::from(r);
    (-r..=r).flat_map(move |dy| (-r..=r).filter(move |dx| dx * dx + dy * dy <= r * r).map(move |dx| (dx, dy)))
}

/// 分割会话.
pub struct SegmentationSession<H: ImagingHost> {
    host: H,
    config: EngineConfig,
    taxonomy: Arc<Taxonomy>,
    reconstructor: RegionReconstructor,
    quantifier: TissueQuantifier,
    store: PixelSampleStore,
    buffers: HashMap<SliceKey, LabelBuffer>,
}

impl<H: ImagingHost> SegmentationSession<H> {
    /// 构造. 配置非法时返回错误.
    pub fn new(host: H, taxonomy: Arc<Taxonomy>, config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let reconstructor = RegionReconstructor::new(config.reconstruct)?
            .with_default_spacing(config.default_spacing_mm);
        Ok(Self {
            host,
            config,
            quantifier: TissueQuantifier::new(taxonomy.clone()),
            store: PixelSampleStore::new(taxonomy.clone()),
            taxonomy,
            reconstructor,
            buffers: HashMap::new(),
        })
    }

    /// 宿主.
    #[inline]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// 宿主.
    #[inline]
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// 配置.
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 分类方案.
    #[inline]
    pub fn taxonomy(&self) -> &Arc<Taxonomy> {
        &self.taxonomy
    }

    /// 指定切片的标签图.
    pub fn buffer(&self, key: &SliceKey) -> Option<&LabelBuffer> {
        self.buffers.get(key)
    }

    /// 当前图像的标签图. 尚未涂抹过的切片返回 `None`.
    pub fn active_buffer(&self) -> Option<&LabelBuffer> {
        let key = self.host.active_image()?.key();
        self.buffers.get(&key)
    }

    /// 正在收集的笔画样本个数.
    pub fn pending_samples(&self) -> usize {
        self.store.len()
    }

    /// 修改画笔半径. 超过 [`crate::consts::MAX_BRUSH_RADIUS`] 时返回错误.
    pub fn set_brush_radius(&mut self, radius: u32) -> EngineResult<()> {
        check_brush_radius(radius)?;
        self.config.brush_radius = radius;
        Ok(())
    }

    /// 修改区域重建参数.
    pub fn set_reconstruct_params(&mut self, params: ReconstructParams) -> EngineResult<()> {
        self.reconstructor =
            RegionReconstructor::new(params)?.with_default_spacing(self.config.default_spacing_mm);
        self.config.reconstruct = params;
        Ok(())
    }

    fn active(&self) -> EngineResult<&ActiveImage> {
        self.host.active_image().ok_or(EngineError::NoImageLoaded)
    }

    fn require_segmentation(&self) -> EngineResult<()> {
        if self.host.supports_segmentation() {
            Ok(())
        } else {
            Err(EngineError::HostCapabilityUnavailable("segmentation"))
        }
    }

    /// 可以写入标签图的当前图像.
    fn writable(&self) -> EngineResult<&ActiveImage> {
        self.require_segmentation()?;
        self.active()
    }

    fn spacing(&self) -> PixelSpacing {
        self.host
            .pixel_spacing()
            .unwrap_or(PixelSpacing::uniform(self.config.default_spacing_mm))
    }

    /// 在 `(x, y)` 处落下一次画笔, 返回记录的样本个数.
    ///
    /// 画笔覆盖的每个图像内像素都成为一个样本, 直到 [`Self::end_stroke`] 才写入标签图.
    /// 笔画进行中切换了切片时返回 [`EngineError::InconsistentSlice`].
    pub fn add_stroke_point(&mut self, x: i32, y: i32, label: LabelIndex) -> EngineResult<usize> {
        self.require_segmentation()?;
        self.taxonomy.check_paintable(label)?;
        let spacing = self.spacing();
        let rescale = self.host.rescale();
        let img = self.host.active_image().ok_or(EngineError::NoImageLoaded)?;

        let key = img.key();
        match self.store.pending().map(|p| (p.key(), p.is_empty(), p.slice_index)) {
            Some((k, false, expected)) if k != key => {
                return Err(EngineError::InconsistentSlice {
                    expected,
                    found: img.slice_index,
                });
            }
            Some((k, _, _)) if k == key => {}
            _ => {
                self.store.begin(img.image_id.clone(), img.slice_index, spacing);
            }
        }

        let (height, width) = img.shape();
        // 超出图像范围的画笔不会覆盖更多像素.
        let radius = u32::try_from(height.max(width)).map_or(self.config.brush_radius, |extent| {
            self.config.brush_radius.min(extent)
        });
        let samples: Vec<Sample> = brush_offsets(radius)
            .filter_map(|(dx, dy)| {
                let (px, py) = (i64::from(x) + dx, i64::from(y) + dy);
                let (h, w) = (usize::try_from(py).ok()?, usize::try_from(px).ok()?);
                if h >= height || w >= width {
                    return None;
                }
                let raw = img.raw_at((h, w)).unwrap_or(0);
                Some(
                    Sample::new(i32::try_from(px).ok()?, i32::try_from(py).ok()?, label)
                        .with_spacing(spacing)
                        .with_value(raw, rescale),
                )
            })
            .collect();
        self.store.push_batch(samples)
    }

    /// 结束当前笔画, 将收集到的样本重建进笔画所在切片的标签图.
    ///
    /// 当前显示的不是笔画所在的切片时返回 [`EngineError::InconsistentSlice`].
    /// 出错时笔画保持待处理状态.
    pub fn end_stroke(&mut self) -> EngineResult<ReconstructReport> {
        if self.store.is_empty() {
            self.store.take();
            return Ok(ReconstructReport::default());
        }
        let img = self.writable()?;
        if let Some(p) = self.store.pending().filter(|p| p.key() != img.key()) {
            return Err(EngineError::InconsistentSlice {
                expected: p.slice_index,
                found: img.slice_index,
            });
        }
        self.reconstruct_pending()
    }

    /// 丢弃尚未结束的笔画, 返回丢弃的样本个数.
    pub fn discard_stroke(&mut self) -> usize {
        self.store.take().map_or(0, |set| set.len())
    }

    /// 将样本集重建进当前图像的标签图. 样本坐标按两者的像素间距重映射.
    pub fn apply_sample_set(&mut self, set: SampleSet) -> EngineResult<ReconstructReport> {
        self.writable()?;
        self.reconstruct_into_active(set)
    }

    /// 取走收集器中的样本集并重建. 调用前已检查宿主能力与当前图像.
    fn reconstruct_pending(&mut self) -> EngineResult<ReconstructReport> {
        match self.store.take() {
            Some(set) => self.reconstruct_into_active(set),
            None => Ok(ReconstructReport::default()),
        }
    }

    fn reconstruct_into_active(&mut self, set: SampleSet) -> EngineResult<ReconstructReport> {
        let spacing = self.spacing();
        let img = self.host.active_image().ok_or(EngineError::NoImageLoaded)?;
        if set.image_id != img.image_id {
            log::debug!(
                "applying samples of `{}` onto `{}`",
                set.image_id,
                img.image_id
            );
        }
        let buffer = ensure_buffer(&mut self.buffers, img, spacing, &self.taxonomy);
        let report = self.reconstructor.reconstruct(set, buffer)?;
        if !report.is_noop() {
            self.host.request_redraw();
        }
        Ok(report)
    }

    /// 导入 JSON 样本集文档并重建进当前图像的标签图.
    ///
    /// 导入的样本与尚未结束的同一切片笔画合并后一起重建. 文档非法, 或与待处理笔画
    /// 的切片、像素间距不一致时不修改任何状态.
    pub fn import_sample_set_json(&mut self, json: &str) -> EngineResult<ReconstructReport> {
        self.writable()?;
        let set = import_sample_set(json, &self.taxonomy)?;
        log::info!(
            "imported {} samples of `{}`#{}",
            set.len(),
            set.image_id,
            set.slice_index
        );
        self.store.import(set)?;
        self.reconstruct_pending()
    }

    /// 以行优先存储的稠密掩膜替换当前切片的标签图, 返回非背景像素个数.
    pub fn import_mask(&mut self, values: Vec<LabelIndex>) -> EngineResult<usize> {
        self.require_segmentation()?;
        let spacing = self.spacing();
        let img = self.active()?;
        let buffer = LabelBuffer::from_mask(img.key(), img.shape(), values, spacing, self.taxonomy.clone())?;
        let labeled = buffer.size() - buffer.count(BACKGROUND);
        log::info!("{}: imported mask with {labeled} labeled pixels", buffer.key());
        self.buffers.insert(buffer.key().clone(), buffer);
        self.host.request_redraw();
        Ok(labeled)
    }

    /// 将当前标签图的每个非背景像素提取为样本, 按行优先顺序排列.
    pub fn extract_sample_set(&self) -> EngineResult<SampleSet> {
        let img = self.active()?;
        let spacing = self.spacing();
        let rescale = self.host.rescale();
        let mut dropped = 0usize;
        let samples: Vec<Sample> = match self.buffers.get(&img.key()) {
            Some(buffer) => buffer
                .indexed_iter()
                .filter(|&(_, &l)| l != BACKGROUND)
                .filter_map(|((h, w), &l)| {
                    if !self.taxonomy.contains(l) {
                        dropped += 1;
                        return None;
                    }
                    let raw = img.raw_at((h, w)).unwrap_or(0);
                    Some(
                        Sample::new(w as i32, h as i32, l)
                            .with_spacing(spacing)
                            .with_value(raw, rescale),
                    )
                })
                .collect(),
            None => vec![],
        };
        if dropped > 0 {
            log::warn!("{}: skipped {dropped} pixels with unknown labels", img.key());
        }
        Ok(SampleSet::with_samples(
            img.image_id.clone(),
            img.slice_index,
            spacing,
            samples,
        ))
    }

    /// 将当前标签图导出为 JSON 样本集文档.
    pub fn export_sample_set_json(&self) -> EngineResult<String> {
        let set = self.extract_sample_set()?;
        log::info!("exporting {} samples of {}", set.len(), set.key());
        export_sample_set(&set, &self.taxonomy)
    }

    /// 对当前切片做组织定量. 尚未涂抹的切片视为全背景.
    pub fn analyze(&self) -> EngineResult<TissueMetrics> {
        let img = self.active()?;
        let spacing = self.spacing();
        let metrics = match self.buffers.get(&img.key()) {
            Some(buffer) => self.quantifier.quantify_snapshot(&buffer.snapshot()),
            None => {
                let empty = LabelBuffer::new(img.key(), img.shape(), spacing, self.taxonomy.clone());
                self.quantifier.quantify_snapshot(&empty.snapshot())
            }
        };
        log::info!(
            "{}: analyzed {} labeled of {} pixels",
            img.key(),
            metrics.labeled_pixels(),
            metrics.total_pixels
        );
        Ok(metrics)
    }

    /// 当前切片的 JSON 定量报告.
    pub fn report_json(&self) -> EngineResult<String> {
        let metrics = self.analyze()?;
        let img = self.active()?;
        report_to_json(&img.key(), img.shape(), &metrics)
    }

    /// 擦除当前切片中的某个标签, 返回被擦除的像素个数.
    pub fn erase(&mut self, label: LabelIndex) -> EngineResult<usize> {
        let key = self.active()?.key();
        let n = self.buffers.get_mut(&key).map_or(0, |b| b.erase(label));
        if n > 0 {
            self.host.request_redraw();
        }
        Ok(n)
    }

    /// 将当前切片全部置为背景, 并丢弃该切片尚未结束的笔画.
    pub fn erase_all(&mut self) -> EngineResult<usize> {
        let key = self.active()?.key();
        if self.store.pending().map_or(false, |p| p.key() == key) {
            self.store.take();
        }
        let n = self.buffers.get_mut(&key).map_or(0, LabelBuffer::erase_all);
        self.host.request_redraw();
        Ok(n)
    }

    /// 丢弃当前切片的标签图. 返回之前是否存在.
    pub fn clear_slice(&mut self) -> EngineResult<bool> {
        let key = self.active()?.key();
        let existed = self.buffers.remove(&key).is_some();
        if existed {
            self.host.request_redraw();
        }
        Ok(existed)
    }

    /// 修改当前切片标签图的像素间距.
    pub fn set_pixel_spacing(&mut self, spacing: PixelSpacing) -> EngineResult<()> {
        let img = self.host.active_image().ok_or(EngineError::NoImageLoaded)?;
        ensure_buffer(&mut self.buffers, img, spacing, &self.taxonomy).set_pixel_spacing(spacing);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::cardiac::*;
    use crate::host::{ActiveImage, MemoryHost};
    use crate::Rescale;

    fn session(w: usize, h: usize) -> SegmentationSession<MemoryHost> {
        crate::init_test_logger();
        let mut host = MemoryHost::new();
        let pixels = (0..(w * h) as i32).collect();
        let img = ActiveImage::new("heart", 0, w, h).with_pixels(pixels).unwrap();
        host.load(img, PixelSpacing::new(0.5, 0.5), Rescale::new(2.0, -10.0).unwrap());
        SegmentationSession::new(host, Taxonomy::cardiac(), EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_brush_offsets() {
        assert_eq!(brush_offsets(0).count(), 1);
        assert_eq!(brush_offsets(1).count(), 5);
        assert_eq!(brush_offsets(2).count(), 13);
    }

    #[test]
    fn test_no_image() {
        let mut s =
            SegmentationSession::new(MemoryHost::new(), Taxonomy::cardiac(), EngineConfig::default())
                .unwrap();
        assert!(matches!(s.add_stroke_point(0, 0, INFARCTION), Err(EngineError::NoImageLoaded)));
        assert!(matches!(s.analyze(), Err(EngineError::NoImageLoaded)));
        assert!(matches!(s.extract_sample_set(), Err(EngineError::NoImageLoaded)));
    }

    #[test]
    fn test_capability() {
        let mut s = session(8, 8);
        s.host_mut().set_segmentation_support(false);
        assert!(matches!(
            s.add_stroke_point(1, 1, INFARCTION),
            Err(EngineError::HostCapabilityUnavailable(_))
        ));
    }

    #[test]
    fn test_stroke_to_region() {
        let mut s = session(32, 32);
        s.set_brush_radius(1).unwrap();
        // 两个相邻落点, 共 8 个不同像素.
        assert_eq!(s.add_stroke_point(10, 10, INFARCTION).unwrap(), 5);
        assert_eq!(s.add_stroke_point(11, 10, INFARCTION).unwrap(), 5);
        assert_eq!(s.pending_samples(), 10);
        let report = s.end_stroke().unwrap();
        assert_eq!(report.painted_pixels(), 8);
        assert_eq!(s.pending_samples(), 0);
        let buffer = s.active_buffer().unwrap();
        assert_eq!(buffer[(10, 10)], INFARCTION);
        assert_eq!(buffer[(9, 11)], INFARCTION);
        assert_eq!(buffer[(9, 9)], BACKGROUND);
        assert_eq!(s.host().redraws(), 1);
        // 没有待处理样本时什么也不做.
        assert!(s.end_stroke().unwrap().is_noop());
    }

    #[test]
    fn test_small_stroke_discarded() {
        let mut s = session(32, 32);
        s.add_stroke_point(3, 3, INFARCTION).unwrap();
        assert!(s.end_stroke().unwrap().is_noop());
        assert!(s.active_buffer().map_or(true, |b| b.is_background()));
    }

    #[test]
    fn test_stroke_clipped_and_validated() {
        let mut s = session(8, 8);
        s.set_brush_radius(1).unwrap();
        assert_eq!(s.add_stroke_point(0, 0, INFARCTION).unwrap(), 3);
        assert!(matches!(s.add_stroke_point(1, 1, 0), Err(EngineError::ReservedLabel)));
        assert!(matches!(s.add_stroke_point(1, 1, 42), Err(EngineError::UnknownLabel(42))));
        assert_eq!(s.pending_samples(), 3);
    }

    #[test]
    fn test_slice_switch_mid_stroke() {
        let mut s = session(8, 8);
        s.add_stroke_point(1, 1, INFARCTION).unwrap();
        s.host_mut().set_slice(1);
        assert!(matches!(
            s.add_stroke_point(1, 1, INFARCTION),
            Err(EngineError::InconsistentSlice { expected: 0, found: 1 })
        ));
    }

    #[test]
    fn test_end_stroke_on_its_own_slice() {
        let mut s = session(32, 32);
        s.set_brush_radius(2).unwrap();
        assert_eq!(s.add_stroke_point(10, 10, INFARCTION).unwrap(), 13);
        s.host_mut().set_slice(7);
        assert!(matches!(
            s.end_stroke(),
            Err(EngineError::InconsistentSlice { expected: 0, found: 7 })
        ));
        assert_eq!(s.pending_samples(), 13);
        assert!(s.buffer(&SliceKey::new("heart", 7)).is_none());

        s.host_mut().set_slice(0);
        assert_eq!(s.end_stroke().unwrap().painted_pixels(), 13);
        assert_eq!(s.buffer(&SliceKey::new("heart", 0)).unwrap().count(INFARCTION), 13);
        assert!(s.buffer(&SliceKey::new("heart", 7)).is_none());
    }

    #[test]
    fn test_end_stroke_keeps_samples_on_error() {
        let mut s = session(32, 32);
        s.set_brush_radius(2).unwrap();
        s.add_stroke_point(10, 10, INFARCTION).unwrap();

        s.host_mut().set_segmentation_support(false);
        assert!(matches!(s.end_stroke(), Err(EngineError::HostCapabilityUnavailable(_))));
        assert_eq!(s.pending_samples(), 13);
        s.host_mut().set_segmentation_support(true);

        let img = s.host().active_image().cloned().unwrap();
        s.host_mut().unload();
        assert!(matches!(s.end_stroke(), Err(EngineError::NoImageLoaded)));
        assert_eq!(s.pending_samples(), 13);

        s.host_mut().load(img, PixelSpacing::new(0.5, 0.5), Rescale::identity());
        assert_eq!(s.end_stroke().unwrap().painted_pixels(), 13);
        assert_eq!(s.discard_stroke(), 0);
    }

    #[test]
    fn test_brush_radius_bounds() {
        let mut s = session(32, 32);
        assert!(matches!(s.set_brush_radius(50_000), Err(EngineError::InvalidParameter(_))));
        assert_eq!(s.config().brush_radius, 0);
        s.set_brush_radius(1024).unwrap();
        // 画笔被截断到图像范围内.
        assert_eq!(s.add_stroke_point(10, 10, INFARCTION).unwrap(), 32 * 32);
        assert_eq!(s.add_stroke_point(i32::MAX, i32::MIN, INFARCTION).unwrap(), 0);
        assert_eq!(s.discard_stroke(), 32 * 32);
    }

    #[test]
    fn test_import_json_merges_pending_stroke() {
        let block: Vec<LabelIndex> = (0..256)
            .map(|i| if (i / 16) < 4 && (i % 16) < 4 { NORMAL_MYOCARDIUM } else { 0 })
            .collect();
        let mut src = session(16, 16);
        src.import_mask(block.clone()).unwrap();
        let same_slice = src.export_sample_set_json().unwrap();
        src.host_mut().set_slice(3);
        src.import_mask(block).unwrap();
        let other_slice = src.export_sample_set_json().unwrap();

        let mut dst = session(16, 16);
        dst.set_brush_radius(2).unwrap();
        dst.add_stroke_point(10, 10, INFARCTION).unwrap();
        assert!(matches!(
            dst.import_sample_set_json(&other_slice),
            Err(EngineError::InconsistentSlice { expected: 0, found: 3 })
        ));
        assert_eq!(dst.pending_samples(), 13);
        assert!(dst.active_buffer().is_none());

        let report = dst.import_sample_set_json(&same_slice).unwrap();
        assert_eq!(report.samples, 13 + 16);
        assert_eq!(dst.pending_samples(), 0);
        let buffer = dst.active_buffer().unwrap();
        assert_eq!(buffer.count(INFARCTION), 13);
        assert_eq!(buffer.count(NORMAL_MYOCARDIUM), 16);
    }

    #[test]
    fn test_mask_extract_export() {
        let mut s = session(4, 2);
        let mask = vec![0, 3, 0, 0, 4, 0, 0, 1];
        assert_eq!(s.import_mask(mask).unwrap(), 3);
        let set = s.extract_sample_set().unwrap();
        assert_eq!(set.len(), 3);
        let first = &set.samples()[0];
        assert_eq!((first.x, first.y, first.label), (1, 0, INFARCTION));
        assert_eq!(first.raw_value, 1);
        assert!((first.modality_value - -8.0).abs() < 1e-12);
        assert_eq!(first.normalized, Some((2.0, 0.0)));
        assert_eq!(set.samples()[2].label, BLOOD_POOL);
        assert_eq!(set.segments_found(), vec![BLOOD_POOL, INFARCTION, NO_REFLOW]);

        let json = s.export_sample_set_json().unwrap();
        let back = import_sample_set(&json, &Taxonomy::cardiac()).unwrap();
        assert!(back.same_content(&set));

        assert!(matches!(s.import_mask(vec![9; 8]), Err(EngineError::UnknownLabel(9))));
        assert!(s.import_mask(vec![0; 3]).is_err());
        assert_eq!(s.active_buffer().unwrap().count(INFARCTION), 1);
    }

    #[test]
    fn test_import_json_onto_slice() {
        let mut src = session(16, 16);
        let mask: Vec<LabelIndex> = (0..256)
            .map(|i| if (i / 16) < 4 && (i % 16) < 4 { NORMAL_MYOCARDIUM } else { 0 })
            .collect();
        src.import_mask(mask).unwrap();
        let json = src.export_sample_set_json().unwrap();

        let mut dst = session(16, 16);
        let report = dst.import_sample_set_json(&json).unwrap();
        assert_eq!(report.samples, 16);
        assert_eq!(dst.active_buffer().unwrap().count(NORMAL_MYOCARDIUM), 16);

        let before = dst.active_buffer().unwrap().as_row_major_vec();
        assert!(dst.import_sample_set_json("{\"nope\": 1}").is_err());
        assert_eq!(dst.active_buffer().unwrap().as_row_major_vec(), before);
    }

    #[test]
    fn test_analyze_and_erase() {
        let mut s = session(10, 10);
        let mut mask = vec![0; 100];
        mask[..50].fill(NORMAL_MYOCARDIUM);
        mask[50..60].fill(INFARCTION);
        s.import_mask(mask).unwrap();
        let m = s.analyze().unwrap();
        assert_eq!(m.pixel_count(NORMAL_MYOCARDIUM), 50);
        // 0.5 mm × 0.5 mm.
        assert!((m.area_cm2(INFARCTION) - 0.025).abs() < 1e-12);
        let report: serde_json::Value = serde_json::from_str(&s.report_json().unwrap()).unwrap();
        assert_eq!(report["imageInfo"]["imageId"], "heart");

        assert_eq!(s.erase(INFARCTION).unwrap(), 10);
        assert_eq!(s.erase(INFARCTION).unwrap(), 0);
        assert_eq!(s.erase_all().unwrap(), 50);
        assert!(s.active_buffer().unwrap().is_background());
        assert!(s.clear_slice().unwrap());
        assert!(s.active_buffer().is_none());
        assert_eq!(s.analyze().unwrap().labeled_pixels(), 0);
    }

    #[test]
    fn test_per_slice_buffers() {
        let mut s = session(4, 4);
        s.import_mask(vec![BLOOD_POOL; 16]).unwrap();
        s.host_mut().set_slice(3);
        assert!(s.active_buffer().is_none());
        s.import_mask(vec![NO_REFLOW; 16]).unwrap();
        assert_eq!(s.buffer(&SliceKey::new("heart", 0)).unwrap().count(BLOOD_POOL), 16);
        assert_eq!(s.buffer(&SliceKey::new("heart", 3)).unwrap().count(NO_REFLOW), 16);
    }

    #[test]
    fn test_setters() {
        let mut s = session(4, 4);
        let bad = ReconstructParams {
            footprint_threshold: -1.0,
            ..Default::default()
        };
        assert!(s.set_reconstruct_params(bad).is_err());
        let ok = ReconstructParams {
            min_region_size: 1,
            ..Default::default()
        };
        s.set_reconstruct_params(ok).unwrap();
        assert_eq!(s.config().reconstruct.min_region_size, 1);
        s.set_pixel_spacing(PixelSpacing::uniform(2.0)).unwrap();
        assert!((s.active_buffer().unwrap().spacing().row - 2.0).abs() < 1e-12);
    }
}
