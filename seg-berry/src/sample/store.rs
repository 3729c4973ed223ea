use super::{PixelSpacing, Sample, SampleSet};
use crate::taxonomy::Taxonomy;
use crate::{EngineError, EngineResult};
use std::sync::Arc;

/// 样本收集器. 累积同一个切片的样本, 直到被区域重建一次性取走.
///
/// 写入一批样本时先整体校验标签, 任何一个标签不属于分类方案都会使整批被拒绝,
/// 已收集的样本保持不变.
#[derive(Debug)]
pub struct PixelSampleStore {
    taxonomy: Arc<Taxonomy>,
    pending: Option<SampleSet>,
}

impl PixelSampleStore {
    /// 空收集器.
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self {
            taxonomy,
            pending: None,
        }
    }

    /// 所用分类方案.
    #[inline]
    pub fn taxonomy(&self) -> &Arc<Taxonomy> {
        &self.taxonomy
    }

    /// 开始收集新的样本集, 返回被丢弃的旧样本集 (若有).
    pub fn begin(
        &mut self,
        image_id: impl Into<String>,
        slice_index: u32,
        spacing: PixelSpacing,
    ) -> Option<SampleSet> {
        let old = self.pending.replace(SampleSet::new(image_id, slice_index, spacing));
        if let Some(ref old) = old {
            if !old.is_empty() {
                log::debug!(
                    "discarding {} pending samples of `{}`#{}",
                    old.len(),
                    old.image_id,
                    old.slice_index
                );
            }
        }
        old
    }

    /// 正在收集的样本集.
    #[inline]
    pub fn pending(&self) -> Option<&SampleSet> {
        self.pending.as_ref()
    }

    /// 正在收集的样本个数.
    pub fn len(&self) -> usize {
        self.pending.as_ref().map_or(0, SampleSet::len)
    }

    /// 是否没有任何待处理样本?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn validate<'a>(&self, samples: impl IntoIterator<Item = &'a Sample>) -> EngineResult<()> {
        samples
            .into_iter()
            .try_for_each(|s| self.taxonomy.check_paintable(s.label))
    }

    /// 向正在收集的样本集追加一批样本 (例如一次画笔落点), 返回追加的个数.
    pub fn push_batch(&mut self, samples: Vec<Sample>) -> EngineResult<usize> {
        self.validate(&samples)?;
        let pending = self.pending.as_mut().ok_or(EngineError::NoOpenSampleSet)?;
        let n = samples.len();
        pending.extend(samples);
        Ok(n)
    }

    /// 导入一个完整的样本集.
    ///
    /// 若已有同一切片的待处理样本, 新样本追加在其后; 若待处理样本属于另一个切片,
    /// 返回 [`EngineError::InconsistentSlice`]; 两者像素间距不同时无法共用一次重映射,
    /// 返回 [`EngineError::InvalidParameter`]. 没有待处理样本时直接采用导入的样本集.
    pub fn import(&mut self, set: SampleSet) -> EngineResult<()> {
        self.validate(set.samples())?;
        match self.pending.as_mut() {
            Some(p) if !p.is_empty() => {
                if p.slice_index != set.slice_index || p.image_id != set.image_id {
                    return Err(EngineError::InconsistentSlice {
                        expected: p.slice_index,
                        found: set.slice_index,
                    });
                }
                if p.source_spacing != set.source_spacing {
                    return Err(EngineError::InvalidParameter(format!(
                        "cannot merge samples captured at {:?} into a set captured at {:?}",
                        set.source_spacing, p.source_spacing
                    )));
                }
                p.extend(set.into_samples());
            }
            _ => self.pending = Some(set),
        }
        Ok(())
    }

    /// 取走待处理样本集. 每个样本集只会被取走一次.
    #[inline]
    pub fn take(&mut self) -> Option<SampleSet> {
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> PixelSampleStore {
        PixelSampleStore::new(Taxonomy::cardiac())
    }

    #[test]
    fn test_push_requires_begin() {
        let mut s = store();
        assert!(matches!(
            s.push_batch(vec![Sample::new(0, 0, 1)]),
            Err(EngineError::NoOpenSampleSet)
        ));
        s.begin("img", 0, PixelSpacing::default());
        assert_eq!(s.push_batch(vec![Sample::new(0, 0, 1), Sample::new(1, 0, 1)]).unwrap(), 2);
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_batch_is_atomic() {
        let mut s = store();
        s.begin("img", 0, PixelSpacing::default());
        s.push_batch(vec![Sample::new(0, 0, 2)]).unwrap();
        let bad = vec![Sample::new(1, 1, 2), Sample::new(2, 2, 9)];
        assert!(matches!(s.push_batch(bad), Err(EngineError::UnknownLabel(9))));
        let zero = vec![Sample::new(1, 1, 0)];
        assert!(matches!(s.push_batch(zero), Err(EngineError::ReservedLabel)));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_import_slice_consistency() {
        let mut s = store();
        let a = SampleSet::with_samples("img", 3, PixelSpacing::default(), vec![Sample::new(0, 0, 1)]);
        s.import(a.clone()).unwrap();
        s.import(a).unwrap();
        assert_eq!(s.len(), 2);

        let b = SampleSet::with_samples("img", 4, PixelSpacing::default(), vec![Sample::new(0, 0, 1)]);
        assert!(matches!(
            s.import(b),
            Err(EngineError::InconsistentSlice { expected: 3, found: 4 })
        ));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_import_spacing_mismatch() {
        let mut s = store();
        let fine = SampleSet::with_samples("img", 0, PixelSpacing::default(), vec![Sample::new(0, 0, 1)]);
        s.import(fine).unwrap();
        let block = (10..14)
            .flat_map(|y| (10..14).map(move |x| Sample::new(x, y, 3)))
            .collect();
        let coarse = SampleSet::with_samples("img", 0, PixelSpacing::uniform(2.0), block);
        assert!(matches!(s.import(coarse), Err(EngineError::InvalidParameter(_))));
        let pending = s.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending.source_spacing, PixelSpacing::default());

        // 没有待处理样本时直接采用导入的样本集, 保留其像素间距.
        s.take();
        let coarse = SampleSet::with_samples("img", 0, PixelSpacing::uniform(2.0), vec![Sample::new(1, 1, 3)]);
        s.import(coarse).unwrap();
        assert_eq!(s.pending().unwrap().source_spacing, PixelSpacing::uniform(2.0));
    }

    #[test]
    fn test_take_once() {
        let mut s = store();
        s.begin("img", 0, PixelSpacing::default());
        s.push_batch(vec![Sample::new(5, 5, 4)]).unwrap();
        let set = s.take().unwrap();
        assert_eq!(set.len(), 1);
        assert!(s.take().is_none());
        assert!(s.is_empty());
    }
}
