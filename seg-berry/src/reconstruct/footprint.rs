//! 膨胀结构元与候选掩膜.

use crate::{EngineError, EngineResult, Idx2d};
use ndarray::Array2;

/// 近圆形结构元. 偏移量 `(dy, dx)` 属于结构元当且仅当
/// `(dx² + dy²) / r² <= threshold`. 半径为 0 时只含中心.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Footprint {
    offsets: Vec<(isize, isize)>,
}

impl Footprint {
    /// 构造. `threshold` 必须是有限的非负数.
    pub fn new(radius: u32, threshold: f64) -> EngineResult<Self> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(EngineError::InvalidParameter(format!(
                "footprint threshold must be finite and non-negative, got {threshold}"
            )));
        }
        if radius == 0 {
            return Ok(Self {
                offsets: vec![(0, 0)],
            });
        }
        let r = radius as isize;
        let r2 = f64::from(radius).powi(2);
        let offsets = (-r..=r)
            .flat_map(|dy| (-r..=r).map(move |dx| (dy, dx)))
            .filter(|&(dy, dx)| ((dx * dx + dy * dy) as f64) / r2 <= threshold)
            .collect();
        Ok(Self { offsets })
    }

    /// 全部偏移量 `(dy, dx)`, 行优先.
    #[inline]
    pub fn offsets(&self) -> &[(isize, isize)] {
        &self.offsets
    }

    /// 结构元的大小.
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// 结构元是否为空? 合法的结构元至少含有中心.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// 将结构元平移到 `pos`, 返回落在 `shape` 内的像素.
    pub fn place(&self, (h, w): Idx2d, (height, width): Idx2d) -> impl Iterator<Item = Idx2d> + '_ {
        self.offsets.iter().filter_map(move |&(dy, dx)| {
            let nh = h.checked_add_signed(dy)?;
            let nw = w.checked_add_signed(dx)?;
            (nh < height && nw < width).then_some((nh, nw))
        })
    }

    /// 以该结构元膨胀点集 `points`, 得到形状为 `shape` 的候选掩膜.
    pub fn candidate_mask(&self, points: &[Idx2d], shape: Idx2d) -> Array2<bool> {
        let mut mask = Array2::from_elem(shape, false);
        for &p in points {
            for q in self.place(p, shape) {
                mask[q] = true;
            }
        }
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_footprint_is_center_only() {
        // 半径 1 时, 4-邻居的比值为 1.0 > 0.75.
        let f = Footprint::new(1, 0.75).unwrap();
        assert_eq!(f.offsets(), &[(0, 0)]);
    }

    #[test]
    fn test_larger_footprints() {
        let f = Footprint::new(1, 1.0).unwrap();
        assert_eq!(f.len(), 5);
        let f = Footprint::new(1, 2.0).unwrap();
        assert_eq!(f.len(), 9);
        // r = 2: |d|² <= 3, 即中心, 4-邻居与对角邻居.
        let f = Footprint::new(2, 0.75).unwrap();
        assert_eq!(f.len(), 9);
        assert_eq!(Footprint::new(0, 0.75).unwrap().len(), 1);
        assert!(Footprint::new(1, f64::NAN).is_err());
        assert!(Footprint::new(1, -0.1).is_err());
    }

    #[test]
    fn test_candidate_mask_clips() {
        let f = Footprint::new(1, 1.0).unwrap();
        let mask = f.candidate_mask(&[(0, 0)], (3, 3));
        assert_eq!(mask.iter().filter(|&&m| m).count(), 3);
        assert!(mask[(0, 1)] && mask[(1, 0)] && mask[(0, 0)]);
    }
}
