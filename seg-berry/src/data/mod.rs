pub mod labelmap;
mod rescale;

pub use labelmap::{
    CompactLabelmap, ImgWriteRaw, ImgWriteVis, LabelBuffer, LabelMirror, LabelSnapshot, SliceKey,
};

pub use rescale::Rescale;

use crate::{Area2d, Areas2d, Idx2d};
use std::collections::VecDeque;

/// 获得 `(h, w)` 的 4-邻域像素索引. 不检查越界, 但使用 wrapping 运算避免溢出.
#[inline]
pub(crate) fn neighbour4((h, w): Idx2d) -> [Idx2d; 4] {
    [
        (h.wrapping_sub(1), w),
        (h.wrapping_add(1), w),
        (h, w.wrapping_sub(1)),
        (h, w.wrapping_add(1)),
    ]
}

/// 按照 4-相邻规则获取形状为 `shape` 的图像中的所有区域.
///
/// 两个像素 `p1` 和 `p2` 属于同一个区域, 当且仅当存在一条从 `p1` 到 `p2` 的 4-相邻路径,
/// 且路径上的所有像素 (包括 `p1` 和 `p2`) 都满足谓词 `pred`.
/// 区域按照其行优先意义下的第一个像素排序, 区域内部按 BFS 顺序排列.
pub(crate) fn areas4(shape: Idx2d, pred: impl Fn(Idx2d) -> bool) -> Areas2d {
    let (height, width) = shape;
    let mut ans = Areas2d::new();
    let mut visited = vec![false; height * width];
    let mut bfs_q = VecDeque::with_capacity(4);

    for h in 0..height {
        for w in 0..width {
            if visited[h * width + w] || !pred((h, w)) {
                continue;
            }
            visited[h * width + w] = true;
            bfs_q.push_back((h, w));
            let mut this_area = Area2d::with_capacity(1);
            while let Some(cur) = bfs_q.pop_front() {
                this_area.push(cur);
                for next @ (nh, nw) in neighbour4(cur) {
                    if nh < height && nw < width && !visited[nh * width + nw] && pred(next) {
                        visited[nh * width + nw] = true;
                        bfs_q.push_back(next);
                    }
                }
            }
            ans.push(this_area);
        }
    }
    ans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_areas4_disjoint() {
        // 1 1 0 1
        // 0 1 0 1
        // 1 0 0 0
        let img = [[1, 1, 0, 1], [0, 1, 0, 1], [1, 0, 0, 0]];
        let areas = areas4((3, 4), |(h, w)| img[h][w] == 1);
        assert_eq!(areas.len(), 3);
        assert_eq!(areas[0].len(), 3);
        assert_eq!(areas[0][0], (0, 0));
        assert_eq!(areas[1], vec![(0, 3), (1, 3)]);
        assert_eq!(areas[2], vec![(2, 0)]);
    }

    #[test]
    fn test_areas4_diagonal_is_separate() {
        let img = [[1, 0], [0, 1]];
        let areas = areas4((2, 2), |(h, w)| img[h][w] == 1);
        assert_eq!(areas.len(), 2);
        assert!(areas4((0, 0), |_| true).is_empty());
    }
}
