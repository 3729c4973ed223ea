//! 标签图镜像. 用于在一次破坏性操作 (如区域重建) 之前保存并在随后撤销.

use crate::LabelIndex;

/// 一个拥有所有权的标签图的不透明镜像, 按行优先存储.
///
/// 注意该结构是被设计来 **快速** 回填原数据的,
/// 因此并不压缩原数据. 需要长期保留时使用 [`super::CompactLabelmap`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelMirror(pub(crate) Vec<LabelIndex>);

impl LabelMirror {
    /// 镜像的像素个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 镜像是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
