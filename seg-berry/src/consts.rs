//! 通用常量.

use crate::LabelIndex;

/// 心脏组织分类方案中的标签值.
pub mod cardiac {
    use crate::LabelIndex;

    /// 血池 (左心室腔) 的像素值.
    pub const BLOOD_POOL: LabelIndex = 1;

    /// 正常心肌的像素值.
    pub const NORMAL_MYOCARDIUM: LabelIndex = 2;

    /// 梗死心肌的像素值.
    pub const INFARCTION: LabelIndex = 3;

    /// 梗死区内无复流区的像素值.
    pub const NO_REFLOW: LabelIndex = 4;
}

/// 通用 5 色画笔调色板中的标签值.
pub mod brush {
    use crate::LabelIndex;

    /// 红.
    pub const RED: LabelIndex = 1;

    /// 绿.
    pub const GREEN: LabelIndex = 2;

    /// 蓝.
    pub const BLUE: LabelIndex = 3;

    /// 黄.
    pub const YELLOW: LabelIndex = 4;

    /// 紫.
    pub const PURPLE: LabelIndex = 5;
}

/// 背景标签. 任何涂抹操作都不会写入该值.
pub const BACKGROUND: LabelIndex = 0;

/// 默认膨胀结构元半径 (像素).
pub const DEFAULT_DILATION_RADIUS: u32 = 1;

/// 默认结构元阈值. 满足 `(dx² + dy²) / r² <= 0.75` 的偏移量属于结构元.
pub const DEFAULT_FOOTPRINT_THRESHOLD: f64 = 0.75;

/// 默认最小保留区域 (像素个数). 小于该值的连通分量被视为噪声.
pub const DEFAULT_MIN_REGION_SIZE: usize = 8;

/// 画笔半径的上限 (像素).
pub const MAX_BRUSH_RADIUS: u32 = 1024;

/// 像素间距缺失时采用的默认值 (mm/像素).
pub const DEFAULT_SPACING_MM: f64 = 1.0;

/// 分类方案中未声明的标签所使用的颜色 (浅灰).
pub const DEFAULT_GRAY: [u8; 4] = [200, 200, 200, 255];

/// 背景颜色 (全透明).
pub const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// 未知标签的显示名.
pub const UNKNOWN_NAME: &str = "Unknown";

/// 每平方厘米对应的平方毫米数.
pub const MM2_PER_CM2: f64 = 100.0;
