use serde::{Deserialize, Serialize};

/// 模态线性变换: `模态值 = 原始值 × slope + intercept`.
///
/// 对 CT 而言模态值即 HU. 该变换是只读的. 若要修改参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rescale {
    slope: f64,
    intercept: f64,
}

impl Default for Rescale {
    fn default() -> Self {
        Self::identity()
    }
}

impl Rescale {
    /// 构建变换.
    ///
    /// `slope` 与 `intercept` 必须是有限值, 且 `slope` 不能为 0, 否则返回 `None`.
    pub fn new(slope: f64, intercept: f64) -> Option<Rescale> {
        if slope.is_finite() && slope != 0.0 && intercept.is_finite() {
            Some(Self { slope, intercept })
        } else {
            None
        }
    }

    /// 恒等变换, slope 为 1, intercept 为 0.
    #[inline]
    pub const fn identity() -> Rescale {
        Self {
            slope: 1.0,
            intercept: 0.0,
        }
    }

    /// 由宿主提供的可选参数构建. 缺失或非法的参数分别退化为 1 和 0.
    pub fn from_parts(slope: Option<f64>, intercept: Option<f64>) -> Rescale {
        let slope = slope.filter(|s| s.is_finite() && *s != 0.0).unwrap_or(1.0);
        let intercept = intercept.filter(|i| i.is_finite()).unwrap_or(0.0);
        Self { slope, intercept }
    }

    /// 斜率.
    #[inline]
    pub fn slope(&self) -> f64 {
        self.slope
    }

    /// 截距.
    #[inline]
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// 求原始像素值 `raw` 对应的模态值.
    #[inline]
    pub fn eval(&self, raw: i32) -> f64 {
        raw as f64 * self.slope + self.intercept
    }
}
