//! 引擎配置.
//!
//! 默认值即 [`crate::consts`] 中的常量. 可以从 JSON 读取, 也可以通过环境变量覆盖:
//!
//! - `SEG_BERRY_DILATION_RADIUS`
//! - `SEG_BERRY_FOOTPRINT_THRESHOLD`
//! - `SEG_BERRY_MIN_REGION_SIZE`
//! - `SEG_BERRY_DEFAULT_SPACING_MM`

use crate::consts::{DEFAULT_SPACING_MM, MAX_BRUSH_RADIUS};
use crate::reconstruct::ReconstructParams;
use crate::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// 引擎配置.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// 区域重建参数.
    pub reconstruct: ReconstructParams,

    /// 像素间距缺失时采用的默认值 (mm/像素).
    pub default_spacing_mm: f64,

    /// 画笔半径 (像素). 0 表示单像素画笔, 不得超过 [`MAX_BRUSH_RADIUS`].
    pub brush_radius: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reconstruct: ReconstructParams::default(),
            default_spacing_mm: DEFAULT_SPACING_MM,
            brush_radius: 0,
        }
    }
}

/// 读取环境变量 `key`. 未设置时返回 `None`; 无法解析时记录警告并返回 `None`.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("ignoring unparsable ${key}=`{raw}`");
            None
        }
    }
}

/// 检查画笔半径是否不超过 [`MAX_BRUSH_RADIUS`].
pub(crate) fn check_brush_radius(radius: u32) -> EngineResult<()> {
    if radius > MAX_BRUSH_RADIUS {
        return Err(EngineError::InvalidParameter(format!(
            "brush radius {radius} exceeds {MAX_BRUSH_RADIUS}"
        )));
    }
    Ok(())
}

impl EngineConfig {
    /// 检查配置是否合法.
    pub fn validate(&self) -> EngineResult<()> {
        self.reconstruct.validate()?;
        if !self.default_spacing_mm.is_finite() || self.default_spacing_mm <= 0.0 {
            return Err(EngineError::InvalidParameter(format!(
                "default spacing must be positive, got {}",
                self.default_spacing_mm
            )));
        }
        check_brush_radius(self.brush_radius)
    }

    /// 从 JSON 读取. 缺失的字段取默认值.
    pub fn from_json_str(s: &str) -> EngineResult<Self> {
        let cfg: Self =
            serde_json::from_str(s).map_err(|e| EngineError::InvalidParameter(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// 以环境变量覆盖自身.
    pub fn apply_env(mut self) -> Self {
        if let Some(v) = env_parse("SEG_BERRY_DILATION_RADIUS") {
            self.reconstruct.radius = v;
        }
        if let Some(v) = env_parse("SEG_BERRY_FOOTPRINT_THRESHOLD") {
            self.reconstruct.footprint_threshold = v;
        }
        if let Some(v) = env_parse("SEG_BERRY_MIN_REGION_SIZE") {
            self.reconstruct.min_region_size = v;
        }
        if let Some(v) = env_parse("SEG_BERRY_DEFAULT_SPACING_MM") {
            self.default_spacing_mm = v;
        }
        self
    }

    /// 默认配置, 并以环境变量覆盖. 覆盖后的配置非法时退回默认配置.
    pub fn from_env_or_default() -> Self {
        let cfg = Self::default().apply_env();
        match cfg.validate() {
            Ok(()) => cfg,
            Err(e) => {
                log::warn!("environment configuration rejected ({e}), using defaults");
                Self::default()
            }
        }
    }
}
