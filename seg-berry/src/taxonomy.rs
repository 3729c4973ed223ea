//! 标签分类方案 (taxonomy): 标签值到名称、显示颜色与含义的映射.
//!
//! 内置两张固定的表: 通用 5 色画笔调色板与心脏组织方案. 一个 [`Taxonomy`]
//! 一旦构造就不可变, 通常以 `Arc` 的形式在会话与各个标签图之间共享.

use crate::consts::{self, cardiac};
use crate::{EngineError, EngineResult, LabelIndex};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// RGBA 颜色.
///
/// 序列化为 `"#RRGGBB"` 或 `"#RRGGBBAA"` 形式的字符串.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    /// 全透明.
    pub const TRANSPARENT: Self = Self(consts::TRANSPARENT);

    /// 未声明标签所用的浅灰色.
    pub const DEFAULT_GRAY: Self = Self(consts::DEFAULT_GRAY);

    /// 不透明颜色.
    #[inline]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    /// 解析 `#RRGGBB` 或 `#RRGGBBAA` (不区分大小写, `#` 可省略).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            6 => Some(Self([byte(0)?, byte(2)?, byte(4)?, 255])),
            8 => Some(Self([byte(0)?, byte(2)?, byte(4)?, byte(6)?])),
            _ => None,
        }
    }

    /// 不透明时写作 `#RRGGBB`, 否则写作 `#RRGGBBAA`.
    pub fn to_hex(self) -> String {
        let [r, g, b, a] = self.0;
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }

    /// 是否完全透明?
    #[inline]
    pub const fn is_transparent(self) -> bool {
        self.0[3] == 0
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<Rgba> for String {
    fn from(value: Rgba) -> Self {
        value.to_hex()
    }
}

impl TryFrom<String> for Rgba {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value).ok_or_else(|| format!("invalid color `{value}`"))
    }
}

/// 一个标签的定义.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelDefinition {
    /// 标签值, 永远不为 0.
    pub index: LabelIndex,

    /// 显示名.
    pub name: String,

    /// 显示颜色.
    pub display_color: Rgba,

    /// 临床含义.
    #[serde(default)]
    pub description: String,
}

impl LabelDefinition {
    /// 构造.
    pub fn new(index: LabelIndex, name: &str, display_color: Rgba, description: &str) -> Self {
        Self {
            index,
            name: name.to_owned(),
            display_color,
            description: description.to_owned(),
        }
    }
}

/// 分类方案的种类.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaKind {
    /// 通用画笔调色板.
    BrushPalette,

    /// 心脏组织方案.
    Cardiac,

    /// 用户自定义.
    Custom,
}

/// 心脏组织四个角色各自对应的标签值.
///
/// 让心脏相关指标能够推广到自定义的、标签值排布不同的方案上.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CardiacRoles {
    /// 血池.
    pub blood_pool: LabelIndex,
    /// 正常心肌.
    pub normal_myocardium: LabelIndex,
    /// 梗死.
    pub infarction: LabelIndex,
    /// 无复流.
    pub no_reflow: LabelIndex,
}

impl Default for CardiacRoles {
    fn default() -> Self {
        Self {
            blood_pool: cardiac::BLOOD_POOL,
            normal_myocardium: cardiac::NORMAL_MYOCARDIUM,
            infarction: cardiac::INFARCTION,
            no_reflow: cardiac::NO_REFLOW,
        }
    }
}

/// 心脏组织方案中四个角色的显示名.
const CARDIAC_NAMES: [&str; 4] = ["Blood Pool", "Normal Myocardium", "Infarction", "No-Reflow"];

static BRUSH_PALETTE: Lazy<Arc<Taxonomy>> = Lazy::new(|| {
    use consts::brush::*;

    Arc::new(Taxonomy {
        kind: SchemaKind::BrushPalette,
        entries: vec![
            LabelDefinition::new(RED, "Red", Rgba::opaque(0xFF, 0x00, 0x00), ""),
            LabelDefinition::new(GREEN, "Green", Rgba::opaque(0x00, 0xFF, 0x00), ""),
            LabelDefinition::new(BLUE, "Blue", Rgba::opaque(0x00, 0x00, 0xFF), ""),
            LabelDefinition::new(YELLOW, "Yellow", Rgba::opaque(0xFF, 0xFF, 0x00), ""),
            LabelDefinition::new(PURPLE, "Purple", Rgba::opaque(0x80, 0x00, 0x80), ""),
        ],
    })
});

static CARDIAC: Lazy<Arc<Taxonomy>> = Lazy::new(|| {
    use consts::cardiac::*;

    Arc::new(Taxonomy {
        kind: SchemaKind::Cardiac,
        entries: vec![
            LabelDefinition::new(
                BLOOD_POOL,
                CARDIAC_NAMES[0],
                Rgba::opaque(0xFF, 0x00, 0x00),
                "Left ventricular cavity",
            ),
            LabelDefinition::new(
                NORMAL_MYOCARDIUM,
                CARDIAC_NAMES[1],
                Rgba::opaque(0x00, 0xFF, 0x00),
                "Healthy heart muscle",
            ),
            LabelDefinition::new(
                INFARCTION,
                CARDIAC_NAMES[2],
                Rgba::opaque(0x00, 0x66, 0xFF),
                "Infarcted/damaged myocardium",
            ),
            LabelDefinition::new(
                NO_REFLOW,
                CARDIAC_NAMES[3],
                Rgba::opaque(0xFF, 0xA5, 0x00),
                "No-reflow zones within infarction",
            ),
        ],
    })
});

/// 不可变的标签分类方案. 条目按标签值升序排列, 标签值互不相同且都不为 0.
///
/// 反序列化同样经过 [`Taxonomy::new`] 的检查.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTaxonomy")]
pub struct Taxonomy {
    kind: SchemaKind,
    entries: Vec<LabelDefinition>,
}

#[derive(Deserialize)]
struct RawTaxonomy {
    kind: SchemaKind,
    entries: Vec<LabelDefinition>,
}

impl TryFrom<RawTaxonomy> for Taxonomy {
    type Error = EngineError;

    fn try_from(raw: RawTaxonomy) -> EngineResult<Self> {
        Self::new(raw.kind, raw.entries)
    }
}

impl Taxonomy {
    /// 自定义方案.
    ///
    /// 条目会按标签值排序; 出现标签值 0 或者重复标签值时返回错误.
    pub fn new(kind: SchemaKind, mut entries: Vec<LabelDefinition>) -> EngineResult<Self> {
        entries.sort_by_key(|e| e.index);
        if entries.first().is_some_and(|e| e.index == consts::BACKGROUND) {
            return Err(EngineError::ReservedLabel);
        }
        if let Some(w) = entries.windows(2).find(|w| w[0].index == w[1].index) {
            return Err(EngineError::InvalidParameter(format!(
                "duplicate label index {}",
                w[0].index
            )));
        }
        Ok(Self { kind, entries })
    }

    /// 通用 5 色画笔调色板 (Red, Green, Blue, Yellow, Purple).
    pub fn brush_palette() -> Arc<Self> {
        Arc::clone(&BRUSH_PALETTE)
    }

    /// 心脏组织方案 (Blood Pool, Normal Myocardium, Infarction, No-Reflow).
    pub fn cardiac() -> Arc<Self> {
        Arc::clone(&CARDIAC)
    }

    /// 方案种类.
    #[inline]
    pub fn kind(&self) -> SchemaKind {
        self.kind
    }

    /// 全部条目, 按标签值升序.
    #[inline]
    pub fn entries(&self) -> &[LabelDefinition] {
        &self.entries
    }

    /// 条目个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否没有任何条目?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按标签值查找.
    pub fn get(&self, index: LabelIndex) -> Option<&LabelDefinition> {
        self.entries
            .binary_search_by_key(&index, |e| e.index)
            .ok()
            .map(|i| &self.entries[i])
    }

    /// 按显示名查找 (不区分大小写).
    pub fn by_name(&self, name: &str) -> Option<&LabelDefinition> {
        self.entries
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name.trim()))
    }

    /// 标签值是否属于该方案?
    #[inline]
    pub fn contains(&self, index: LabelIndex) -> bool {
        self.get(index).is_some()
    }

    /// 检查标签值能否被写入标签图.
    pub fn check_paintable(&self, index: LabelIndex) -> EngineResult<()> {
        if index == consts::BACKGROUND {
            Err(EngineError::ReservedLabel)
        } else if !self.contains(index) {
            Err(EngineError::UnknownLabel(index))
        } else {
            Ok(())
        }
    }

    /// 最大的标签值. 空方案返回 0.
    pub fn max_index(&self) -> LabelIndex {
        self.entries.last().map_or(consts::BACKGROUND, |e| e.index)
    }

    /// 标签值对应的显示颜色. 背景为全透明, 未声明的标签为浅灰.
    pub fn color_for(&self, index: LabelIndex) -> Rgba {
        if index == consts::BACKGROUND {
            return Rgba::TRANSPARENT;
        }
        self.get(index).map_or(Rgba::DEFAULT_GRAY, |e| e.display_color)
    }

    /// 标签值对应的显示名. 未声明的标签为 `"Unknown"`.
    pub fn name_for(&self, index: LabelIndex) -> &str {
        self.get(index).map_or(consts::UNKNOWN_NAME, |e| e.name.as_str())
    }

    /// 颜色查找表, 下标即标签值, 覆盖 `0..=max_index`.
    pub fn lut(&self) -> Vec<Rgba> {
        (0..=self.max_index()).map(|i| self.color_for(i)).collect()
    }

    /// 心脏组织四个角色对应的标签值.
    ///
    /// 心脏方案直接返回固定值; 其他方案按显示名查找, 四者缺一则返回 `None`.
    pub fn cardiac_roles(&self) -> Option<CardiacRoles> {
        if self.kind == SchemaKind::Cardiac {
            return Some(CardiacRoles::default());
        }
        let [b, n, i, r] = CARDIAC_NAMES.map(|name| self.by_name(name).map(|e| e.index));
        Some(CardiacRoles {
            blood_pool: b?,
            normal_myocardium: n?,
            infarction: i?,
            no_reflow: r?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_tables() {
        let brush = Taxonomy::brush_palette();
        assert_eq!(brush.len(), 5);
        assert_eq!(brush.max_index(), 5);
        assert_eq!(brush.color_for(5).to_hex(), "#800080");
        assert_eq!(brush.name_for(4), "Yellow");
        assert_eq!(brush.by_name("blue").map(|e| e.index), Some(3));

        let heart = Taxonomy::cardiac();
        assert_eq!(heart.kind(), SchemaKind::Cardiac);
        assert_eq!(heart.color_for(cardiac::INFARCTION).to_hex(), "#0066FF");
        assert_eq!(heart.color_for(cardiac::NO_REFLOW).to_hex(), "#FFA500");
        assert_eq!(
            heart.get(cardiac::BLOOD_POOL).map(|e| e.description.as_str()),
            Some("Left ventricular cavity")
        );
        assert!(Arc::ptr_eq(&heart, &Taxonomy::cardiac()));
    }

    #[test]
    fn test_color_for_fallbacks() {
        let heart = Taxonomy::cardiac();
        assert_eq!(heart.color_for(0), Rgba::TRANSPARENT);
        assert_eq!(heart.color_for(9), Rgba([200, 200, 200, 255]));
        assert_eq!(heart.name_for(9), "Unknown");

        let lut = heart.lut();
        assert_eq!(lut.len(), 5);
        assert!(lut[0].is_transparent());
        assert_eq!(lut[2], Rgba::opaque(0, 255, 0));
    }

    #[test]
    fn test_check_paintable() {
        let heart = Taxonomy::cardiac();
        assert!(heart.check_paintable(3).is_ok());
        assert!(matches!(heart.check_paintable(0), Err(EngineError::ReservedLabel)));
        assert!(matches!(heart.check_paintable(7), Err(EngineError::UnknownLabel(7))));
    }

    #[test]
    fn test_custom_taxonomy() {
        let red = Rgba::opaque(255, 0, 0);
        let t = Taxonomy::new(
            SchemaKind::Custom,
            vec![
                LabelDefinition::new(20, "No-Reflow", red, ""),
                LabelDefinition::new(7, "Blood Pool", red, ""),
                LabelDefinition::new(9, "Infarction", red, ""),
                LabelDefinition::new(8, "Normal Myocardium", red, ""),
            ],
        )
        .unwrap();
        assert_eq!(t.entries().iter().map(|e| e.index).collect::<Vec<_>>(), [7, 8, 9, 20]);
        let roles = t.cardiac_roles().unwrap();
        assert_eq!(roles.blood_pool, 7);
        assert_eq!(roles.no_reflow, 20);
        assert!(Taxonomy::brush_palette().cardiac_roles().is_none());

        let dup = vec![
            LabelDefinition::new(1, "A", red, ""),
            LabelDefinition::new(1, "B", red, ""),
        ];
        assert!(Taxonomy::new(SchemaKind::Custom, dup).is_err());
        let zero = vec![LabelDefinition::new(0, "A", red, "")];
        assert!(matches!(
            Taxonomy::new(SchemaKind::Custom, zero),
            Err(EngineError::ReservedLabel)
        ));
    }

    #[test]
    fn test_deserialize_checks_entries() {
        let heart = Taxonomy::cardiac();
        let mut v = serde_json::to_value(&*heart).unwrap();
        v["entries"].as_array_mut().unwrap().reverse();
        let back: Taxonomy = serde_json::from_value(v.clone()).unwrap();
        assert!(back.contains(cardiac::NO_REFLOW));
        assert!(back.contains(cardiac::BLOOD_POOL));
        assert_eq!(back, *heart);

        let first = v["entries"][0].clone();
        v["entries"].as_array_mut().unwrap().push(first);
        assert!(serde_json::from_value::<Taxonomy>(v).is_err());
    }

    #[test]
    fn test_rgba_hex() {
        assert_eq!(Rgba::from_hex("#0066ff"), Some(Rgba::opaque(0, 0x66, 0xFF)));
        assert_eq!(Rgba::from_hex("00000000"), Some(Rgba::TRANSPARENT));
        assert_eq!(Rgba::from_hex("#12345"), None);
        assert_eq!(Rgba::from_hex("#zz0000"), None);
        assert_eq!(Rgba([1, 2, 3, 4]).to_hex(), "#01020304");
        let json = serde_json::to_string(&Rgba::opaque(255, 165, 0)).unwrap();
        assert_eq!(json, "\"#FFA500\"");
    }
}
