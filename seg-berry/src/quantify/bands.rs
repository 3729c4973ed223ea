//! 临床分级. 阈值均为严格大于, 恰好落在边界上的值属于较低一级.

use serde::{Deserialize, Serialize};

/// 梗死面积占总心肌面积百分比的分级.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InfarctSeverity {
    /// 无梗死.
    None,
    /// `(0, 5]`.
    Minimal,
    /// `(5, 15]`.
    Small,
    /// `(15, 30]`.
    Moderate,
    /// `(30, 50]`.
    Large,
    /// `> 50`.
    Massive,
}

impl InfarctSeverity {
    /// 由梗死/心肌百分比分级.
    pub fn classify(infarct_to_myocardium: f64) -> Self {
        match infarct_to_myocardium {
            p if p > 50.0 => Self::Massive,
            p if p > 30.0 => Self::Large,
            p if p > 15.0 => Self::Moderate,
            p if p > 5.0 => Self::Small,
            p if p > 0.0 => Self::Minimal,
            _ => Self::None,
        }
    }

    /// 描述.
    pub fn description(self) -> &'static str {
        match self {
            Self::Massive => "Massive infarct (>50% of total myocardium) - Extensive cardiac damage",
            Self::Large => "Large infarct (30-50% of total myocardium) - Significant cardiac damage",
            Self::Moderate => "Moderate infarct (15-30% of total myocardium) - Moderate cardiac damage",
            Self::Small => "Small infarct (5-15% of total myocardium) - Minor cardiac damage",
            Self::Minimal => "Minimal infarct (<5% of total myocardium) - Very small damage",
            Self::None => "No infarction detected",
        }
    }
}

/// 无复流面积占总心肌面积百分比的分级.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NoReflowGrade {
    /// 没有无复流像素.
    None,
    /// `<= 2`.
    Small,
    /// `(2, 5]`.
    Moderate,
    /// `(5, 10]`.
    Significant,
    /// `> 10`.
    Extensive,
}

impl NoReflowGrade {
    /// 由无复流/心肌百分比分级. 只要存在无复流像素, 分级至少为 `Small`.
    pub fn classify(no_reflow_pixels: usize, no_reflow_to_myocardium: f64) -> Self {
        if no_reflow_pixels == 0 {
            return Self::None;
        }
        match no_reflow_to_myocardium {
            p if p > 10.0 => Self::Extensive,
            p if p > 5.0 => Self::Significant,
            p if p > 2.0 => Self::Moderate,
            _ => Self::Small,
        }
    }

    /// 描述.
    pub fn description(self) -> &'static str {
        match self {
            Self::Extensive => {
                "Extensive no-reflow zones (>10% of total myocardium) - Severe reperfusion failure"
            }
            Self::Significant => {
                "Significant no-reflow zones (5-10% of total myocardium) - Poor reperfusion"
            }
            Self::Moderate => {
                "Moderate no-reflow zones (2-5% of total myocardium) - Partial reperfusion issues"
            }
            Self::Small => "Small no-reflow zones (<2% of total myocardium) - Minimal reperfusion issues",
            Self::None => "No no-reflow zones detected - Good reperfusion",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infarct_bands() {
        assert_eq!(InfarctSeverity::classify(0.0), InfarctSeverity::None);
        assert_eq!(InfarctSeverity::classify(0.01), InfarctSeverity::Minimal);
        assert_eq!(InfarctSeverity::classify(5.0), InfarctSeverity::Minimal);
        assert_eq!(InfarctSeverity::classify(5.0001), InfarctSeverity::Small);
        assert_eq!(InfarctSeverity::classify(15.0), InfarctSeverity::Small);
        assert_eq!(InfarctSeverity::classify(30.0), InfarctSeverity::Moderate);
        assert_eq!(InfarctSeverity::classify(50.0), InfarctSeverity::Large);
        assert_eq!(InfarctSeverity::classify(50.1), InfarctSeverity::Massive);
        assert_eq!(InfarctSeverity::classify(f64::NAN), InfarctSeverity::None);
        assert!(InfarctSeverity::Large.description().starts_with("Large infarct"));
    }

    #[test]
    fn test_no_reflow_bands() {
        assert_eq!(NoReflowGrade::classify(0, 0.0), NoReflowGrade::None);
        assert_eq!(NoReflowGrade::classify(1, 0.0), NoReflowGrade::Small);
        assert_eq!(NoReflowGrade::classify(1, 2.0), NoReflowGrade::Small);
        assert_eq!(NoReflowGrade::classify(1, 2.5), NoReflowGrade::Moderate);
        assert_eq!(NoReflowGrade::classify(1, 10.0), NoReflowGrade::Significant);
        assert_eq!(NoReflowGrade::classify(1, 10.5), NoReflowGrade::Extensive);
        assert!(NoReflowGrade::None.description().contains("Good reperfusion"));
    }
}
