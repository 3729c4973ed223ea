//! 对 `seg_berry::export` 的更一层封装. 提供实验用的样本集加载器.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use seg_berry::consts::cardiac::{BLOOD_POOL, INFARCTION, NORMAL_MYOCARDIUM, NO_REFLOW};
use seg_berry::export::read_sample_set;
use seg_berry::{EngineResult, Idx2d, PixelSpacing, Sample, SampleSet, Taxonomy};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// 合成图像的边长.
pub const SYNTHETIC_SIDE: usize = 128;

/// 一个实验用例: 样本集与目标图像的形状.
pub struct Case {
    /// 名称 (文件名或合成编号).
    pub name: String,

    /// 目标图像形状 `(高, 宽)`.
    pub shape: Idx2d,

    /// 待重建的样本集.
    pub set: SampleSet,
}

/// 获取样本集目录.
///
/// 若环境变量 `$REGION8_SAMPLES_DIR` 非空, 则返回其值, 否则返回 `None`.
pub fn samples_dir_from_env() -> Option<PathBuf> {
    env::var("REGION8_SAMPLES_DIR")
        .ok()
        .filter(|d| !d.is_empty())
        .map(PathBuf::from)
}

/// 读取 `dir` 下所有 `.json` 样本集文档, 按文件名排序.
///
/// 目标图像形状取样本坐标的包围盒, 至少为 [`SYNTHETIC_SIDE`].
pub fn sample_set_loader<P: AsRef<Path>>(dir: P) -> EngineResult<Vec<(String, EngineResult<Case>)>> {
    let taxonomy = Taxonomy::cardiac();
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().map_or(false, |ext| ext == "json"))
        .collect();
    paths.sort();

    Ok(paths
        .into_iter()
        .map(|p| {
            let name = p.file_stem().map_or_else(String::new, |s| s.to_string_lossy().into_owned());
            let case = read_sample_set(&p, &taxonomy).map(|set| {
                let shape = set.samples().iter().fold((SYNTHETIC_SIDE, SYNTHETIC_SIDE), |(h, w), s| {
                    (h.max(s.y.max(0) as usize + 1), w.max(s.x.max(0) as usize + 1))
                });
                Case {
                    name: name.clone(),
                    shape,
                    set,
                }
            });
            (name, case)
        })
        .collect())
}

/// 生成 `n` 个确定性的合成样本集.
///
/// 每个样本集包含四种组织的若干实心圆盘, 以及一定比例的孤立噪声点.
pub fn synthetic_cases(n: usize, seed: u64) -> Vec<Case> {
    let mut rng = StdRng::seed_from_u64(seed);
    let side = SYNTHETIC_SIDE as i32;
    let labels = [BLOOD_POOL, NORMAL_MYOCARDIUM, INFARCTION, NO_REFLOW];

    (0..n)
        .map(|i| {
            let mut samples = vec![];
            for &label in labels.iter() {
                for _ in 0..rng.random_range(1..4) {
                    let r: i32 = rng.random_range(1..8);
                    let (cx, cy) = (rng.random_range(r..side - r), rng.random_range(r..side - r));
                    for dy in -r..=r {
                        for dx in -r..=r {
                            if dx * dx + dy * dy <= r * r {
                                samples.push(Sample::new(cx + dx, cy + dy, label));
                            }
                        }
                    }
                }
                for _ in 0..rng.random_range(0..32) {
                    samples.push(Sample::new(
                        rng.random_range(0..side),
                        rng.random_range(0..side),
                        label,
                    ));
                }
            }
            Case {
                name: format!("synthetic-{i:03}"),
                shape: (SYNTHETIC_SIDE, SYNTHETIC_SIDE),
                set: SampleSet::with_samples(format!("synthetic-{i:03}"), 0, PixelSpacing::default(), samples),
            }
        })
        .collect()
}

/// 从 `$REGION8_SAMPLES_DIR` 加载样本集, 未设置时使用 64 个合成样本集.
/// 无法读取的文档被跳过.
pub fn cases_from_env_or_synthetic() -> Vec<Case> {
    let Some(dir) = samples_dir_from_env() else {
        return synthetic_cases(64, 0x5EED);
    };
    match sample_set_loader(&dir) {
        Ok(cases) => cases
            .into_iter()
            .filter_map(|(name, case)| match case {
                Ok(c) => Some(c),
                Err(e) => {
                    log::warn!("skipping `{name}`: {e}");
                    None
                }
            })
            .collect(),
        Err(e) => {
            log::warn!("cannot read {}: {e}, falling back to synthetic cases", dir.display());
            synthetic_cases(64, 0x5EED)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_deterministic() {
        let a = synthetic_cases(3, 1);
        let b = synthetic_cases(3, 1);
        assert_eq!(a.len(), 3);
        for (x, y) in a.iter().zip(b.iter()) {
            assert!(x.set.same_content(&y.set));
            assert!(!x.set.is_empty());
            assert!(x.set.samples().iter().all(|s| (0..128).contains(&s.x) && (0..128).contains(&s.y)));
        }
    }
}
