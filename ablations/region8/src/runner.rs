//! 程序运行函数.

use crate::profile::Profile;
use crate::result::AblationResult;
use seg_berry::{
    EngineConfig, LabelBuffer, PixelSpacing, ReconstructParams, RegionReconstructor, SliceKey, Taxonomy,
};
use std::thread;
use utils::loader::{self, Case};

/// 参与比较的结构元阈值.
const THRESHOLDS: [f64; 3] = [0.75, 1.0, 2.0];

/// 参与比较的最小区域.
const MIN_REGIONS: [usize; 3] = [4, 8, 16];

/// 以 `params` 重建全部用例.
fn profile(params: ReconstructParams, cases: &[Case], default_spacing_mm: f64) -> Profile {
    let mut profile = Profile::new();
    let reconstructor = match RegionReconstructor::new(params) {
        Ok(r) => r.with_default_spacing(default_spacing_mm),
        Err(e) => {
            log::error!("invalid parameters {params:?}: {e}");
            return profile.finish();
        }
    };
    let taxonomy = Taxonomy::cardiac();
    for case in cases {
        let mut buffer = LabelBuffer::new(
            SliceKey::new(case.name.clone(), case.set.slice_index),
            case.shape,
            PixelSpacing::uniform(default_spacing_mm),
            taxonomy.clone(),
        );
        profile.start();
        match reconstructor.reconstruct(case.set.clone(), &mut buffer) {
            Ok(report) => profile.record(&report),
            Err(e) => {
                log::warn!("{}: {e}", case.name);
                profile.record_failure();
            }
        }
    }
    profile.finish()
}

/// 实际运行.
pub fn run() -> AblationResult {
    let config = EngineConfig::from_env_or_default();
    let cases = loader::cases_from_env_or_synthetic();
    log::info!("{} cases, {} cpus", cases.len(), utils::cpus());

    let grid: Vec<ReconstructParams> = THRESHOLDS
        .iter()
        .flat_map(|&footprint_threshold| {
            MIN_REGIONS.iter().map(move |&min_region_size| ReconstructParams {
                footprint_threshold,
                min_region_size,
                ..config.reconstruct
            })
        })
        .collect();

    println!("Running ablation studies...");
    let cases = cases.as_slice();
    let spacing = config.default_spacing_mm;
    thread::scope(|s| {
        let handles: Vec<_> = grid
            .iter()
            .map(|&params| s.spawn(move || (params, profile(params, cases, spacing))))
            .collect();
        handles
            .into_iter()
            .filter_map(|th| match th.join() {
                Ok(r) => Some(r),
                Err(_) => {
                    log::error!("ablation thread panicked");
                    None
                }
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_larger_min_region_paints_less() {
        let cases = loader::synthetic_cases(4, 7);
        let loose = profile(
            ReconstructParams {
                min_region_size: 1,
                ..Default::default()
            },
            &cases,
            1.0,
        );
        let strict = profile(ReconstructParams::default(), &cases, 1.0);
        assert_eq!(loose.sets(), 4);
        assert_eq!(loose.failed(), 0);
        assert!(loose.painted() >= strict.painted());
        assert!(loose.components().1 <= strict.components().1);
    }
}
