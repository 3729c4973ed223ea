//! 实验结果.

use crate::profile::Profile;
use seg_berry::ReconstructParams;
use std::io::{self, Write};

/// 将 `p` 的结果写进 `w` 中.
fn describe_into<W: Write>(params: &ReconstructParams, p: &Profile, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    #[inline]
    fn f64_to_display(f: Option<f64>) -> String {
        match f {
            Some(f) => format!("{f:.6}"),
            None => "/".to_string(),
        }
    }

    let (kept, discarded) = p.components();
    writeln!(
        w,
        "Profile `radius={} threshold={} min_region={}`:",
        params.radius, params.footprint_threshold, params.min_region_size
    )?;
    writeln!(w, "{S4}Sample sets: {} ({} unchanged, {} failed)", p.sets(), p.noop(), p.failed())?;
    writeln!(w, "{S4}Samples: {} ({} out of bounds)", p.samples(), p.out_of_bounds())?;
    writeln!(w, "{S4}Painted pixels: {}", p.painted())?;
    writeln!(w, "{S4}Components kept/discarded: {kept}/{discarded}")?;
    writeln!(w, "{S4}Reconstruction total time: {} us", p.reconstruct_time_us())?;
    writeln!(
        w,
        "{S4}Reconstruction average time: {} us",
        f64_to_display(p.avg_reconstruct_time_us())
    )?;
    writeln!(w, "{S4}Total machine time: {} us", p.real_time_us())?;
    let t = p.most_time_consuming().map(|d| d.as_micros() as f64);
    write!(w, "{S4}Most time-consuming set costs {} us", f64_to_display(t))?;
    Ok(())
}

/// 消融实验最终结果.
pub struct AblationResult {
    data: Vec<(ReconstructParams, Profile)>,
}

impl FromIterator<(ReconstructParams, Profile)> for AblationResult {
    fn from_iter<I: IntoIterator<Item = (ReconstructParams, Profile)>>(it: I) -> Self {
        Self {
            data: it.into_iter().collect(),
        }
    }
}

impl AblationResult {
    /// 输出运行结果.
    pub fn analyze(&self) -> io::Result<()> {
        let mut out = io::stdout().lock();
        utils::sep_to(&mut out)?;
        for (params, profile) in self.data.iter() {
            describe_into(params, profile, &mut out)?;
            writeln!(out)?;
            utils::sep_to(&mut out)?;
        }
        Ok(())
    }
}
