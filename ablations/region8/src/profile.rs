//! 算法运行统计.

use seg_berry::ReconstructReport;
use std::time::{Duration, Instant};

/// ablation/benchmark 计时器.
///
/// 该计时器支持 "中途中断" 与 "结束中断, 继续开始计时".
#[derive(Clone, Debug)]
struct AccTimer {
    consumed: Duration,
    since: Instant,
}

impl AccTimer {
    /// 初始化计时器. 初始化时即视为已经开始计时.
    #[inline]
    fn new() -> Self {
        Self {
            consumed: Duration::ZERO,
            since: Instant::now(),
        }
    }

    #[inline]
    fn start(&mut self) {
        self.since = Instant::now();
    }

    /// 结束计时, 并将这一区间的时间累加. 返回本轮计时时长.
    #[inline]
    fn elapsed(&mut self) -> Duration {
        let d = self.since.elapsed();
        self.consumed += d;
        d
    }

    #[inline]
    fn total_us(&self) -> u64 {
        self.consumed.as_micros() as u64
    }
}

/// 一组重建参数在全部样本集上的统计.
#[derive(Clone, Debug)]
pub struct Profile {
    /// 标签图保持不变的样本集个数.
    noop: u64,

    /// 至少写入了一个像素的样本集个数.
    painted_sets: u64,

    /// 重建失败的样本集个数.
    failed: u64,

    /// 重建计时.
    reconstruct_time: AccTimer,

    /// 整个任务计时.
    real_time: AccTimer,

    /// 最耗时的一次重建.
    most: Option<Duration>,

    samples: u64,
    painted: u64,
    kept_components: u64,
    discarded_components: u64,
    out_of_bounds: u64,
}

impl Profile {
    /// 初始化.
    pub fn new() -> Self {
        Self {
            noop: 0,
            painted_sets: 0,
            failed: 0,
            reconstruct_time: AccTimer::new(),
            real_time: AccTimer::new(),
            most: None,
            samples: 0,
            painted: 0,
            kept_components: 0,
            discarded_components: 0,
            out_of_bounds: 0,
        }
    }

    /// 开始一次重建计时.
    #[inline]
    pub fn start(&mut self) {
        self.reconstruct_time.start();
    }

    /// 结束一次重建计时, 并记录其结果.
    pub fn record(&mut self, report: &ReconstructReport) {
        let d = self.reconstruct_time.elapsed();
        self.most = Some(self.most.map_or(d, |m| m.max(d)));
        if report.is_noop() {
            self.noop += 1;
        } else {
            self.painted_sets += 1;
        }
        self.samples += report.samples as u64;
        self.painted += report.painted_pixels() as u64;
        self.kept_components += report.kept_components() as u64;
        self.discarded_components += report.discarded_components() as u64;
        self.out_of_bounds += report.out_of_bounds as u64;
    }

    /// 结束一次失败的重建计时.
    pub fn record_failure(&mut self) {
        self.reconstruct_time.elapsed();
        self.failed += 1;
    }

    /// 结束全部计时.
    #[inline]
    pub fn finish(mut self) -> Self {
        self.real_time.elapsed();
        self
    }

    /// 样本集总数.
    #[inline]
    pub fn sets(&self) -> u64 {
        self.noop + self.painted_sets + self.failed
    }

    /// 标签图保持不变的样本集个数.
    #[inline]
    pub fn noop(&self) -> u64 {
        self.noop
    }

    /// 重建失败的样本集个数.
    #[inline]
    pub fn failed(&self) -> u64 {
        self.failed
    }

    /// 样本总数.
    #[inline]
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// 写入的像素总数.
    #[inline]
    pub fn painted(&self) -> u64 {
        self.painted
    }

    /// `(保留, 剔除)` 的连通分量总数.
    #[inline]
    pub fn components(&self) -> (u64, u64) {
        (self.kept_components, self.discarded_components)
    }

    /// 越界样本总数.
    #[inline]
    pub fn out_of_bounds(&self) -> u64 {
        self.out_of_bounds
    }

    /// 以微秒为单位的重建总时间.
    #[inline]
    pub fn reconstruct_time_us(&self) -> u64 {
        self.reconstruct_time.total_us()
    }

    /// 以微秒为单位的任务总时间.
    #[inline]
    pub fn real_time_us(&self) -> u64 {
        self.real_time.total_us()
    }

    /// 以微秒为单位的平均重建时间. 没有样本集时返回 `None`.
    pub fn avg_reconstruct_time_us(&self) -> Option<f64> {
        match self.sets() {
            0 => None,
            n => Some(self.reconstruct_time_us() as f64 / n as f64),
        }
    }

    /// 最耗时的一次重建. 没有样本集时返回 `None`.
    #[inline]
    pub fn most_time_consuming(&self) -> Option<Duration> {
        self.most
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_profile() {
        let p = Profile::new().finish();
        assert_eq!(p.sets(), 0);
        assert!(p.avg_reconstruct_time_us().is_none());
        assert!(p.most_time_consuming().is_none());
    }

    #[test]
    fn test_record() {
        let mut p = Profile::new();
        p.start();
        p.record(&ReconstructReport::default());
        p.start();
        p.record_failure();
        assert_eq!(p.sets(), 2);
        assert_eq!(p.noop(), 1);
        assert_eq!(p.failed(), 1);
        assert!(p.most_time_consuming().is_some());
    }
}
