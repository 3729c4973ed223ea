//! 区域重建参数的消融实验.
//!
//! 在一组结构元阈值与最小区域的组合上重建同一批样本集, 比较写入像素、
//! 剔除的连通分量与耗时. 样本集取自 `$REGION8_SAMPLES_DIR`, 未设置时使用合成数据.

mod profile;
mod result;
mod runner;

fn main() {
    if let Err(e) = simple_logger::init_with_level(log::Level::Info) {
        eprintln!("logger: {e}");
    }
    let result = runner::run();
    if let Err(e) = result.analyze() {
        log::error!("cannot write the result: {e}");
    }
}
