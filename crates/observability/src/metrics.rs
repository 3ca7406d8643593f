//! 采集循环指标收集模块
//!
//! 为惯性采集循环、帧循环与查询接口记录 Prometheus 指标，
//! 并提供内存中的运行统计 (用于关闭时的摘要)。

use metrics::{counter, gauge, histogram};

/// 帧循环单次迭代结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStatus {
    /// 完整状态已发布
    Published,
    /// 相机无帧，跳过
    Skipped,
    /// 推理或编码失败，保留上一状态
    Failed,
}

impl CycleStatus {
    /// 指标标签值
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Published => "published",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// 记录一条成功入队的惯性样本
pub fn record_imu_sample_ingested() {
    counter!("imu_samples_ingested_total").increment(1);
}

/// 记录一条被丢弃的格式错误记录
pub fn record_imu_record_malformed() {
    counter!("imu_records_malformed_total").increment(1);
}

/// 记录一次传输读取错误
pub fn record_imu_transport_error(source: &str) {
    counter!("imu_transport_errors_total", "source" => source.to_string()).increment(1);
}

/// 记录一次时间戳倒退 (到达顺序与时间顺序不一致)
pub fn record_imu_out_of_order() {
    counter!("imu_out_of_order_total").increment(1);
}

/// 记录环形缓冲区深度
pub fn record_imu_buffer_depth(depth: usize) {
    gauge!("imu_buffer_depth").set(depth as f64);
}

/// 记录一次帧循环迭代
pub fn record_frame_cycle(status: CycleStatus, cycle_seconds: f64) {
    counter!("frame_cycles_total", "status" => status.as_str()).increment(1);
    histogram!("frame_cycle_seconds").record(cycle_seconds);
}

/// 记录深度推理耗时
pub fn record_frame_inference(seconds: f64) {
    histogram!("frame_inference_seconds").record(seconds);
}

/// 记录新发布的同步包
pub fn record_bundle(sample_count: usize, history_depth: usize) {
    histogram!("bundle_sample_count").record(sample_count as f64);
    gauge!("bundle_history_depth").set(history_depth as f64);
}

/// 记录查询请求
pub fn record_query_request(route: &'static str, status: u16) {
    counter!(
        "query_requests_total",
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
}

/// 帧循环指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct FusionMetricsAggregator {
    /// 已发布周期数
    pub published: u64,

    /// 跳过周期数 (无帧)
    pub skipped: u64,

    /// 失败周期数
    pub failed: u64,

    /// 窗口内无惯性样本的发布次数
    pub empty_bundles: u64,

    /// 每个同步包的样本数统计
    pub bundle_stats: RunningStats,

    /// 推理耗时统计 (毫秒)
    pub inference_stats: RunningStats,

    /// 周期耗时统计 (毫秒)
    pub cycle_stats: RunningStats,
}

impl FusionMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次成功发布
    pub fn record_published(&mut self, sample_count: usize, inference_s: f64, cycle_s: f64) {
        self.published += 1;
        if sample_count == 0 {
            self.empty_bundles += 1;
        }
        self.bundle_stats.push(sample_count as f64);
        self.inference_stats.push(inference_s * 1000.0);
        self.cycle_stats.push(cycle_s * 1000.0);
    }

    /// 记录一次跳过
    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    /// 记录一次失败
    pub fn record_failed(&mut self) {
        self.failed += 1;
    }

    /// 总周期数
    pub fn total_cycles(&self) -> u64 {
        self.published + self.skipped + self.failed
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        let total = self.total_cycles();
        let rate = |n: u64| {
            if total > 0 {
                n as f64 / total as f64 * 100.0
            } else {
                0.0
            }
        };

        MetricsSummary {
            total_cycles: total,
            published: self.published,
            skipped: self.skipped,
            failed: self.failed,
            empty_bundles: self.empty_bundles,
            publish_rate: rate(self.published),
            failure_rate: rate(self.failed),
            bundle_samples: StatsSummary::from(&self.bundle_stats),
            inference_ms: StatsSummary::from(&self.inference_stats),
            cycle_ms: StatsSummary::from(&self.cycle_stats),
        }
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_cycles: u64,
    pub published: u64,
    pub skipped: u64,
    pub failed: u64,
    pub empty_bundles: u64,
    pub publish_rate: f64,
    pub failure_rate: f64,
    pub bundle_samples: StatsSummary,
    pub inference_ms: StatsSummary,
    pub cycle_ms: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Fusion Metrics Summary ===")?;
        writeln!(f, "Frame cycles: {}", self.total_cycles)?;
        writeln!(
            f,
            "Published: {} ({:.2}%)",
            self.published, self.publish_rate
        )?;
        writeln!(f, "Skipped (no frame): {}", self.skipped)?;
        writeln!(f, "Failed: {} ({:.2}%)", self.failed, self.failure_rate)?;
        writeln!(f, "Empty bundles: {}", self.empty_bundles)?;
        writeln!(f, "Samples per bundle: {}", self.bundle_samples)?;
        writeln!(f, "Inference (ms): {}", self.inference_ms)?;
        writeln!(f, "Cycle (ms): {}", self.cycle_ms)?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_counts_outcomes() {
        let mut aggregator = FusionMetricsAggregator::new();
        aggregator.record_published(12, 0.020, 0.033);
        aggregator.record_published(0, 0.018, 0.031);
        aggregator.record_skipped();
        aggregator.record_failed();

        assert_eq!(aggregator.total_cycles(), 4);
        assert_eq!(aggregator.published, 2);
        assert_eq!(aggregator.empty_bundles, 1);

        let summary = aggregator.summary();
        assert!((summary.publish_rate - 50.0).abs() < 1e-10);
        assert!((summary.failure_rate - 25.0).abs() < 1e-10);
        assert!((summary.bundle_samples.mean - 6.0).abs() < 1e-10);
        assert!((summary.inference_ms.max - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_display() {
        let summary = MetricsSummary {
            total_cycles: 100,
            published: 95,
            skipped: 3,
            failed: 2,
            empty_bundles: 0,
            publish_rate: 95.0,
            failure_rate: 2.0,
            bundle_samples: StatsSummary {
                count: 95,
                min: 180.0,
                max: 210.0,
                mean: 200.0,
                std_dev: 4.0,
            },
            inference_ms: StatsSummary::default(),
            cycle_ms: StatsSummary::default(),
        };

        let output = format!("{}", summary);
        assert!(output.contains("Frame cycles: 100"));
        assert!(output.contains("95.00%"));
        assert!(output.contains("Inference (ms): N/A"));
    }

    #[test]
    fn test_cycle_status_labels() {
        assert_eq!(CycleStatus::Published.as_str(), "published");
        assert_eq!(CycleStatus::Skipped.as_str(), "skipped");
        assert_eq!(CycleStatus::Failed.as_str(), "failed");
    }
}
