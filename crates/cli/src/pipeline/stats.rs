//! Station run statistics.

use std::time::Duration;

use ingestion::MetricsSnapshot;
use observability::FusionMetricsAggregator;

use super::orchestrator::StopReason;

/// Statistics from a station run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total duration of the run
    pub duration: Duration,

    /// What ended the run
    pub stop_reason: StopReason,

    /// Final inertial ingestion counters
    pub ingestion: MetricsSnapshot,

    /// Frame loop statistics
    pub fusion: FusionMetricsAggregator,
}

impl PipelineStats {
    /// Frames that produced a published state
    pub fn frames_published(&self) -> u64 {
        self.fusion.published
    }

    /// Published frames per second
    pub fn fps(&self) -> f64 {
        rate(self.frames_published(), self.duration)
    }

    /// Inertial samples per second
    pub fn imu_rate(&self) -> f64 {
        rate(self.ingestion.samples_ingested, self.duration)
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Station Statistics                      ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Stopped by: {}", self.stop_reason);
        println!("   ├─ Frames published: {}", self.frames_published());
        println!("   └─ FPS: {:.2}", self.fps());

        let imu = &self.ingestion;
        println!("\n📈 Inertial Ingestion");
        println!("   ├─ Samples ingested: {}", imu.samples_ingested);
        println!("   ├─ Rate: {:.1} Hz", self.imu_rate());
        println!("   ├─ Malformed records: {}", imu.records_malformed);
        println!("   ├─ Transport errors: {}", imu.transport_errors);
        println!("   └─ Out-of-order samples: {}", imu.out_of_order);

        println!("\n{}", self.fusion.summary());
    }
}

fn rate(count: u64, duration: Duration) -> f64 {
    let secs = duration.as_secs_f64();
    if secs > 0.0 {
        count as f64 / secs
    } else {
        0.0
    }
}
