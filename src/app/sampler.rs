use std::time::Instant;

use procfs::{Current, CurrentSI};

/// Whole-system figures for the cpu, mem and net panels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemStats {
    /// Busy share of all cores over the last interval, 0..=100.
    pub cpu_percent: f64,
    pub cores: usize,
    pub mem_total: u64,
    pub mem_available: u64,
    pub swap_total: u64,
    pub swap_free: u64,
    /// Bytes per second, loopback excluded.
    pub net_rx: f64,
    pub net_tx: f64,
    /// Bytes per second over all block devices.
    pub disk_read: f64,
    pub disk_write: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Totals {
    cpu_busy: u64,
    cpu_all: u64,
    net_rx: u64,
    net_tx: u64,
    disk_read: u64,
    disk_write: u64,
}

pub struct SystemSampler {
    prev: Option<(Instant, Totals)>,
    stats: SystemStats,
}

impl SystemSampler {
    pub fn new() -> Self {
        Self {
            prev: None,
            stats: SystemStats::default(),
        }
    }

    pub fn stats(&self) -> &SystemStats {
        &self.stats
    }

    pub fn sample(&mut self) {
        let now = Instant::now();
        let mut totals = Totals::default();

        match procfs::KernelStats::current() {
            Ok(kernel) => {
                let t = &kernel.total;
                let idle = t.idle + t.iowait.unwrap_or(0);
                let busy = t.user
                    + t.nice
                    + t.system
                    + t.irq.unwrap_or(0)
                    + t.softirq.unwrap_or(0)
                    + t.steal.unwrap_or(0);
                totals.cpu_busy = busy;
                totals.cpu_all = busy + idle;
                self.stats.cores = kernel.cpu_time.len();
            }
            Err(e) => tracing::warn!("Failed to read /proc/stat: {}", e),
        }

        match procfs::Meminfo::current() {
            Ok(mem) => {
                self.stats.mem_total = mem.mem_total;
                self.stats.mem_available = mem.mem_available.unwrap_or(mem.mem_free);
                self.stats.swap_total = mem.swap_total;
                self.stats.swap_free = mem.swap_free;
            }
            Err(e) => tracing::warn!("Failed to read /proc/meminfo: {}", e),
        }

        match procfs::net::dev_status() {
            Ok(devices) => {
                for dev in devices.values().filter(|d| d.name != "lo") {
                    totals.net_rx += dev.recv_bytes;
                    totals.net_tx += dev.sent_bytes;
                }
            }
            Err(e) => tracing::warn!("Failed to read /proc/net/dev: {}", e),
        }

        match procfs::diskstats() {
            Ok(disks) => {
                for disk in disks {
                    totals.disk_read += disk.sectors_read as u64 * SECTOR_BYTES;
                    totals.disk_write += disk.sectors_written as u64 * SECTOR_BYTES;
                }
            }
            Err(e) => tracing::warn!("Failed to read /proc/diskstats: {}", e),
        }

        if let Some((then, prev)) = self.prev {
            let secs = now.duration_since(then).as_secs_f64();
            self.stats.cpu_percent = share(prev.cpu_busy, totals.cpu_busy, prev.cpu_all, totals.cpu_all);
            self.stats.net_rx = rate(prev.net_rx, totals.net_rx, secs);
            self.stats.net_tx = rate(prev.net_tx, totals.net_tx, secs);
            self.stats.disk_read = rate(prev.disk_read, totals.disk_read, secs);
            self.stats.disk_write = rate(prev.disk_write, totals.disk_write, secs);
        }
        self.prev = Some((now, totals));
    }
}

const SECTOR_BYTES: u64 = 512;

fn rate(prev: u64, now: u64, secs: f64) -> f64 {
    if secs <= 0.0 {
        return 0.0;
    }
    now.saturating_sub(prev) as f64 / secs
}

fn share(prev_busy: u64, busy: u64, prev_all: u64, all: u64) -> f64 {
    let all = all.saturating_sub(prev_all);
    if all == 0 {
        return 0.0;
    }
    (busy.saturating_sub(prev_busy) as f64 / all as f64 * 100.0).clamp(0.0, 100.0)
}

/// Human readable byte count, base 1024.
pub fn format_bytes(bytes: f64) -> String {
    const UNITS: [&str; 5] = ["B", "K", "M", "G", "T"];
    let mut value = bytes;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{}{}", value as u64, UNITS[0])
    } else {
        format!("{:.1}{}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_sample_reads_kernel_and_memory() {
        let mut sampler = SystemSampler::new();
        sampler.sample();
        sampler.sample();
        let stats = sampler.stats();
        assert!(stats.cores > 0);
        assert!(stats.mem_total > 0);
        assert!((0.0..=100.0).contains(&stats.cpu_percent));
    }

    #[test]
    fn test_rate_handles_counter_reset() {
        assert_eq!(rate(100, 300, 2.0), 100.0);
        assert_eq!(rate(300, 100, 2.0), 0.0);
        assert_eq!(rate(0, 100, 0.0), 0.0);
    }

    #[test]
    fn test_share() {
        assert_eq!(share(0, 50, 0, 200), 25.0);
        assert_eq!(share(10, 10, 100, 100), 0.0);
    }

    #[rstest]
    #[case(512.0, "512B")]
    #[case(2048.0, "2.0K")]
    #[case(1_572_864.0, "1.5M")]
    fn test_format_bytes(#[case] bytes: f64, #[case] expected: &str) {
        assert_eq!(format_bytes(bytes), expected);
    }
}
