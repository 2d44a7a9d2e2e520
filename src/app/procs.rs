use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::time::Instant;

use ratatui::layout::Rect;

use crate::config::{BoolOpt, ConfigStore, IntOpt, StrOpt};
use crate::dispatch::{Movement, ProcessView};
use crate::error::{Result, VitalsError};

/// Rows taken by the detail box above the list.
pub const DETAIL_ROWS: u16 = 8;
/// Rows a wheel notch moves the selection.
const WHEEL_STEP: i64 = 3;
/// Weight of the newest sample in the smoothed ("lazy") cpu figure.
const LAZY_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, PartialEq)]
pub struct ProcRow {
    pub pid: i32,
    pub ppid: i32,
    pub name: String,
    pub command: String,
    pub threads: i64,
    pub uid: u32,
    pub mem_kb: u64,
    /// Percent of one core over the last interval.
    pub cpu_direct: f64,
    pub cpu_lazy: f64,
    /// Nesting level in tree mode.
    pub depth: usize,
    pub folded: bool,
}

/// The option values that decide which rows are listed and in what order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcQuery {
    pub sorting: String,
    pub reversed: bool,
    pub tree: bool,
    pub filter: String,
}

impl ProcQuery {
    pub fn from_store(store: &dyn ConfigStore) -> Self {
        Self {
            sorting: store.get_str(StrOpt::ProcSorting).to_string(),
            reversed: store.get_bool(BoolOpt::ProcReversed),
            tree: store.get_bool(BoolOpt::ProcTree),
            filter: store.get_str(StrOpt::ProcFilter).to_string(),
        }
    }
}

/// Process list state shared by the input and render threads.
#[derive(Debug, Default)]
pub struct ProcTable {
    sampled: Vec<ProcRow>,
    rows: Vec<ProcRow>,
    /// Outer panel box in terminal (1-based) coordinates.
    area: Rect,
    /// Index of the first listed row.
    start: i64,
    folded: HashSet<i32>,
    pending_expand: Option<i32>,
    pending_collapse: Option<i32>,
}

impl ProcTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_area(&mut self, area: Rect) {
        self.area = area;
    }

    pub fn replace(&mut self, sampled: Vec<ProcRow>) {
        self.sampled = sampled;
    }

    pub fn rows(&self) -> &[ProcRow] {
        &self.rows
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn find(&self, pid: i64) -> Option<&ProcRow> {
        self.sampled.iter().find(|r| i64::from(r.pid) == pid)
    }

    /// Rows that fit below the list header.
    pub fn list_height(&self, detailed: bool) -> i64 {
        let detail = if detailed { DETAIL_ROWS } else { 0 };
        i64::from(self.area.height.saturating_sub(3 + detail))
    }

    /// Applies pending folds, then filters and orders the sampled rows.
    pub fn arrange(&mut self, query: &ProcQuery) {
        match (self.pending_expand.take(), self.pending_collapse.take()) {
            (Some(e), Some(c)) if e == c => {
                if !self.folded.remove(&e) {
                    self.folded.insert(e);
                }
            }
            (expand, collapse) => {
                if let Some(pid) = expand {
                    self.folded.remove(&pid);
                }
                if let Some(pid) = collapse {
                    self.folded.insert(pid);
                }
            }
        }

        let needle = query.filter.to_lowercase();
        let mut rows: Vec<ProcRow> = self
            .sampled
            .iter()
            .filter(|r| needle.is_empty() || matches_filter(r, &needle))
            .cloned()
            .collect();
        rows.sort_by(|a, b| compare(a, b, &query.sorting, query.reversed));

        self.rows = if query.tree {
            tree_order(rows, &self.folded)
        } else {
            rows
        };
    }

    /// Re-validates the selection against the current rows and keeps
    /// `selected_pid` pointing at the selected row.
    pub fn sync_selection(&mut self, store: &mut dyn ConfigStore) -> Result<()> {
        let height = self.list_height(store.get_bool(BoolOpt::ShowDetailed)).max(0);
        let count = self.rows.len() as i64;
        self.start = self.start.clamp(0, (count - height).max(0));

        let visible = height.min(count - self.start);
        let selected = store.get_int(IntOpt::ProcSelected).min(visible.max(0));
        store.set_int(IntOpt::ProcSelected, selected)?;

        store.set_int(IntOpt::SelectedPid, self.pid_at(selected))
    }
}

impl ProcessView for ProcTable {
    fn area(&self) -> Rect {
        self.area
    }

    fn select(&mut self, config: &mut dyn ConfigStore, movement: Movement) -> Result<Option<i64>> {
        let height = self.list_height(config.get_bool(BoolOpt::ShowDetailed));
        let count = self.rows.len() as i64;
        if height <= 0 || count == 0 {
            return Ok(None);
        }

        let current = config.get_int(IntOpt::ProcSelected);
        let old_start = self.start;
        let max_start = (count - height).max(0);
        let abs = if current == 0 { 0 } else { self.start + current };

        let target = match movement {
            Movement::Up => (abs - 1).max(0),
            Movement::Down => (abs + 1).min(count),
            Movement::PageUp if abs == 0 => 0,
            Movement::PageUp => (abs - height).max(1),
            Movement::PageDown => (abs + height).min(count),
            Movement::Home => 1,
            Movement::End => count,
            Movement::ScrollUp if abs == 0 => 0,
            Movement::ScrollUp => (abs - WHEEL_STEP).max(1),
            Movement::ScrollDown => (abs + WHEEL_STEP).min(count),
            Movement::Row(n) => {
                // Scrollbar position maps linearly onto the list.
                let span = (height - 2).max(1) as f64;
                self.start = ((n as f64) * max_start as f64 / span).round() as i64;
                self.start = self.start.clamp(0, max_start);
                if abs == 0 {
                    0
                } else {
                    abs.clamp(self.start + 1, self.start + height.min(count))
                }
            }
        };

        if target > 0 {
            if target <= self.start {
                self.start = target - 1;
            } else if target > self.start + height {
                self.start = target - height;
            }
        }
        self.start = self.start.clamp(0, max_start);

        let selected = if target == 0 { 0 } else { target - self.start };
        if selected == current && self.start == old_start {
            return Ok(None);
        }

        let pid = match target {
            0 => 0,
            t => i64::from(self.rows[(t - 1) as usize].pid),
        };
        config.set_int(IntOpt::ProcSelected, selected)?;
        config.set_int(IntOpt::SelectedPid, pid)?;
        Ok(Some(selected))
    }

    fn pid_at(&self, row: i64) -> i64 {
        if row < 1 {
            return 0;
        }
        self.rows
            .get((self.start + row - 1) as usize)
            .map_or(0, |r| i64::from(r.pid))
    }

    fn expand(&mut self, pid: i64) -> Result<()> {
        self.pending_expand = Some(self.known_pid(pid)?);
        Ok(())
    }

    fn collapse(&mut self, pid: i64) -> Result<()> {
        self.pending_collapse = Some(self.known_pid(pid)?);
        Ok(())
    }
}

impl ProcTable {
    fn known_pid(&self, pid: i64) -> Result<i32> {
        self.find(pid)
            .map(|r| r.pid)
            .ok_or_else(|| VitalsError::Collaborator(format!("no process with pid {pid}")))
    }
}

fn matches_filter(row: &ProcRow, needle: &str) -> bool {
    row.pid.to_string().contains(needle)
        || row.name.to_lowercase().contains(needle)
        || row.command.to_lowercase().contains(needle)
}

/// Numeric keys list the largest first; `reversed` flips every key.
fn compare(a: &ProcRow, b: &ProcRow, key: &str, reversed: bool) -> Ordering {
    let ord = match key {
        "pid" => b.pid.cmp(&a.pid),
        "name" => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        "command" => a.command.cmp(&b.command),
        "threads" => b.threads.cmp(&a.threads),
        "user" => a.uid.cmp(&b.uid),
        "memory" => b.mem_kb.cmp(&a.mem_kb),
        "cpu direct" => b.cpu_direct.total_cmp(&a.cpu_direct),
        _ => b.cpu_lazy.total_cmp(&a.cpu_lazy),
    };
    if reversed {
        ord.reverse()
    } else {
        ord
    }
}

/// Orders already-sorted rows as a depth-first walk of the parent tree.
/// Rows whose parent is not listed become roots; children of folded
/// processes are left out.
fn tree_order(rows: Vec<ProcRow>, folded: &HashSet<i32>) -> Vec<ProcRow> {
    let listed: HashSet<i32> = rows.iter().map(|r| r.pid).collect();
    let mut children: HashMap<i32, Vec<usize>> = HashMap::new();
    let mut roots = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        if row.ppid != row.pid && listed.contains(&row.ppid) {
            children.entry(row.ppid).or_default().push(idx);
        } else {
            roots.push(idx);
        }
    }

    let mut ordered = Vec::with_capacity(rows.len());
    let mut stack: Vec<(usize, usize)> = roots.into_iter().rev().map(|i| (i, 0)).collect();
    while let Some((idx, depth)) = stack.pop() {
        let mut row = rows[idx].clone();
        row.depth = depth;
        row.folded = folded.contains(&row.pid);
        if !row.folded {
            if let Some(kids) = children.get(&row.pid) {
                stack.extend(kids.iter().rev().map(|&k| (k, depth + 1)));
            }
        }
        ordered.push(row);
    }
    ordered
}

/// Reads per-process figures from `/proc`.
pub struct ProcSampler {
    prev_ticks: HashMap<i32, u64>,
    lazy: HashMap<i32, f64>,
    last: Instant,
    ticks_per_second: u64,
    page_size: u64,
}

impl ProcSampler {
    pub fn new() -> Self {
        Self {
            prev_ticks: HashMap::new(),
            lazy: HashMap::new(),
            last: Instant::now(),
            ticks_per_second: procfs::ticks_per_second().max(1),
            page_size: procfs::page_size(),
        }
    }

    pub fn sample(&mut self) -> Vec<ProcRow> {
        let elapsed = self.last.elapsed().as_secs_f64().max(0.1);
        self.last = Instant::now();

        let all = match procfs::process::all_processes() {
            Ok(all) => all,
            Err(e) => {
                tracing::warn!("Failed to list processes: {}", e);
                return Vec::new();
            }
        };

        let mut rows = Vec::new();
        for process in all.flatten() {
            let Ok(stat) = process.stat() else {
                continue;
            };
            let ticks = stat.utime + stat.stime;
            let cpu_direct = self.prev_ticks.get(&stat.pid).map_or(0.0, |&prev| {
                let secs = ticks.saturating_sub(prev) as f64 / self.ticks_per_second as f64;
                secs / elapsed * 100.0
            });
            let cpu_lazy = self
                .lazy
                .get(&stat.pid)
                .map_or(cpu_direct, |&old| old + (cpu_direct - old) * LAZY_WEIGHT);

            rows.push((
                ticks,
                ProcRow {
                    pid: stat.pid,
                    ppid: stat.ppid,
                    command: process.cmdline().map(|c| c.join(" ")).unwrap_or_default(),
                    uid: process.uid().unwrap_or(0),
                    name: stat.comm,
                    threads: stat.num_threads,
                    mem_kb: stat.rss * self.page_size / 1024,
                    cpu_direct,
                    cpu_lazy,
                    depth: 0,
                    folded: false,
                },
            ));
        }

        self.prev_ticks = rows.iter().map(|(t, r)| (r.pid, *t)).collect();
        self.lazy = rows.iter().map(|(_, r)| (r.pid, r.cpu_lazy)).collect();
        rows.into_iter().map(|(_, r)| r).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn row(pid: i32, ppid: i32, name: &str, cpu: f64) -> ProcRow {
        ProcRow {
            pid,
            ppid,
            name: name.to_string(),
            command: format!("/usr/bin/{name}"),
            threads: 1,
            uid: 0,
            mem_kb: pid as u64 * 10,
            cpu_direct: cpu,
            cpu_lazy: cpu,
            depth: 0,
            folded: false,
        }
    }

    fn query(sorting: &str) -> ProcQuery {
        ProcQuery {
            sorting: sorting.to_string(),
            reversed: false,
            tree: false,
            filter: String::new(),
        }
    }

    fn pids(table: &ProcTable) -> Vec<i32> {
        table.rows().iter().map(|r| r.pid).collect()
    }

    /// Ten processes in a 13-line panel: ten listed rows fit exactly.
    fn table(count: i32, height: u16) -> ProcTable {
        let mut table = ProcTable::new();
        table.set_area(Rect::new(1, 1, 60, height));
        table.replace((1..=count).map(|p| row(p, 0, &format!("p{p}"), 0.0)).collect());
        table.arrange(&query("pid"));
        table
    }

    #[rstest]
    #[case("pid", false, vec![3, 2, 1])]
    #[case("pid", true, vec![1, 2, 3])]
    #[case("name", false, vec![2, 3, 1])]
    #[case("cpu lazy", false, vec![3, 1, 2])]
    #[case("memory", false, vec![3, 2, 1])]
    fn test_sorting(#[case] key: &str, #[case] reversed: bool, #[case] expected: Vec<i32>) {
        let mut table = ProcTable::new();
        table.replace(vec![row(1, 0, "zsh", 5.0), row(2, 0, "bash", 1.0), row(3, 0, "init", 9.0)]);
        table.arrange(&ProcQuery {
            reversed,
            ..query(key)
        });
        assert_eq!(pids(&table), expected);
    }

    #[test]
    fn test_filter_matches_name_command_and_pid() {
        let mut table = ProcTable::new();
        table.replace(vec![row(1, 0, "init", 0.0), row(22, 0, "bash", 0.0), row(3, 0, "Xorg", 0.0)]);
        table.arrange(&ProcQuery {
            filter: "xorg".to_string(),
            ..query("pid")
        });
        assert_eq!(pids(&table), vec![3]);

        table.arrange(&ProcQuery {
            filter: "22".to_string(),
            ..query("pid")
        });
        assert_eq!(pids(&table), vec![22]);
    }

    #[test]
    fn test_tree_order_and_folding() {
        let mut table = ProcTable::new();
        table.replace(vec![
            row(1, 0, "init", 0.0),
            row(10, 1, "sshd", 0.0),
            row(11, 10, "bash", 0.0),
            row(20, 1, "cron", 0.0),
        ]);
        let tree = ProcQuery {
            tree: true,
            reversed: true,
            ..query("pid")
        };
        table.arrange(&tree);
        assert_eq!(pids(&table), vec![1, 10, 11, 20]);
        let depths: Vec<usize> = table.rows().iter().map(|r| r.depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 1]);

        table.collapse(10).unwrap();
        table.arrange(&tree);
        assert_eq!(pids(&table), vec![1, 10, 20]);
        assert!(table.rows()[1].folded);

        // Expanding and collapsing the same pid at once toggles it.
        table.expand(10).unwrap();
        table.collapse(10).unwrap();
        table.arrange(&tree);
        assert_eq!(pids(&table), vec![1, 10, 11, 20]);
    }

    #[test]
    fn test_fold_unknown_pid_fails() {
        let mut table = table(3, 10);
        let err = table.expand(999).unwrap_err();
        assert!(matches!(err, VitalsError::Collaborator(_)));
    }

    #[test]
    fn test_select_moves_and_reports_pid() {
        let mut table = table(10, 13);
        let mut options = Options::new();

        assert_eq!(table.select(&mut options, Movement::Down).unwrap(), Some(1));
        assert_eq!(options.get_int(IntOpt::SelectedPid), 10);

        assert_eq!(table.select(&mut options, Movement::End).unwrap(), Some(10));
        assert_eq!(options.get_int(IntOpt::SelectedPid), 1);
        assert_eq!(table.select(&mut options, Movement::Down).unwrap(), None);

        assert_eq!(table.select(&mut options, Movement::Home).unwrap(), Some(1));
        assert_eq!(table.select(&mut options, Movement::Up).unwrap(), Some(0));
        assert_eq!(options.get_int(IntOpt::SelectedPid), 0);
        assert_eq!(table.select(&mut options, Movement::Up).unwrap(), None);
    }

    #[test]
    fn test_select_scrolls_long_lists() {
        // 7 listed rows for 20 processes.
        let mut table = table(20, 10);
        let mut options = Options::new();

        table.select(&mut options, Movement::End).unwrap();
        assert_eq!(table.start(), 13);
        assert_eq!(options.get_int(IntOpt::ProcSelected), 7);

        table.select(&mut options, Movement::PageUp).unwrap();
        assert_eq!(table.start(), 12);
        assert_eq!(options.get_int(IntOpt::ProcSelected), 1);

        let first_visible = i64::from(table.rows()[12].pid);
        assert_eq!(table.pid_at(1), first_visible);
        assert_eq!(table.pid_at(0), 0);
        assert_eq!(table.pid_at(9), 0);

        // Scrollbar jump to the top keeps the selection on screen.
        table.select(&mut options, Movement::Row(0)).unwrap();
        assert_eq!(table.start(), 0);
        assert_eq!(options.get_int(IntOpt::ProcSelected), 7);
    }

    #[test]
    fn test_detail_view_shrinks_list() {
        let table = table(20, 20);
        assert_eq!(table.list_height(false), 17);
        assert_eq!(table.list_height(true), 9);
    }

    #[test]
    fn test_sync_selection_clamps_after_filter() {
        let mut table = table(10, 13);
        let mut options = Options::new();
        options.set_int(IntOpt::ProcSelected, 8).unwrap();

        table.arrange(&ProcQuery {
            filter: "p1".to_string(),
            ..query("pid")
        });
        table.sync_selection(&mut options).unwrap();
        // p10 and p1 remain.
        assert_eq!(options.get_int(IntOpt::ProcSelected), 2);
        assert_eq!(options.get_int(IntOpt::SelectedPid), 1);
    }
}
