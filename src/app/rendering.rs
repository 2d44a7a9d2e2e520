// Render thread - owns the terminal, samples /proc and draws every panel

use std::io::Stdout;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect, Size},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Row, Table},
    Frame, Terminal,
};

use crate::config::{BoolOpt, ConfigStore, IntOpt, Options, StrOpt};
use crate::error::Result;
use crate::input::{Interrupt, Key, MouseRegions, Token};
use crate::panel::Panel;

use super::procs::{ProcQuery, ProcSampler, ProcTable, DETAIL_ROWS};
use super::runner::RenderRequest;
use super::sampler::{format_bytes, SystemSampler, SystemStats};

/// Longest the thread sleeps before checking the terminal size.
const SIZE_CHECK: Duration = Duration::from_millis(250);

pub(super) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Converts a 0-based frame rectangle into the 1-based coordinates the
/// terminal reports mouse events in.
pub fn to_screen(area: Rect) -> Rect {
    Rect::new(area.x + 1, area.y + 1, area.width, area.height)
}

/// Panel placement: cpu on top, mem and net side by side, proc below.
pub fn layout(area: Rect, shown: &[Panel]) -> Vec<(Panel, Rect)> {
    let bands: Vec<(Vec<Panel>, u16)> = [
        (vec![Panel::Cpu], 1),
        (vec![Panel::Mem, Panel::Net], 1),
        (vec![Panel::Proc], 2),
    ]
    .into_iter()
    .map(|(panels, weight)| {
        let panels: Vec<Panel> = panels.into_iter().filter(|p| shown.contains(p)).collect();
        (panels, weight)
    })
    .filter(|(panels, _)| !panels.is_empty())
    .collect();

    let rows = Layout::vertical(bands.iter().map(|(_, w)| Constraint::Fill(*w))).split(area);
    let mut placed = Vec::new();
    for ((panels, _), row) in bands.iter().zip(rows.iter()) {
        let cols = Layout::horizontal(panels.iter().map(|_| Constraint::Fill(1))).split(*row);
        placed.extend(panels.iter().copied().zip(cols.iter().copied()));
    }
    placed
}

/// One label in a panel's top border; labels with a token are clickable.
struct TitleItem {
    label: String,
    token: Option<Token>,
    highlight: bool,
}

impl TitleItem {
    fn text(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            token: None,
            highlight: false,
        }
    }

    fn button(label: impl Into<String>, token: Token) -> Self {
        Self {
            label: label.into(),
            token: Some(token),
            highlight: false,
        }
    }

    fn on(mut self, highlight: bool) -> Self {
        self.highlight = highlight;
        self
    }
}

/// Builds the title line for `area` and the screen regions of its buttons.
fn title(area: Rect, items: &[TitleItem]) -> (Line<'static>, Vec<(Token, Rect)>) {
    let mut spans = Vec::new();
    let mut regions = Vec::new();
    // Titles start one cell right of the corner.
    let mut x = area.x + 1;
    for item in items {
        let text = format!(" {} ", item.label);
        let width = text.chars().count() as u16;
        let style = match (item.token.is_some(), item.highlight) {
            (_, true) => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            (true, false) => Style::default().fg(Color::Cyan),
            (false, false) => Style::default().fg(Color::White),
        };
        if let Some(token) = item.token {
            regions.push((token, to_screen(Rect::new(x, area.y, width, 1))));
        }
        spans.push(Span::styled(text, style));
        x = x.saturating_add(width);
    }
    (Line::from(spans), regions)
}

pub(super) struct Renderer {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    rx: Receiver<RenderRequest>,
    options: Arc<Mutex<Options>>,
    procs: Arc<Mutex<ProcTable>>,
    collecting: Arc<Mutex<()>>,
    regions: MouseRegions,
    interrupt: Interrupt,
    system: SystemSampler,
    sampler: ProcSampler,
    layout: Vec<(Panel, Rect)>,
    size: Size,
}

impl Renderer {
    pub(super) fn new(
        terminal: Terminal<CrosstermBackend<Stdout>>,
        rx: Receiver<RenderRequest>,
        options: Arc<Mutex<Options>>,
        procs: Arc<Mutex<ProcTable>>,
        collecting: Arc<Mutex<()>>,
        regions: MouseRegions,
        interrupt: Interrupt,
    ) -> Self {
        Self {
            terminal,
            rx,
            options,
            procs,
            collecting,
            regions,
            interrupt,
            system: SystemSampler::new(),
            sampler: ProcSampler::new(),
            layout: Vec::new(),
            size: Size::default(),
        }
    }

    pub(super) fn run(mut self) -> Result<()> {
        self.collect();
        self.draw(true)?;
        let mut next_sample = Instant::now() + self.update_interval();

        loop {
            let wait = next_sample.saturating_duration_since(Instant::now()).min(SIZE_CHECK);
            match self.rx.recv_timeout(wait) {
                Ok(RenderRequest::Quit) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(RenderRequest::Panel {
                    panel,
                    no_update,
                    force_redraw,
                }) => {
                    tracing::trace!(%panel, no_update, force_redraw, "render request");
                    if !no_update {
                        self.collect();
                    }
                    if panel == Panel::Cpu {
                        next_sample = Instant::now() + self.update_interval();
                    }
                    self.draw(force_redraw)?;
                }
                Ok(RenderRequest::Resize { force }) => {
                    if force {
                        self.terminal.clear()?;
                    }
                    self.draw(true)?;
                }
                Err(RecvTimeoutError::Timeout) => {
                    if self.terminal.size()? != self.size {
                        tracing::debug!("terminal resized");
                        self.interrupt.trigger();
                        self.terminal.clear()?;
                        self.draw(true)?;
                    }
                    if Instant::now() >= next_sample {
                        self.collect();
                        self.draw(false)?;
                        next_sample = Instant::now() + self.update_interval();
                    }
                }
            }
        }
        tracing::debug!("render thread stopped");
        Ok(())
    }

    fn update_interval(&self) -> Duration {
        let ms = lock(&self.options).get_int(IntOpt::UpdateMs);
        Duration::from_millis(u64::try_from(ms).unwrap_or(2000))
    }

    fn collect(&mut self) {
        let rows = {
            let _busy = lock(&self.collecting);
            self.sampler.sample()
        };
        self.system.sample();
        lock(&self.procs).replace(rows);
    }

    /// Redraws every shown panel; `relayout` recomputes panel geometry.
    fn draw(&mut self, relayout: bool) -> Result<()> {
        let mut options = lock(&self.options);
        let mut procs = lock(&self.procs);

        let size = self.terminal.size()?;
        if relayout || size != self.size || self.layout.is_empty() {
            self.size = size;
            let shown: Vec<Panel> = Panel::ALL
                .iter()
                .copied()
                .filter(|p| options.panel_shown(*p))
                .collect();
            self.layout = layout(Rect::new(0, 0, size.width, size.height), &shown);
            let proc_area = self
                .layout
                .iter()
                .find(|(p, _)| *p == Panel::Proc)
                .map_or(Rect::default(), |(_, r)| to_screen(*r));
            procs.set_area(proc_area);
        }

        procs.arrange(&ProcQuery::from_store(&*options));
        procs.sync_selection(&mut *options)?;

        let stats = self.system.stats();
        let panels = &self.layout;
        let mut regions = Vec::new();
        self.terminal.draw(|frame| {
            for (panel, area) in panels {
                let mapped = match panel {
                    Panel::Cpu => draw_cpu(frame, *area, &options, stats),
                    Panel::Mem => draw_mem(frame, *area, &options, stats),
                    Panel::Net => draw_net(frame, *area, stats),
                    Panel::Proc => draw_proc(frame, *area, &options, &procs, stats),
                };
                regions.extend(mapped);
            }
        })?;
        self.regions.replace(regions);
        Ok(())
    }
}

fn panel_block(title: Line<'static>) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
}

fn draw_cpu(frame: &mut Frame, area: Rect, options: &Options, stats: &SystemStats) -> Vec<(Token, Rect)> {
    let (line, regions) = title(
        area,
        &[
            TitleItem::text("1 cpu"),
            TitleItem::button("-", Token::Char('-')),
            TitleItem::text(format!("{}ms", options.get_int(IntOpt::UpdateMs))),
            TitleItem::button("+", Token::Char('+')),
        ],
    );
    let block = panel_block(line);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(usage_color(stats.cpu_percent)))
        .label(format!("{:.1}% of {} cores", stats.cpu_percent, stats.cores))
        .ratio((stats.cpu_percent / 100.0).clamp(0.0, 1.0));
    frame.render_widget(gauge, Rect { height: inner.height.min(1), ..inner });
    regions
}

fn draw_mem(frame: &mut Frame, area: Rect, options: &Options, stats: &SystemStats) -> Vec<(Token, Rect)> {
    let io_mode = options.get_bool(BoolOpt::IoMode);
    let (line, regions) = title(
        area,
        &[
            TitleItem::text("2 mem"),
            TitleItem::button("io", Token::Char('i')).on(io_mode),
        ],
    );
    let block = panel_block(line);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = if io_mode {
        vec![
            Line::from(format!("read   {}/s", format_bytes(stats.disk_read))),
            Line::from(format!("write  {}/s", format_bytes(stats.disk_write))),
        ]
    } else {
        let used = stats.mem_total.saturating_sub(stats.mem_available);
        let swap_used = stats.swap_total.saturating_sub(stats.swap_free);
        vec![
            Line::from(format!(
                "used   {} / {}",
                format_bytes(used as f64),
                format_bytes(stats.mem_total as f64)
            )),
            Line::from(format!("avail  {}", format_bytes(stats.mem_available as f64))),
            Line::from(format!(
                "swap   {} / {}",
                format_bytes(swap_used as f64),
                format_bytes(stats.swap_total as f64)
            )),
        ]
    };
    frame.render_widget(Paragraph::new(lines), inner);
    regions
}

fn draw_net(frame: &mut Frame, area: Rect, stats: &SystemStats) -> Vec<(Token, Rect)> {
    let (line, regions) = title(area, &[TitleItem::text("3 net")]);
    let block = panel_block(line);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::from(format!("down  {}/s", format_bytes(stats.net_rx))),
        Line::from(format!("up    {}/s", format_bytes(stats.net_tx))),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
    regions
}

fn draw_proc(
    frame: &mut Frame,
    area: Rect,
    options: &Options,
    procs: &ProcTable,
    stats: &SystemStats,
) -> Vec<(Token, Rect)> {
    let filtering = options.get_bool(BoolOpt::ProcFiltering);
    let filter = options.get_str(StrOpt::ProcFilter);
    let filter_label = match (filtering, filter.is_empty()) {
        (true, _) => format!("filter: {filter}█"),
        (false, true) => "filter".to_string(),
        (false, false) => format!("filter: {filter}"),
    };

    let detailed = options.get_bool(BoolOpt::ShowDetailed);
    let (detail_area, list_area) = if detailed && area.height > DETAIL_ROWS {
        let [top, rest] =
            Layout::vertical([Constraint::Length(DETAIL_ROWS), Constraint::Fill(1)]).areas(area);
        (Some(top), rest)
    } else {
        (None, area)
    };

    let (line, regions) = title(
        list_area,
        &[
            TitleItem::text("4 proc"),
            TitleItem::button(filter_label, Token::Char('f')).on(filtering || !filter.is_empty()),
            TitleItem::button("<", Token::Key(Key::Left)),
            TitleItem::text(options.get_str(StrOpt::ProcSorting)),
            TitleItem::button(">", Token::Key(Key::Right)),
            TitleItem::button("tree", Token::Char('e')).on(options.get_bool(BoolOpt::ProcTree)),
            TitleItem::button("reverse", Token::Char('r')).on(options.get_bool(BoolOpt::ProcReversed)),
            TitleItem::button("per-core", Token::Char('c')).on(options.get_bool(BoolOpt::ProcPerCore)),
        ],
    );

    if let Some(detail_area) = detail_area {
        draw_detail(frame, detail_area, options, procs);
    }

    let block = panel_block(line);
    let height = procs.list_height(detailed).max(0) as usize;
    let start = procs.start().max(0) as usize;
    let selected = options.get_int(IntOpt::ProcSelected);
    let per_core = options.get_bool(BoolOpt::ProcPerCore);
    let lazy = options.get_str(StrOpt::ProcSorting) != "cpu direct";
    let cores = stats.cores.max(1) as f64;

    let rows: Vec<Row> = procs
        .rows()
        .iter()
        .skip(start)
        .take(height)
        .enumerate()
        .map(|(idx, proc)| {
            let cpu = if lazy { proc.cpu_lazy } else { proc.cpu_direct };
            let cpu = if per_core { cpu } else { cpu / cores };
            let marker = match (proc.depth, proc.folded) {
                (0, false) => String::new(),
                (d, folded) => format!("{}{}", "  ".repeat(d), if folded { "+ " } else { "└ " }),
            };
            let row = Row::new(vec![
                format!("{:>7}", proc.pid),
                format!("{marker}{}", proc.name),
                format!("{:>3}", proc.threads),
                proc.uid.to_string(),
                format_bytes(proc.mem_kb as f64 * 1024.0),
                format!("{cpu:>5.1}"),
            ]);
            if idx as i64 + 1 == selected {
                row.style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
            } else {
                row
            }
        })
        .collect();

    let header = Row::new(vec!["Pid", "Program", "Thr", "User", "Mem", "Cpu%"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let widths = [
        Constraint::Length(8),
        Constraint::Min(16),
        Constraint::Length(4),
        Constraint::Length(6),
        Constraint::Length(7),
        Constraint::Length(6),
    ];
    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, list_area);
    regions
}

fn draw_detail(frame: &mut Frame, area: Rect, options: &Options, procs: &ProcTable) {
    let pid = options.get_int(IntOpt::DetailedPid);
    let block = Block::default()
        .title(format!(" {pid} "))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let lines = match procs.find(pid) {
        Some(proc) => vec![
            Line::from(format!("name     {}", proc.name)),
            Line::from(format!("parent   {}", proc.ppid)),
            Line::from(format!("threads  {}", proc.threads)),
            Line::from(format!("memory   {}", format_bytes(proc.mem_kb as f64 * 1024.0))),
            Line::from(format!("command  {}", proc.command)),
        ],
        None => vec![Line::from("process exited")],
    };
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn usage_color(percent: f64) -> Color {
    if percent > 80.0 {
        Color::Red
    } else if percent > 40.0 {
        Color::Yellow
    } else {
        Color::Green
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_layout_all_panels() {
        let placed = layout(Rect::new(0, 0, 80, 40), Panel::ALL);
        let panels: Vec<Panel> = placed.iter().map(|(p, _)| *p).collect();
        assert_eq!(panels, vec![Panel::Cpu, Panel::Mem, Panel::Net, Panel::Proc]);

        let rect = |p: Panel| placed.iter().find(|(q, _)| *q == p).map(|(_, r)| *r).unwrap();
        assert_eq!(rect(Panel::Cpu).width, 80);
        assert_eq!(rect(Panel::Mem).y, rect(Panel::Net).y);
        assert_eq!(rect(Panel::Mem).width + rect(Panel::Net).width, 80);
        assert!(rect(Panel::Proc).y > rect(Panel::Mem).y);
        assert_eq!(rect(Panel::Proc).y + rect(Panel::Proc).height, 40);
    }

    #[test]
    fn test_layout_single_panel_fills_screen() {
        let placed = layout(Rect::new(0, 0, 80, 24), &[Panel::Net]);
        assert_eq!(placed, vec![(Panel::Net, Rect::new(0, 0, 80, 24))]);
    }

    #[test]
    fn test_layout_nothing_shown() {
        assert!(layout(Rect::new(0, 0, 80, 24), &[]).is_empty());
    }

    #[test]
    fn test_title_regions_are_screen_coordinates() {
        let area = Rect::new(0, 10, 40, 10);
        let (_, regions) = title(
            area,
            &[TitleItem::text("4 proc"), TitleItem::button("tree", Token::Char('e'))],
        );
        // " 4 proc " spans columns 1..9; " tree " follows at 9 (0-based).
        assert_eq!(regions, vec![(Token::Char('e'), Rect::new(10, 11, 6, 1))]);
    }

    #[test]
    fn test_to_screen() {
        assert_eq!(to_screen(Rect::new(0, 0, 5, 5)), Rect::new(1, 1, 5, 5));
    }
}
