//! Typed runtime option store.
//!
//! Options are addressed by enum name rather than by string; every setter
//! validates its value and reports violations as
//! [`VitalsError::InvalidOption`].

use crate::error::{Result, VitalsError};
use crate::panel::Panel;

use super::MonitorConfig;

pub const UPDATE_MS_MIN: i64 = 100;
pub const UPDATE_MS_MAX: i64 = 86_400_000;

/// Process sort keys in cycling order.
pub const SORT_KEYS: &[&str] = &[
    "pid",
    "name",
    "command",
    "threads",
    "user",
    "memory",
    "cpu direct",
    "cpu lazy",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOpt {
    ProcFiltering,
    ProcTree,
    ProcReversed,
    ProcPerCore,
    ShowDetailed,
    IoMode,
}

impl BoolOpt {
    pub fn name(&self) -> &'static str {
        match self {
            BoolOpt::ProcFiltering => "proc_filtering",
            BoolOpt::ProcTree => "proc_tree",
            BoolOpt::ProcReversed => "proc_reversed",
            BoolOpt::ProcPerCore => "proc_per_core",
            BoolOpt::ShowDetailed => "show_detailed",
            BoolOpt::IoMode => "io_mode",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntOpt {
    UpdateMs,
    ProcSelected,
    ProcLastSelected,
    SelectedPid,
    DetailedPid,
}

impl IntOpt {
    pub fn name(&self) -> &'static str {
        match self {
            IntOpt::UpdateMs => "update_ms",
            IntOpt::ProcSelected => "proc_selected",
            IntOpt::ProcLastSelected => "proc_last_selected",
            IntOpt::SelectedPid => "selected_pid",
            IntOpt::DetailedPid => "detailed_pid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrOpt {
    ProcSorting,
    ProcFilter,
}

impl StrOpt {
    pub fn name(&self) -> &'static str {
        match self {
            StrOpt::ProcSorting => "proc_sorting",
            StrOpt::ProcFilter => "proc_filter",
        }
    }
}

/// Typed get/set/flip access to the shared option set.
pub trait ConfigStore {
    fn get_bool(&self, opt: BoolOpt) -> bool;
    fn get_int(&self, opt: IntOpt) -> i64;
    fn get_str(&self, opt: StrOpt) -> &str;

    fn set_bool(&mut self, opt: BoolOpt, value: bool) -> Result<()>;
    fn set_int(&mut self, opt: IntOpt, value: i64) -> Result<()>;
    fn set_str(&mut self, opt: StrOpt, value: &str) -> Result<()>;

    fn flip(&mut self, opt: BoolOpt) -> Result<()> {
        let value = self.get_bool(opt);
        self.set_bool(opt, !value)
    }

    fn panel_shown(&self, panel: Panel) -> bool;
    fn toggle_panel(&mut self, panel: Panel) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    proc_filtering: bool,
    proc_tree: bool,
    proc_reversed: bool,
    proc_per_core: bool,
    show_detailed: bool,
    io_mode: bool,
    update_ms: i64,
    proc_selected: i64,
    proc_last_selected: i64,
    selected_pid: i64,
    detailed_pid: i64,
    proc_sorting: String,
    proc_filter: String,
    shown: Vec<Panel>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            proc_filtering: false,
            proc_tree: false,
            proc_reversed: false,
            proc_per_core: false,
            show_detailed: false,
            io_mode: false,
            update_ms: 2000,
            proc_selected: 0,
            proc_last_selected: 0,
            selected_pid: 0,
            detailed_pid: 0,
            proc_sorting: "cpu lazy".to_string(),
            proc_filter: String::new(),
            shown: Panel::ALL.to_vec(),
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store from the config file, keeping defaults for any
    /// value that fails validation.
    pub fn from_config(config: &MonitorConfig) -> Self {
        let mut options = Self::default();

        let update_ms = i64::try_from(config.update_ms).unwrap_or(i64::MAX);
        let applied = [
            options.set_int(IntOpt::UpdateMs, update_ms),
            options.set_str(StrOpt::ProcSorting, &config.proc_sorting),
            options.set_str(StrOpt::ProcFilter, &config.proc_filter),
            options.set_bool(BoolOpt::ProcReversed, config.proc_reversed),
            options.set_bool(BoolOpt::ProcTree, config.proc_tree),
            options.set_bool(BoolOpt::ProcPerCore, config.proc_per_core),
            options.set_bool(BoolOpt::IoMode, config.io_mode),
        ];
        for err in applied.into_iter().filter_map(|r| r.err()) {
            tracing::warn!("Ignoring config value: {}", err);
        }

        options.shown = Vec::new();
        for name in config.shown_boxes.split_whitespace() {
            match name.parse::<Panel>() {
                Ok(panel) if !options.shown.contains(&panel) => options.shown.push(panel),
                Ok(_) => {}
                Err(e) => tracing::warn!("Ignoring shown_boxes entry: {}", e),
            }
        }
        options
    }
}

fn non_negative(opt: IntOpt, value: i64) -> Result<()> {
    if value < 0 {
        return Err(VitalsError::invalid(opt.name(), format!("{value} is negative")));
    }
    Ok(())
}

impl ConfigStore for Options {
    fn get_bool(&self, opt: BoolOpt) -> bool {
        match opt {
            BoolOpt::ProcFiltering => self.proc_filtering,
            BoolOpt::ProcTree => self.proc_tree,
            BoolOpt::ProcReversed => self.proc_reversed,
            BoolOpt::ProcPerCore => self.proc_per_core,
            BoolOpt::ShowDetailed => self.show_detailed,
            BoolOpt::IoMode => self.io_mode,
        }
    }

    fn get_int(&self, opt: IntOpt) -> i64 {
        match opt {
            IntOpt::UpdateMs => self.update_ms,
            IntOpt::ProcSelected => self.proc_selected,
            IntOpt::ProcLastSelected => self.proc_last_selected,
            IntOpt::SelectedPid => self.selected_pid,
            IntOpt::DetailedPid => self.detailed_pid,
        }
    }

    fn get_str(&self, opt: StrOpt) -> &str {
        match opt {
            StrOpt::ProcSorting => &self.proc_sorting,
            StrOpt::ProcFilter => &self.proc_filter,
        }
    }

    fn set_bool(&mut self, opt: BoolOpt, value: bool) -> Result<()> {
        let slot = match opt {
            BoolOpt::ProcFiltering => &mut self.proc_filtering,
            BoolOpt::ProcTree => &mut self.proc_tree,
            BoolOpt::ProcReversed => &mut self.proc_reversed,
            BoolOpt::ProcPerCore => &mut self.proc_per_core,
            BoolOpt::ShowDetailed => &mut self.show_detailed,
            BoolOpt::IoMode => &mut self.io_mode,
        };
        *slot = value;
        Ok(())
    }

    fn set_int(&mut self, opt: IntOpt, value: i64) -> Result<()> {
        match opt {
            IntOpt::UpdateMs => {
                if !(UPDATE_MS_MIN..=UPDATE_MS_MAX).contains(&value) {
                    return Err(VitalsError::invalid(
                        opt.name(),
                        format!("{value} outside {UPDATE_MS_MIN}..={UPDATE_MS_MAX}"),
                    ));
                }
                self.update_ms = value;
            }
            IntOpt::ProcSelected => {
                non_negative(opt, value)?;
                self.proc_selected = value;
            }
            IntOpt::ProcLastSelected => {
                non_negative(opt, value)?;
                self.proc_last_selected = value;
            }
            IntOpt::SelectedPid => {
                non_negative(opt, value)?;
                self.selected_pid = value;
            }
            IntOpt::DetailedPid => {
                non_negative(opt, value)?;
                self.detailed_pid = value;
            }
        }
        Ok(())
    }

    fn set_str(&mut self, opt: StrOpt, value: &str) -> Result<()> {
        match opt {
            StrOpt::ProcSorting => {
                if !SORT_KEYS.contains(&value) {
                    return Err(VitalsError::invalid(
                        opt.name(),
                        format!("unknown sort key '{value}'"),
                    ));
                }
                self.proc_sorting = value.to_string();
            }
            StrOpt::ProcFilter => self.proc_filter = value.to_string(),
        }
        Ok(())
    }

    fn panel_shown(&self, panel: Panel) -> bool {
        self.shown.contains(&panel)
    }

    fn toggle_panel(&mut self, panel: Panel) -> Result<()> {
        if let Some(idx) = self.shown.iter().position(|p| *p == panel) {
            self.shown.remove(idx);
        } else {
            self.shown.push(panel);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_update_ms_bounds() {
        let mut options = Options::new();
        assert!(options.set_int(IntOpt::UpdateMs, UPDATE_MS_MIN).is_ok());
        assert!(options.set_int(IntOpt::UpdateMs, UPDATE_MS_MAX).is_ok());
        assert!(options.set_int(IntOpt::UpdateMs, UPDATE_MS_MIN - 1).is_err());
        assert!(options.set_int(IntOpt::UpdateMs, UPDATE_MS_MAX + 1).is_err());
        assert_eq!(options.get_int(IntOpt::UpdateMs), UPDATE_MS_MAX);
    }

    #[test]
    fn test_sorting_must_be_known() {
        let mut options = Options::new();
        assert!(options.set_str(StrOpt::ProcSorting, "memory").is_ok());
        let err = options.set_str(StrOpt::ProcSorting, "colour").unwrap_err();
        assert!(err.to_string().contains("proc_sorting"));
        assert_eq!(options.get_str(StrOpt::ProcSorting), "memory");
    }

    #[test]
    fn test_flip_twice_restores() {
        let mut options = Options::new();
        for opt in [BoolOpt::ProcTree, BoolOpt::ProcReversed, BoolOpt::ProcPerCore, BoolOpt::IoMode] {
            let before = options.get_bool(opt);
            options.flip(opt).unwrap();
            assert_eq!(options.get_bool(opt), !before);
            options.flip(opt).unwrap();
            assert_eq!(options.get_bool(opt), before);
        }
    }

    #[test]
    fn test_toggle_panel() {
        let mut options = Options::new();
        assert!(options.panel_shown(Panel::Net));
        options.toggle_panel(Panel::Net).unwrap();
        assert!(!options.panel_shown(Panel::Net));
        options.toggle_panel(Panel::Net).unwrap();
        assert!(options.panel_shown(Panel::Net));
    }

    #[test]
    fn test_from_config_keeps_defaults_for_bad_values() {
        let config = MonitorConfig {
            update_ms: 5,
            proc_sorting: "bogus".to_string(),
            shown_boxes: "proc cpu gpu proc".to_string(),
            proc_tree: true,
            ..MonitorConfig::default()
        };
        let options = Options::from_config(&config);
        assert_eq!(options.get_int(IntOpt::UpdateMs), 2000);
        assert_eq!(options.get_str(StrOpt::ProcSorting), "cpu lazy");
        assert!(options.get_bool(BoolOpt::ProcTree));
        let shown: Vec<Panel> = Panel::ALL
            .iter()
            .copied()
            .filter(|p| options.panel_shown(*p))
            .collect();
        assert_eq!(shown, vec![Panel::Cpu, Panel::Proc]);
    }
}
