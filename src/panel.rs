use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    Cpu,
    Mem,
    Net,
    Proc,
}

impl Panel {
    /// Panels in the order of their global toggle digits `1`..`4`.
    pub const ALL: &'static [Panel] = &[Panel::Cpu, Panel::Mem, Panel::Net, Panel::Proc];

    pub fn from_digit(c: char) -> Option<Panel> {
        let idx = c.to_digit(10)? as usize;
        idx.checked_sub(1).and_then(|i| Self::ALL.get(i)).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Panel::Cpu => "cpu",
            Panel::Mem => "mem",
            Panel::Net => "net",
            Panel::Proc => "proc",
        }
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Panel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| format!("unknown panel '{s}'"))
    }
}
