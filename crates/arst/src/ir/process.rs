use std::fmt;

use crate::ir::{SigDisplay, SigSpec, Wire};

/// `target <- value`, both of the same width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub target: SigSpec,
    pub value: SigSpec,
}

impl Action {
    pub fn new(target: SigSpec, value: SigSpec) -> Self {
        debug_assert_eq!(target.width(), value.width());
        Self { target, value }
    }
}

/// A branch of the decision tree. The local actions are applied first,
/// then the nested switches in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseRule {
    /// Patterns selecting this case; empty means default.
    pub compare: Vec<SigSpec>,
    pub actions: Vec<Action>,
    pub switches: Vec<SwitchRule>,
}

impl CaseRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matching(pattern: SigSpec) -> Self {
        Self {
            compare: vec![pattern],
            ..Default::default()
        }
    }

    pub fn with_action(mut self, target: SigSpec, value: SigSpec) -> Self {
        self.actions.push(Action::new(target, value));
        self
    }

    pub fn with_switch(mut self, switch: SwitchRule) -> Self {
        self.switches.push(switch);
        self
    }

    pub fn is_default(&self) -> bool {
        self.compare.is_empty()
    }

    /// No actions and no nested switches.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.switches.is_empty()
    }

    pub fn selects(&self, pattern: &SigSpec) -> bool {
        self.compare.contains(pattern)
    }

    /// Number of cases and switches in this subtree, this case included.
    pub fn node_count(&self) -> usize {
        1 + self
            .switches
            .iter()
            .map(|sw| 1 + sw.cases.iter().map(CaseRule::node_count).sum::<usize>())
            .sum::<usize>()
    }
}

/// Priority multiplexer: the first case whose compare set matches `signal`
/// is taken.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwitchRule {
    pub signal: SigSpec,
    pub cases: Vec<CaseRule>,
}

impl SwitchRule {
    pub fn new(signal: SigSpec) -> Self {
        Self {
            signal,
            cases: Vec::new(),
        }
    }

    pub fn with_case(mut self, case: CaseRule) -> Self {
        self.cases.push(case);
        self
    }

    pub fn default_case(&self) -> Option<&CaseRule> {
        self.cases.iter().find(|case| case.is_default())
    }

    /// A single case that is always taken.
    pub fn is_transparent(&self) -> bool {
        self.cases.len() == 1 && (self.signal.is_empty() || self.cases[0].is_default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    Low,
    High,
    Posedge,
    Negedge,
    AnyEdge,
    Always,
    Init,
}

impl TriggerKind {
    pub fn is_edge(self) -> bool {
        matches!(self, TriggerKind::Posedge | TriggerKind::Negedge)
    }

    /// Signal value at which a rising or falling edge trigger is asserted.
    pub fn edge_polarity(self) -> Option<bool> {
        match self {
            TriggerKind::Posedge => Some(true),
            TriggerKind::Negedge => Some(false),
            _ => None,
        }
    }

    /// Level trigger asserted at the same value as this edge trigger.
    pub fn to_level(self) -> Self {
        match self {
            TriggerKind::Posedge => TriggerKind::High,
            TriggerKind::Negedge => TriggerKind::Low,
            other => other,
        }
    }

    pub fn level(active_low: bool) -> Self {
        if active_low {
            TriggerKind::Low
        } else {
            TriggerKind::High
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TriggerKind::Low => "low",
            TriggerKind::High => "high",
            TriggerKind::Posedge => "posedge",
            TriggerKind::Negedge => "negedge",
            TriggerKind::AnyEdge => "edge",
            TriggerKind::Always => "always",
            TriggerKind::Init => "init",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRule {
    pub trigger: TriggerKind,
    pub signal: SigSpec,
    pub actions: Vec<Action>,
}

impl UpdateRule {
    pub fn new(trigger: TriggerKind, signal: SigSpec) -> Self {
        Self {
            trigger,
            signal,
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, target: SigSpec, value: SigSpec) -> Self {
        self.actions.push(Action::new(target, value));
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Process {
    pub name: String,
    pub root: CaseRule,
    pub rules: Vec<UpdateRule>,
}

impl Process {
    pub fn new(name: impl Into<String>, root: CaseRule) -> Self {
        Self {
            name: name.into(),
            root,
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: UpdateRule) -> Self {
        self.rules.push(rule);
        self
    }
}

/// Indented dump of a process in netlist notation.
pub struct ProcessDisplay<'a> {
    wires: &'a [Wire],
    process: &'a Process,
}

impl<'a> ProcessDisplay<'a> {
    pub fn new(wires: &'a [Wire], process: &'a Process) -> Self {
        Self { wires, process }
    }

    fn sig<'b>(&'b self, sig: &'b SigSpec) -> SigDisplay<'b> {
        SigDisplay::new(self.wires, sig)
    }

    fn fmt_case(&self, f: &mut fmt::Formatter<'_>, case: &CaseRule, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        for action in &case.actions {
            writeln!(
                f,
                "{indent}assign {} {}",
                self.sig(&action.target),
                self.sig(&action.value)
            )?;
        }
        for switch in &case.switches {
            writeln!(f, "{indent}switch {}", self.sig(&switch.signal))?;
            for case in &switch.cases {
                write!(f, "{indent}  case")?;
                for (i, pattern) in case.compare.iter().enumerate() {
                    let sep = if i == 0 { " " } else { ", " };
                    write!(f, "{sep}{}", self.sig(pattern))?;
                }
                writeln!(f)?;
                self.fmt_case(f, case, depth + 2)?;
            }
            writeln!(f, "{indent}end")?;
        }
        Ok(())
    }
}

impl fmt::Display for ProcessDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "process {}", self.process.name)?;
        self.fmt_case(f, &self.process.root, 1)?;
        for rule in &self.process.rules {
            writeln!(f, "  sync {} {}", rule.trigger, self.sig(&rule.signal))?;
            for action in &rule.actions {
                writeln!(
                    f,
                    "    update {} {}",
                    self.sig(&action.target),
                    self.sig(&action.value)
                )?;
            }
        }
        write!(f, "end")
    }
}
