use crate::HashMap;
use itertools::Itertools;
use std::fmt;

mod builder;
mod process;
pub use builder::ModuleBuilder;
pub use process::{Action, CaseRule, Process, ProcessDisplay, SwitchRule, TriggerKind, UpdateRule};

pub const PORT_A: &str = "A";
pub const PORT_B: &str = "B";
pub const PORT_Y: &str = "Y";

/// Value of a constant signal bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum State {
    Zero,
    One,
    Undef,
    HighZ,
    /// Placeholder for a bit whose value has not been determined yet.
    Marker,
}

impl State {
    pub fn as_char(self) -> char {
        match self {
            State::Zero => '0',
            State::One => '1',
            State::Undef => 'x',
            State::HighZ => 'z',
            State::Marker => 'm',
        }
    }
}

impl From<bool> for State {
    fn from(value: bool) -> Self {
        if value { State::One } else { State::Zero }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WireId(pub usize);

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SigBit {
    Const(State),
    Wire { wire: WireId, offset: usize },
}

impl SigBit {
    pub fn is_const(&self) -> bool {
        matches!(self, SigBit::Const(_))
    }

    pub fn is_wire(&self) -> bool {
        matches!(self, SigBit::Wire { .. })
    }
}

impl From<State> for SigBit {
    fn from(state: State) -> Self {
        SigBit::Const(state)
    }
}

/// Signal expression: an ordered, LSB-first sequence of constant bits and
/// wire bit references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SigSpec {
    bits: Vec<SigBit>,
}

impl SigSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(state: State, width: usize) -> Self {
        Self {
            bits: vec![SigBit::Const(state); width],
        }
    }

    pub fn from_bool(value: bool) -> Self {
        Self::constant(State::from(value), 1)
    }

    /// Builds a constant from the low `width` bits of `value`.
    pub fn from_uint(value: u64, width: usize) -> Self {
        (0..width)
            .map(|i| SigBit::Const(State::from(i < 64 && (value >> i) & 1 == 1)))
            .collect()
    }

    pub fn wire(wire: WireId, width: usize) -> Self {
        Self::wire_slice(wire, 0, width)
    }

    pub fn wire_slice(wire: WireId, offset: usize, width: usize) -> Self {
        (offset..offset + width)
            .map(|offset| SigBit::Wire { wire, offset })
            .collect()
    }

    pub fn width(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn bits(&self) -> &[SigBit] {
        &self.bits
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SigBit> {
        self.bits.iter()
    }

    pub fn extract(&self, offset: usize, width: usize) -> SigSpec {
        Self {
            bits: self.bits[offset..offset + width].to_vec(),
        }
    }

    pub fn append(&mut self, other: &SigSpec) {
        self.bits.extend_from_slice(&other.bits);
    }

    pub fn push(&mut self, bit: SigBit) {
        self.bits.push(bit);
    }

    /// Concatenation with `self` in the low bits.
    pub fn concat(mut self, other: &SigSpec) -> SigSpec {
        self.append(other);
        self
    }

    /// Overwrites the bits `offset..offset + with.width()`.
    pub fn replace_range(&mut self, offset: usize, with: &SigSpec) {
        self.bits[offset..offset + with.width()].copy_from_slice(&with.bits);
    }

    /// For every wire bit of `self` that occurs in `pattern`, writes the
    /// corresponding bit of `with` to the same position of `other`. When a
    /// bit occurs several times in `pattern` the last occurrence wins.
    pub fn replace(&self, pattern: &SigSpec, with: &SigSpec, other: &mut SigSpec) {
        debug_assert_eq!(pattern.width(), with.width());
        debug_assert_eq!(self.width(), other.width());
        for (i, bit) in self.bits.iter().enumerate() {
            if !bit.is_wire() {
                continue;
            }
            for (from, to) in pattern.bits.iter().zip(&with.bits) {
                if from == bit {
                    other.bits[i] = *to;
                }
            }
        }
    }

    pub fn is_fully_const(&self) -> bool {
        self.bits.iter().all(SigBit::is_const)
    }

    /// True when every bit is a constant 0 or 1.
    pub fn is_fully_def(&self) -> bool {
        self.bits
            .iter()
            .all(|bit| matches!(bit, SigBit::Const(State::Zero | State::One)))
    }

    pub fn has_marked_bits(&self) -> bool {
        self.bits.contains(&SigBit::Const(State::Marker))
    }

    /// Truth value of a constant: any bit set to 1.
    pub fn as_bool(&self) -> bool {
        self.bits.contains(&SigBit::Const(State::One))
    }

    /// Zero-extends or truncates to `width`.
    pub fn extend_u0(&self, width: usize) -> SigSpec {
        let mut bits = self.bits.clone();
        bits.resize(width, SigBit::Const(State::Zero));
        Self { bits }
    }

    pub fn map_bits(&mut self, f: impl Fn(SigBit) -> SigBit) {
        for bit in &mut self.bits {
            *bit = f(*bit);
        }
    }
}

impl From<SigBit> for SigSpec {
    fn from(bit: SigBit) -> Self {
        Self { bits: vec![bit] }
    }
}

impl FromIterator<SigBit> for SigSpec {
    fn from_iter<T: IntoIterator<Item = SigBit>>(iter: T) -> Self {
        Self {
            bits: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SigSpec {
    type Item = &'a SigBit;
    type IntoIter = std::slice::Iter<'a, SigBit>;

    fn into_iter(self) -> Self::IntoIter {
        self.bits.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wire {
    pub name: String,
    pub width: usize,
    /// Declared initial value (`reg q = 4'd5;`), always fully constant.
    pub init: Option<SigSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CellKind {
    ReduceOr,
    ReduceBool,
    LogicNot,
    Not,
    Eq,
    Eqx,
    Ne,
    Nex,
    Other(String),
}

impl CellKind {
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "$reduce_or" => CellKind::ReduceOr,
            "$reduce_bool" => CellKind::ReduceBool,
            "$logic_not" => CellKind::LogicNot,
            "$not" => CellKind::Not,
            "$eq" => CellKind::Eq,
            "$eqx" => CellKind::Eqx,
            "$ne" => CellKind::Ne,
            "$nex" => CellKind::Nex,
            other => CellKind::Other(other.to_string()),
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            CellKind::ReduceOr => "$reduce_or",
            CellKind::ReduceBool => "$reduce_bool",
            CellKind::LogicNot => "$logic_not",
            CellKind::Not => "$not",
            CellKind::Eq => "$eq",
            CellKind::Eqx => "$eqx",
            CellKind::Ne => "$ne",
            CellKind::Nex => "$nex",
            CellKind::Other(name) => name,
        }
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub name: String,
    pub kind: CellKind,
    pub connections: std::collections::BTreeMap<String, SigSpec>,
}

impl Cell {
    pub fn port(&self, name: &str) -> Option<&SigSpec> {
        self.connections.get(name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Module {
    pub name: String,
    pub wires: Vec<Wire>,
    pub cells: Vec<Cell>,
    /// Module-level `assign lhs = rhs;` connections.
    pub connections: Vec<(SigSpec, SigSpec)>,
    pub processes: Vec<Process>,
    wire_names: HashMap<String, WireId>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Declares a wire, or returns the existing one with the same name.
    pub fn add_wire(&mut self, name: impl Into<String>, width: usize) -> WireId {
        let name = name.into();
        if let Some(id) = self.wire_names.get(&name) {
            return *id;
        }
        let id = WireId(self.wires.len());
        self.wire_names.insert(name.clone(), id);
        self.wires.push(Wire {
            name,
            width,
            init: None,
        });
        id
    }

    pub fn wire(&self, id: WireId) -> &Wire {
        &self.wires[id.0]
    }

    pub fn wire_mut(&mut self, id: WireId) -> &mut Wire {
        &mut self.wires[id.0]
    }

    pub fn wire_by_name(&self, name: &str) -> Option<WireId> {
        self.wire_names.get(name).copied()
    }

    /// Full-width signal of a wire.
    pub fn sig(&self, id: WireId) -> SigSpec {
        SigSpec::wire(id, self.wire(id).width)
    }

    pub fn display<'a>(&'a self, sig: &'a SigSpec) -> SigDisplay<'a> {
        SigDisplay::new(&self.wires, sig)
    }

    pub fn display_process<'a>(&'a self, process: &'a Process) -> ProcessDisplay<'a> {
        ProcessDisplay::new(&self.wires, process)
    }
}

/// Modules in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Design {
    pub modules: Vec<Module>,
}

impl Design {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_module(&mut self, module: Module) {
        self.modules.push(module);
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn module_mut(&mut self, name: &str) -> Option<&mut Module> {
        self.modules.iter_mut().find(|m| m.name == name)
    }
}

/// Prints a signal in netlist notation, e.g. `{ q[7:4] 4'0000 }`.
pub struct SigDisplay<'a> {
    wires: &'a [Wire],
    sig: &'a SigSpec,
}

impl<'a> SigDisplay<'a> {
    pub fn new(wires: &'a [Wire], sig: &'a SigSpec) -> Self {
        Self { wires, sig }
    }
}

enum Chunk {
    Const(Vec<State>),
    Wire {
        wire: WireId,
        offset: usize,
        width: usize,
    },
}

fn chunks(sig: &SigSpec) -> Vec<Chunk> {
    let mut chunks: Vec<Chunk> = Vec::new();
    for bit in sig {
        let extended = match (chunks.last_mut(), *bit) {
            (Some(Chunk::Const(states)), SigBit::Const(state)) => {
                states.push(state);
                true
            }
            (
                Some(Chunk::Wire {
                    wire,
                    offset,
                    width,
                }),
                SigBit::Wire {
                    wire: next,
                    offset: next_offset,
                },
            ) if *wire == next && *offset + *width == next_offset => {
                *width += 1;
                true
            }
            _ => false,
        };
        if !extended {
            chunks.push(match *bit {
                SigBit::Const(state) => Chunk::Const(vec![state]),
                SigBit::Wire { wire, offset } => Chunk::Wire {
                    wire,
                    offset,
                    width: 1,
                },
            });
        }
    }
    chunks
}

impl SigDisplay<'_> {
    fn fmt_chunk(&self, chunk: &Chunk) -> String {
        match chunk {
            Chunk::Const(states) => format!(
                "{}'{}",
                states.len(),
                states.iter().rev().map(|s| s.as_char()).collect::<String>()
            ),
            Chunk::Wire {
                wire,
                offset,
                width,
            } => {
                let Some(info) = self.wires.get(wire.0) else {
                    return format!("{}[{}+:{}]", wire, offset, width);
                };
                if *offset == 0 && *width == info.width {
                    info.name.clone()
                } else if *width == 1 {
                    format!("{}[{}]", info.name, offset)
                } else {
                    format!("{}[{}:{}]", info.name, offset + width - 1, offset)
                }
            }
        }
    }
}

impl fmt::Display for SigDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chunks = chunks(self.sig);
        match chunks.as_slice() {
            [] => write!(f, "{{ }}"),
            [chunk] => f.write_str(&self.fmt_chunk(chunk)),
            _ => write!(
                f,
                "{{ {} }}",
                chunks.iter().rev().map(|c| self.fmt_chunk(c)).join(" ")
            ),
        }
    }
}
