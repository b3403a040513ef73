use crate::HashMap;
use crate::SigMap;
use crate::ir::{Cell, CellKind, PORT_A, PORT_B, PORT_Y, SigBit, SigSpec};

/// Resolves whether a single-bit signal is the same net as a reference
/// signal, possibly inverted, by walking back through its driving gates.
pub struct SignalTracer<'a> {
    cells: &'a [Cell],
    sigmap: &'a SigMap,
    drivers: HashMap<SigBit, usize>,
}

impl<'a> SignalTracer<'a> {
    pub fn new(cells: &'a [Cell], sigmap: &'a SigMap) -> Self {
        let mut drivers = HashMap::default();
        for (index, cell) in cells.iter().enumerate() {
            if !is_traceable(&cell.kind) {
                continue;
            }
            if let Some(y) = cell.port(PORT_Y)
                && let [bit] = y.bits()
            {
                drivers.entry(sigmap.apply_bit(*bit)).or_insert(index);
            }
        }
        Self {
            cells,
            sigmap,
            drivers,
        }
    }

    /// Returns `Some(true)` when `signal` follows `reference`, `Some(false)`
    /// when it is its inversion and `None` when no supported gate chain
    /// connects them.
    pub fn resolve(&self, signal: &SigSpec, reference: &SigSpec) -> Option<bool> {
        let reference = self.sigmap.map(reference);
        let mut current = self.sigmap.map(signal);
        let mut same = true;

        // Every step consumes one driver, so a longer walk is a gate loop.
        for _ in 0..=self.drivers.len() {
            let [bit] = current.bits() else {
                return None;
            };
            if current == reference {
                return Some(same);
            }
            let cell = &self.cells[*self.drivers.get(bit)?];
            let (input, inverts) = unwind(cell)?;
            same ^= inverts;
            current = self.sigmap.map(input);
        }
        None
    }
}

fn is_traceable(kind: &CellKind) -> bool {
    !matches!(kind, CellKind::Other(_))
}

/// Input a single-output gate passes its value through, and whether it
/// inverts it on the way.
fn unwind(cell: &Cell) -> Option<(&SigSpec, bool)> {
    match cell.kind {
        CellKind::ReduceOr | CellKind::ReduceBool => Some((cell.port(PORT_A)?, false)),
        CellKind::LogicNot | CellKind::Not => Some((cell.port(PORT_A)?, true)),
        CellKind::Eq | CellKind::Eqx => compared_operand(cell, false),
        CellKind::Ne | CellKind::Nex => compared_operand(cell, true),
        CellKind::Other(_) => None,
    }
}

// `x == 0` and `x != 1` invert, `x == 1` and `x != 0` do not.
fn compared_operand(cell: &Cell, negated: bool) -> Option<(&SigSpec, bool)> {
    let a = cell.port(PORT_A)?;
    let b = cell.port(PORT_B)?;
    if a.is_fully_const() {
        Some((b, a.as_bool() == negated))
    } else if b.is_fully_const() {
        Some((a, b.as_bool() == negated))
    } else {
        None
    }
}
