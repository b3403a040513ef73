use crate::ir::{Cell, CellKind, Module, PORT_A, PORT_B, PORT_Y, Process, SigSpec};

/// Assembles a [`Module`] the way a netlist frontend would: wires first,
/// then gates driving fresh internal wires, then processes.
pub struct ModuleBuilder {
    module: Module,
    next_cell_id: usize,
}

impl ModuleBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            module: Module::new(name),
            next_cell_id: 0,
        }
    }

    pub fn wire(&mut self, name: &str, width: usize) -> SigSpec {
        let id = self.module.add_wire(name, width);
        self.module.sig(id)
    }

    /// Wire with a declared initial value, extended or truncated to `width`.
    pub fn wire_with_init(&mut self, name: &str, width: usize, init: SigSpec) -> SigSpec {
        let id = self.module.add_wire(name, width);
        self.module.wire_mut(id).init = Some(init.extend_u0(width));
        self.module.sig(id)
    }

    pub fn connect(&mut self, lhs: SigSpec, rhs: SigSpec) {
        debug_assert_eq!(lhs.width(), rhs.width());
        self.module.connections.push((lhs, rhs));
    }

    pub fn cell<'p>(
        &mut self,
        kind: CellKind,
        connections: impl IntoIterator<Item = (&'p str, SigSpec)>,
    ) {
        let name = format!("{}${}", kind.type_name(), self.next_cell_id);
        self.next_cell_id += 1;
        self.module.cells.push(Cell {
            name,
            kind,
            connections: connections
                .into_iter()
                .map(|(port, sig)| (port.to_string(), sig))
                .collect(),
        });
    }

    fn fresh_output(&mut self, kind: &CellKind, width: usize) -> SigSpec {
        let name = format!("{}${}_Y", kind.type_name(), self.next_cell_id);
        self.wire(&name, width)
    }

    pub fn unary(&mut self, kind: CellKind, a: &SigSpec, y_width: usize) -> SigSpec {
        let y = self.fresh_output(&kind, y_width);
        self.cell(kind, [(PORT_A, a.clone()), (PORT_Y, y.clone())]);
        y
    }

    pub fn binary(&mut self, kind: CellKind, a: &SigSpec, b: &SigSpec) -> SigSpec {
        let y = self.fresh_output(&kind, 1);
        self.cell(
            kind,
            [(PORT_A, a.clone()), (PORT_B, b.clone()), (PORT_Y, y.clone())],
        );
        y
    }

    pub fn not(&mut self, a: &SigSpec) -> SigSpec {
        self.unary(CellKind::Not, a, a.width())
    }

    pub fn logic_not(&mut self, a: &SigSpec) -> SigSpec {
        self.unary(CellKind::LogicNot, a, 1)
    }

    pub fn reduce_or(&mut self, a: &SigSpec) -> SigSpec {
        self.unary(CellKind::ReduceOr, a, 1)
    }

    pub fn reduce_bool(&mut self, a: &SigSpec) -> SigSpec {
        self.unary(CellKind::ReduceBool, a, 1)
    }

    pub fn eq(&mut self, a: &SigSpec, b: &SigSpec) -> SigSpec {
        self.binary(CellKind::Eq, a, b)
    }

    pub fn ne(&mut self, a: &SigSpec, b: &SigSpec) -> SigSpec {
        self.binary(CellKind::Ne, a, b)
    }

    pub fn process(&mut self, process: Process) {
        self.module.processes.push(process);
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn build(self) -> Module {
        self.module
    }
}
