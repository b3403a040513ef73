use arst::ir::{CellKind, ModuleBuilder, SigSpec};
use arst::{SigMap, SignalTracer};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Gate {
    ReduceOr,
    ReduceBool,
    LogicNot,
    Not,
    Eq { constant: bool, const_on_a: bool },
    Ne { constant: bool, const_on_a: bool },
}

impl Gate {
    fn inverts(self) -> bool {
        match self {
            Gate::ReduceOr | Gate::ReduceBool => false,
            Gate::LogicNot | Gate::Not => true,
            Gate::Eq { constant, .. } => !constant,
            Gate::Ne { constant, .. } => constant,
        }
    }

    fn build(self, builder: &mut ModuleBuilder, input: &SigSpec) -> SigSpec {
        let compare = |builder: &mut ModuleBuilder, kind, constant: bool, const_on_a: bool| {
            let c = SigSpec::from_bool(constant);
            if const_on_a {
                builder.binary(kind, &c, input)
            } else {
                builder.binary(kind, input, &c)
            }
        };
        match self {
            Gate::ReduceOr => builder.reduce_or(input),
            Gate::ReduceBool => builder.reduce_bool(input),
            Gate::LogicNot => builder.logic_not(input),
            Gate::Not => builder.not(input),
            Gate::Eq {
                constant,
                const_on_a,
            } => compare(builder, CellKind::Eq, constant, const_on_a),
            Gate::Ne {
                constant,
                const_on_a,
            } => compare(builder, CellKind::Ne, constant, const_on_a),
        }
    }
}

fn gate() -> impl Strategy<Value = Gate> {
    prop_oneof![
        Just(Gate::ReduceOr),
        Just(Gate::ReduceBool),
        Just(Gate::LogicNot),
        Just(Gate::Not),
        (any::<bool>(), any::<bool>()).prop_map(|(constant, const_on_a)| Gate::Eq {
            constant,
            const_on_a
        }),
        (any::<bool>(), any::<bool>()).prop_map(|(constant, const_on_a)| Gate::Ne {
            constant,
            const_on_a
        }),
    ]
}

proptest! {
    #[test]
    fn test_polarity_is_inversion_parity(gates in prop::collection::vec(gate(), 0..=5)) {
        let mut builder = ModuleBuilder::new("top");
        let rst = builder.wire("rst", 1);
        let mut signal = rst.clone();
        for gate in &gates {
            signal = gate.build(&mut builder, &signal);
        }
        let module = builder.build();
        let sigmap = SigMap::new(&module);
        let tracer = SignalTracer::new(&module.cells, &sigmap);

        let inversions = gates.iter().filter(|g| g.inverts()).count();
        prop_assert_eq!(tracer.resolve(&signal, &rst), Some(inversions % 2 == 0));
    }

    #[test]
    fn test_unsupported_gate_breaks_the_chain(
        before in prop::collection::vec(gate(), 0..=2),
        after in prop::collection::vec(gate(), 0..=2),
    ) {
        let mut builder = ModuleBuilder::new("top");
        let rst = builder.wire("rst", 1);
        let mut signal = rst.clone();
        for gate in &before {
            signal = gate.build(&mut builder, &signal);
        }
        signal = builder.unary(CellKind::from_type_name("$dff"), &signal, 1);
        for gate in &after {
            signal = gate.build(&mut builder, &signal);
        }
        let module = builder.build();
        let sigmap = SigMap::new(&module);
        let tracer = SignalTracer::new(&module.cells, &sigmap);

        prop_assert_eq!(tracer.resolve(&signal, &rst), None);
    }
}
