use crate::arst::SignalTracer;
use crate::ir::{CaseRule, SigSpec, SwitchRule};

/// Removes the branches taken while the reference signal is pinned to
/// `polarity` from a decision tree, then compacts the tree.
pub struct TreePruner<'a> {
    tracer: &'a SignalTracer<'a>,
    reference: &'a SigSpec,
    polarity: bool,
}

impl<'a> TreePruner<'a> {
    pub fn new(tracer: &'a SignalTracer<'a>, reference: &'a SigSpec, polarity: bool) -> Self {
        Self {
            tracer,
            reference,
            polarity,
        }
    }

    /// Returns the number of removed or simplified nodes.
    pub fn prune(&self, case: &mut CaseRule) -> usize {
        let mut count = 0;
        for switch in &mut case.switches {
            match self.tracer.resolve(&switch.signal, self.reference) {
                Some(same) => count += self.eliminate(switch, self.polarity == same),
                None => {
                    for case in &mut switch.cases {
                        count += self.prune(case);
                    }
                }
            }
        }
        count + clean_case(case, 1)
    }

    /// Drops every case selected by `asserted`; the first other case
    /// becomes unconditional and all later ones are unreachable.
    fn eliminate(&self, switch: &mut SwitchRule, asserted: bool) -> usize {
        let asserted = SigSpec::from_bool(asserted);
        let before = switch.cases.len();
        let mut found_remaining = false;
        switch.cases.retain_mut(|case| {
            if case.selects(&asserted) || found_remaining {
                return false;
            }
            found_remaining = true;
            case.compare.clear();
            true
        });
        switch.signal = SigSpec::new();
        before - switch.cases.len() + 1
    }
}

/// Simplifies the switches of `case` until nothing changes. `max_depth`
/// limits how many case levels below `case` are visited.
pub fn clean_case(case: &mut CaseRule, max_depth: usize) -> usize {
    let mut total = 0;
    loop {
        let count = clean_case_once(case, max_depth);
        if count == 0 {
            return total;
        }
        total += count;
    }
}

fn clean_case_once(case: &mut CaseRule, max_depth: usize) -> usize {
    let mut count = 0;
    let mut i = 0;
    while i < case.switches.len() {
        if case.switches[i].cases.is_empty() {
            case.switches.remove(i);
            count += 1;
            continue;
        }

        count += resolve_const_switch(&mut case.switches[i]);
        if case.switches[i].cases.is_empty() {
            continue;
        }

        let switch = &case.switches[i];
        // Hoisting actions above an earlier sibling switch would reorder
        // writes.
        if switch.is_transparent() && (i == 0 || switch.cases[0].actions.is_empty()) {
            let mut switch = case.switches.remove(i);
            if let Some(inner) = switch.cases.pop() {
                case.actions.extend(inner.actions);
                case.switches.splice(i..i, inner.switches);
            }
            count += 1;
            continue;
        }

        let switch = &mut case.switches[i];
        if max_depth > 1 {
            for inner in &mut switch.cases {
                count += clean_case_once(inner, max_depth - 1);
            }
        }
        while switch.cases.last().is_some_and(CaseRule::is_empty) {
            switch.cases.pop();
            count += 1;
        }
        i += 1;
    }
    count
}

/// Folds a switch on a fully defined constant down to the case it selects.
fn resolve_const_switch(switch: &mut SwitchRule) -> usize {
    if switch.signal.is_empty() || !switch.signal.is_fully_def() {
        return 0;
    }

    let mut selected = None;
    for (index, case) in switch.cases.iter().enumerate() {
        if case.is_default() || case.selects(&switch.signal) {
            selected = Some(index);
            break;
        }
        if !case.compare.iter().all(SigSpec::is_fully_def) {
            return 0;
        }
    }

    let before = switch.cases.len();
    match selected {
        Some(index) => {
            switch.cases.truncate(index + 1);
            switch.cases.drain(..index);
            switch.cases[0].compare.clear();
        }
        None => switch.cases.clear(),
    }
    switch.signal = SigSpec::new();
    before - switch.cases.len() + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SigMap;
    use crate::ir::{ModuleBuilder, State};

    fn one() -> SigSpec {
        SigSpec::from_bool(true)
    }

    fn zero() -> SigSpec {
        SigSpec::from_bool(false)
    }

    #[test]
    fn test_prune_keeps_deasserted_branch() {
        let mut builder = ModuleBuilder::new("top");
        let rst = builder.wire("rst", 1);
        let en = builder.wire("en", 1);
        let q = builder.wire("q", 1);
        let (a, b, d) = (
            builder.wire("a", 1),
            builder.wire("b", 1),
            builder.wire("d", 1),
        );
        let module = builder.build();
        let sigmap = SigMap::new(&module);
        let tracer = SignalTracer::new(&module.cells, &sigmap);

        let other = SwitchRule::new(en)
            .with_case(CaseRule::matching(one()).with_action(q.clone(), a))
            .with_case(CaseRule::new().with_action(q.clone(), b));
        let mut root = CaseRule::new().with_switch(other.clone()).with_switch(
            SwitchRule::new(rst.clone())
                .with_case(CaseRule::matching(zero()).with_action(q.clone(), d.clone()))
                .with_case(CaseRule::new().with_action(q.clone(), zero())),
        );

        TreePruner::new(&tracer, &rst, true).prune(&mut root);

        assert_eq!(root.switches.len(), 2);
        assert_eq!(root.switches[0], other);
        let pruned = &root.switches[1];
        assert!(pruned.signal.is_empty());
        assert_eq!(pruned.cases.len(), 1);
        assert!(pruned.cases[0].compare.is_empty());
        assert_eq!(pruned.cases[0].actions[0].value, d);
    }

    #[test]
    fn test_prune_inlines_first_switch() {
        let mut builder = ModuleBuilder::new("top");
        let rst = builder.wire("rst", 1);
        let rst_n = builder.logic_not(&rst);
        let q = builder.wire("q", 4);
        let d = builder.wire("d", 4);
        let module = builder.build();
        let sigmap = SigMap::new(&module);
        let tracer = SignalTracer::new(&module.cells, &sigmap);

        // if (!rst) q = d; else q = 0;  reset asserted while rst is high.
        let mut root = CaseRule::new().with_switch(
            SwitchRule::new(rst_n)
                .with_case(CaseRule::matching(one()).with_action(q.clone(), d.clone()))
                .with_case(CaseRule::new().with_action(q.clone(), SigSpec::from_uint(0, 4))),
        );

        let count = TreePruner::new(&tracer, &rst, true).prune(&mut root);

        assert!(count > 0);
        assert!(root.switches.is_empty());
        assert_eq!(root.actions.len(), 1);
        assert_eq!(root.actions[0].target, q);
        assert_eq!(root.actions[0].value, d);
    }

    #[test]
    fn test_prune_removes_switch_without_remaining_path() {
        let mut builder = ModuleBuilder::new("top");
        let rst = builder.wire("rst", 1);
        let q = builder.wire("q", 1);
        let module = builder.build();
        let sigmap = SigMap::new(&module);
        let tracer = SignalTracer::new(&module.cells, &sigmap);

        // if (rst) q = 0;
        let mut root = CaseRule::new().with_switch(
            SwitchRule::new(rst.clone())
                .with_case(CaseRule::matching(one()).with_action(q, zero())),
        );
        TreePruner::new(&tracer, &rst, true).prune(&mut root);

        assert!(root.is_empty());
    }

    #[test]
    fn test_prune_recurses_into_unrelated_switches() {
        let mut builder = ModuleBuilder::new("top");
        let rst = builder.wire("rst", 1);
        let en = builder.wire("en", 1);
        let q = builder.wire("q", 1);
        let d = builder.wire("d", 1);
        let module = builder.build();
        let sigmap = SigMap::new(&module);
        let tracer = SignalTracer::new(&module.cells, &sigmap);

        let mut root = CaseRule::new().with_switch(
            SwitchRule::new(en.clone()).with_case(
                CaseRule::matching(one()).with_switch(
                    SwitchRule::new(rst.clone())
                        .with_case(CaseRule::matching(one()).with_action(q.clone(), zero()))
                        .with_case(CaseRule::new().with_action(q.clone(), d.clone())),
                ),
            ),
        );
        TreePruner::new(&tracer, &rst, true).prune(&mut root);

        let expected = CaseRule::new().with_switch(
            SwitchRule::new(en)
                .with_case(CaseRule::matching(one()).with_action(q, d)),
        );
        assert_eq!(root, expected);
    }

    #[test]
    fn test_clean_keeps_action_order_behind_earlier_switch() {
        let mut builder = ModuleBuilder::new("top");
        let en = builder.wire("en", 1);
        let q = builder.wire("q", 1);

        let mut root = CaseRule::new()
            .with_switch(
                SwitchRule::new(en).with_case(CaseRule::matching(one()).with_action(q.clone(), one())),
            )
            .with_switch(
                SwitchRule::new(SigSpec::new())
                    .with_case(CaseRule::new().with_action(q.clone(), zero())),
            );
        let expected = root.clone();

        assert_eq!(clean_case(&mut root, 1), 0);
        assert_eq!(root, expected);
    }

    #[test]
    fn test_clean_splices_nested_switches_in_place() {
        let mut builder = ModuleBuilder::new("top");
        let (a, b, c) = (
            builder.wire("a", 1),
            builder.wire("b", 1),
            builder.wire("c", 1),
        );
        let q = builder.wire("q", 1);
        let inner = |sel: &SigSpec| {
            SwitchRule::new(sel.clone())
                .with_case(CaseRule::matching(one()).with_action(q.clone(), one()))
        };

        let mut root = CaseRule::new()
            .with_switch(inner(&a))
            .with_switch(
                SwitchRule::new(SigSpec::new())
                    .with_case(CaseRule::new().with_switch(inner(&b))),
            )
            .with_switch(inner(&c));

        assert_eq!(clean_case(&mut root, 1), 1);
        let signals: Vec<_> = root.switches.iter().map(|sw| sw.signal.clone()).collect();
        assert_eq!(signals, vec![a, b, c]);
    }

    #[test]
    fn test_clean_resolves_constant_switch() {
        let mut builder = ModuleBuilder::new("top");
        let q = builder.wire("q", 1);

        let mut root = CaseRule::new().with_switch(
            SwitchRule::new(SigSpec::from_uint(0b10, 2))
                .with_case(CaseRule::matching(SigSpec::from_uint(0b01, 2)).with_action(q.clone(), zero()))
                .with_case(CaseRule::matching(SigSpec::from_uint(0b10, 2)).with_action(q.clone(), one()))
                .with_case(CaseRule::new().with_action(q.clone(), zero())),
        );

        assert!(clean_case(&mut root, 1) > 0);
        assert!(root.switches.is_empty());
        assert_eq!(root.actions.len(), 1);
        assert_eq!(root.actions[0].value, one());
    }

    #[test]
    fn test_clean_leaves_undecidable_constant_switch() {
        let mut builder = ModuleBuilder::new("top");
        let q = builder.wire("q", 1);

        let mut root = CaseRule::new()
            .with_action(q.clone(), zero())
            .with_switch(
                SwitchRule::new(SigSpec::from_uint(1, 1))
                    .with_case(
                        CaseRule::matching(SigSpec::constant(State::Undef, 1))
                            .with_action(q.clone(), one()),
                    )
                    .with_case(CaseRule::matching(one()).with_action(q, zero())),
            );
        let expected = root.clone();

        assert_eq!(clean_case(&mut root, 1), 0);
        assert_eq!(root, expected);
    }

    #[test]
    fn test_clean_drops_trailing_empty_cases() {
        let mut builder = ModuleBuilder::new("top");
        let en = builder.wire("en", 2);
        let q = builder.wire("q", 1);

        let mut root = CaseRule::new().with_switch(
            SwitchRule::new(en)
                .with_case(CaseRule::matching(SigSpec::from_uint(0, 2)))
                .with_case(CaseRule::matching(SigSpec::from_uint(1, 2)).with_action(q, one()))
                .with_case(CaseRule::matching(SigSpec::from_uint(2, 2)))
                .with_case(CaseRule::new()),
        );

        assert_eq!(clean_case(&mut root, 1), 2);
        assert_eq!(root.switches[0].cases.len(), 2);
        assert!(root.switches[0].cases[0].is_empty());
    }
}
