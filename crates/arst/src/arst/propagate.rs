use crate::SigMap;
use crate::arst::SignalTracer;
use crate::ir::{CaseRule, SigBit, SigSpec, State};

/// Upper bound on the number of descents through the decision tree.
pub const MAX_ITERATIONS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub value: SigSpec,
    pub iterations: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropagationError {
    NonConvergent { value: SigSpec, iterations: usize },
    NonConstant { value: SigSpec, iterations: usize },
}

/// Computes the value an expression takes while the reference signal is
/// pinned to `polarity`.
pub struct ConstPropagator<'a> {
    tracer: &'a SignalTracer<'a>,
    sigmap: &'a SigMap,
    reference: &'a SigSpec,
    polarity: bool,
}

impl<'a> ConstPropagator<'a> {
    pub fn new(
        tracer: &'a SignalTracer<'a>,
        sigmap: &'a SigMap,
        reference: &'a SigSpec,
        polarity: bool,
    ) -> Self {
        Self {
            tracer,
            sigmap,
            reference,
            polarity,
        }
    }

    pub fn resolve(&self, root: &CaseRule, value: &SigSpec) -> Result<Resolved, PropagationError> {
        let mut acc: SigSpec = value
            .iter()
            .map(|bit| {
                if bit.is_const() {
                    *bit
                } else {
                    SigBit::Const(State::Marker)
                }
            })
            .collect();
        let mut source = value.clone();

        for iteration in 1..=MAX_ITERATIONS {
            let last = acc.clone();
            self.apply(root, &source, &mut acc, false);
            self.sigmap.apply(&mut acc);

            if acc.is_fully_const() || acc == last {
                if acc.has_marked_bits() {
                    return Err(PropagationError::NonConstant {
                        value: acc,
                        iterations: iteration,
                    });
                }
                return Ok(Resolved {
                    value: acc,
                    iterations: iteration,
                });
            }
            source = acc.clone();
        }

        Err(PropagationError::NonConvergent {
            value: acc,
            iterations: MAX_ITERATIONS,
        })
    }

    /// One descent. Writes below a switch that does not depend on the
    /// reference cannot be attributed to a branch and mark their bits.
    fn apply(&self, case: &CaseRule, source: &SigSpec, acc: &mut SigSpec, unresolved: bool) {
        for action in &case.actions {
            if unresolved {
                let marker = SigSpec::constant(State::Marker, action.value.width());
                source.replace(&action.target, &marker, acc);
            } else {
                source.replace(&action.target, &action.value, acc);
            }
        }

        for switch in &case.switches {
            if switch.signal.is_empty() {
                let taken = switch.default_case().or(switch.cases.first());
                if let Some(taken) = taken {
                    self.apply(taken, source, acc, unresolved);
                }
                continue;
            }

            match self.tracer.resolve(&switch.signal, self.reference) {
                Some(same) => {
                    let pattern = SigSpec::from_bool(self.polarity == same);
                    let taken = switch
                        .cases
                        .iter()
                        .find(|c| c.is_default() || c.selects(&pattern));
                    if let Some(taken) = taken {
                        self.apply(taken, source, acc, unresolved);
                    }
                }
                None => {
                    for case in &switch.cases {
                        self.apply(case, source, acc, true);
                    }
                }
            }
        }
    }
}
