use log::{debug, info, trace};

use crate::ir::{
    CaseRule, Design, Module, Process, ProcessDisplay, SigDisplay, SigSpec, UpdateRule, Wire,
};
use crate::{ArstError, ArstOptions, DesignPass, SigMap};

mod global;
mod propagate;
mod prune;
mod tracer;

pub use propagate::{ConstPropagator, MAX_ITERATIONS, PropagationError, Resolved};
pub use prune::{TreePruner, clean_case};
pub use tracer::SignalTracer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionKind {
    /// The process has a single update rule whose trigger is also the
    /// dispatch condition of its decision tree.
    EdgeTrigger,
    /// An edge-triggered reset next to other update rules.
    AsyncReset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub module: String,
    pub process: String,
    pub trigger: String,
    pub kind: ConversionKind,
    /// Value of the dispatch signal while the reset is asserted.
    pub polarity: bool,
    /// Largest number of descents any action of the rule needed.
    pub iterations: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArstReport {
    pub conversions: Vec<Conversion>,
    pub global_resets: usize,
}

/// Converts edge-triggered update rules that the decision tree treats as
/// a reset into level-triggered rules with constant values.
#[derive(Debug, Clone, Default)]
pub struct ArstPass {
    options: ArstOptions,
}

impl ArstPass {
    pub fn new(options: ArstOptions) -> Self {
        Self { options }
    }

    pub fn execute(&self, design: &mut Design) -> Result<ArstReport, ArstError> {
        let mut report = ArstReport::default();
        for module in &mut design.modules {
            self.run_module(module, &mut report)?;
        }
        Ok(report)
    }

    fn run_module(&self, module: &mut Module, report: &mut ArstReport) -> Result<(), ArstError> {
        let sigmap = SigMap::new(module);
        let global_reset = self.options.global_reset.as_ref().and_then(|global| {
            module
                .wire_by_name(&global.net)
                .map(|id| (module.sig(id), global.active_low))
        });

        let Module {
            name,
            wires,
            cells,
            processes,
            ..
        } = module;
        let wires: &[Wire] = wires;
        let tracer = SignalTracer::new(cells, &sigmap);
        let lifter = ProcessLifter {
            module: name.as_str(),
            wires,
            tracer: &tracer,
            sigmap: &sigmap,
        };

        for process in processes.iter_mut() {
            lifter.run(process, report)?;
            if let Some((reset, active_low)) = &global_reset
                && global::inject_global_reset(wires, process, reset, *active_low)
            {
                report.global_resets += 1;
            }
        }
        Ok(())
    }
}

impl DesignPass for ArstPass {
    fn name(&self) -> &'static str {
        "arst"
    }

    fn run(&self, design: &mut Design) -> Result<(), ArstError> {
        self.execute(design).map(|_| ())
    }
}

/// The switch whose controlling signal dispatches the process.
///
/// The root case must hold exactly one switch. Transparent switches (one
/// case that is always taken) are looked through as long as their case
/// again holds exactly one switch.
pub fn dispatch_signal(root: &CaseRule) -> Option<&SigSpec> {
    let [first] = root.switches.as_slice() else {
        return None;
    };
    let mut switch = first;
    while switch.is_transparent() {
        let [inner] = switch.cases[0].switches.as_slice() else {
            return None;
        };
        switch = inner;
    }
    Some(&switch.signal)
}

struct ProcessLifter<'a> {
    module: &'a str,
    wires: &'a [Wire],
    tracer: &'a SignalTracer<'a>,
    sigmap: &'a SigMap,
}

impl ProcessLifter<'_> {
    fn run(&self, process: &mut Process, report: &mut ArstReport) -> Result<(), ArstError> {
        // Each conversion retypes one edge rule, so this terminates.
        loop {
            let Some(dispatch) = dispatch_signal(&process.root).cloned() else {
                debug!(
                    "Process `{}.{}` has no single dispatch switch",
                    self.module, process.name
                );
                return Ok(());
            };
            let Some((index, polarity)) = self.find_candidate(&dispatch, &process.rules) else {
                return Ok(());
            };
            let conversion = self.convert(process, index, &dispatch, polarity)?;
            report.conversions.push(conversion);
        }
    }

    /// First edge rule whose trigger the dispatch signal follows, with the
    /// dispatch value that asserts it.
    fn find_candidate(&self, dispatch: &SigSpec, rules: &[UpdateRule]) -> Option<(usize, bool)> {
        rules.iter().enumerate().find_map(|(index, rule)| {
            let active = rule.trigger.edge_polarity()?;
            let same = self.tracer.resolve(dispatch, &rule.signal)?;
            Some((index, active == same))
        })
    }

    fn convert(
        &self,
        process: &mut Process,
        index: usize,
        dispatch: &SigSpec,
        polarity: bool,
    ) -> Result<Conversion, ArstError> {
        let kind = if process.rules.len() == 1 {
            ConversionKind::EdgeTrigger
        } else {
            ConversionKind::AsyncReset
        };
        let rule = &process.rules[index];
        let trigger = self.display(&rule.signal).to_string();
        match kind {
            ConversionKind::EdgeTrigger => info!(
                "Found edge-trigger {} in `{}.{}`",
                trigger, self.module, process.name
            ),
            ConversionKind::AsyncReset => info!(
                "Found async reset {} in `{}.{}`",
                trigger, self.module, process.name
            ),
        }

        // The rule is only touched once every value has resolved.
        let propagator = ConstPropagator::new(self.tracer, self.sigmap, dispatch, polarity);
        let mut iterations = 0;
        let mut values = Vec::with_capacity(rule.actions.len());
        for action in &rule.actions {
            let resolved = propagator
                .resolve(&process.root, &action.value)
                .map_err(|err| self.error(err, &process.name, &trigger, &action.target))?;
            debug!(
                "{} <- {} after {} iteration(s)",
                self.display(&action.target),
                self.display(&resolved.value),
                resolved.iterations
            );
            iterations = iterations.max(resolved.iterations);
            values.push(resolved.value);
        }

        let rule = &mut process.rules[index];
        rule.trigger = rule.trigger.to_level();
        for (action, value) in rule.actions.iter_mut().zip(values) {
            action.value = value;
        }

        let before = process.root.node_count();
        let simplified = TreePruner::new(self.tracer, dispatch, polarity).prune(&mut process.root);
        debug!(
            "Pruned `{}.{}`: {} -> {} nodes ({} simplifications)",
            self.module,
            process.name,
            before,
            process.root.node_count(),
            simplified
        );
        trace!("{}", ProcessDisplay::new(self.wires, process));

        Ok(Conversion {
            module: self.module.to_string(),
            process: process.name.clone(),
            trigger,
            kind,
            polarity,
            iterations,
        })
    }

    fn display<'b>(&'b self, sig: &'b SigSpec) -> SigDisplay<'b> {
        SigDisplay::new(self.wires, sig)
    }

    fn error(
        &self,
        err: PropagationError,
        process: &str,
        trigger: &str,
        target: &SigSpec,
    ) -> ArstError {
        let module = self.module.to_string();
        let process = process.to_string();
        let trigger = trigger.to_string();
        let target = self.display(target).to_string();
        match err {
            PropagationError::NonConvergent { value, iterations } => ArstError::NonConvergent {
                module,
                process,
                trigger,
                target,
                value: self.display(&value).to_string(),
                iterations,
            },
            PropagationError::NonConstant { value, .. } => ArstError::NonConstant {
                module,
                process,
                trigger,
                target,
                value: self.display(&value).to_string(),
            },
        }
    }
}
