use log::info;

use crate::ir::{Action, Process, SigBit, SigDisplay, SigSpec, TriggerKind, UpdateRule, Wire};

/// Appends a level-triggered rule on `reset` that loads the declared
/// initial value of every register assigned by the clocked rules of
/// `process`. Returns whether a rule was added.
pub(crate) fn inject_global_reset(
    wires: &[Wire],
    process: &mut Process,
    reset: &SigSpec,
    active_low: bool,
) -> bool {
    let actions = collect_init_actions(wires, process);
    for action in &actions {
        info!(
            "Added global reset to process {}: {} <- {}",
            process.name,
            SigDisplay::new(wires, &action.target),
            SigDisplay::new(wires, &action.value)
        );
    }
    if actions.is_empty() {
        return false;
    }

    process.rules.push(UpdateRule {
        trigger: TriggerKind::level(active_low),
        signal: reset.clone(),
        actions,
    });
    true
}

fn collect_init_actions(wires: &[Wire], process: &Process) -> Vec<Action> {
    let mut actions = Vec::new();
    for rule in process.rules.iter().filter(|rule| rule.trigger.is_edge()) {
        for action in &rule.actions {
            let mut target = SigSpec::new();
            let mut value = SigSpec::new();
            for bit in &action.target {
                let SigBit::Wire { wire, offset } = *bit else {
                    continue;
                };
                let info = &wires[wire.0];
                if let Some(init) = &info.init {
                    target.push(*bit);
                    value.push(init.extend_u0(info.width).bits()[offset]);
                }
            }
            if !target.is_empty() {
                actions.push(Action::new(target, value));
            }
        }
    }
    actions
}
