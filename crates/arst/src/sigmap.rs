use crate::HashMap;
use crate::ir::{Module, SigBit, SigSpec};

/// Canonicalizes wire bits through the module-level `assign lhs = rhs;`
/// connections: every driven bit maps to the bit at the end of its driver
/// chain.
#[derive(Debug, Clone, Default)]
pub struct SigMap {
    map: HashMap<SigBit, SigBit>,
}

impl SigMap {
    pub fn new(module: &Module) -> Self {
        Self::from_connections(&module.connections)
    }

    pub fn from_connections(connections: &[(SigSpec, SigSpec)]) -> Self {
        let mut direct: HashMap<SigBit, SigBit> = HashMap::default();
        for (lhs, rhs) in connections {
            for (l, r) in lhs.iter().zip(rhs) {
                if l.is_wire() && l != r {
                    direct.entry(*l).or_insert(*r);
                }
            }
        }

        // Chains longer than the number of connections are loops; they stop
        // at whatever bit was reached.
        let limit = direct.len();
        let map = direct
            .keys()
            .map(|&bit| {
                let mut current = bit;
                for _ in 0..limit {
                    match direct.get(&current) {
                        Some(next) => current = *next,
                        None => break,
                    }
                }
                (bit, current)
            })
            .collect();
        Self { map }
    }

    pub fn apply_bit(&self, bit: SigBit) -> SigBit {
        self.map.get(&bit).copied().unwrap_or(bit)
    }

    pub fn apply(&self, sig: &mut SigSpec) {
        if !self.map.is_empty() {
            sig.map_bits(|bit| self.apply_bit(bit));
        }
    }

    pub fn map(&self, sig: &SigSpec) -> SigSpec {
        let mut sig = sig.clone();
        self.apply(&mut sig);
        sig
    }
}
