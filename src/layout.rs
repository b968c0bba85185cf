//! Moment scheduling: assigns every wire a vertical line index and every
//! instruction a discrete time slot, producing a moment-ordered grid.
//!
//! This is a pure function of the circuit model and carries no rendering
//! concerns; the renderer consumes its output.

use std::collections::BTreeMap;

use crate::error::{DrawError, DrawResult};
use crate::model::{Circuit, Instruction, RegisterDecl, WireKey};

/// Wire key -> vertical line index, contiguous from 0 at the top.
pub type LineIndexMap = BTreeMap<WireKey, usize>;

/// Wire key -> highest occupied moment index, -1 while untouched.
pub type DepthMap = BTreeMap<WireKey, i64>;

/// Scheduler output: instructions grouped into time slices that touch
/// disjoint wires, plus the final per-wire depths.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    pub moments: Vec<Vec<Instruction>>,
    pub depths: DepthMap,
}

impl Schedule {
    pub fn n_moments(&self) -> usize {
        self.moments.len()
    }
}

/// Assigns every wire its vertical position.
///
/// Classical registers come first in declaration order, one whole-register
/// line each. Qubit registers follow in declaration order; within a register
/// of size `s` starting at line `L`, qubit `i` lands on line `L + (s - 1 - i)`
/// so that qubit 0 renders at the bottom of its block, matching conventional
/// circuit diagrams.
pub fn build_line_index_map(circuit: &Circuit) -> DrawResult<LineIndexMap> {
    let mut lines = LineIndexMap::new();
    let mut next = 0usize;

    for reg in &circuit.classical_registers {
        checked_size(reg)?;
        lines.insert(WireKey::reg(&reg.name), next);
        next += 1;
    }

    for reg in &circuit.qubit_registers {
        let size = checked_size(reg)?;
        for i in 0..size {
            lines.insert(WireKey::bit(&reg.name, i as u32), next + (size - 1 - i));
        }
        next += size;
    }

    Ok(lines)
}

fn checked_size(reg: &RegisterDecl) -> DrawResult<usize> {
    if reg.size <= 0 {
        return Err(DrawError::configuration(format!(
            "register '{}' has non-positive size {}",
            reg.name, reg.size
        )));
    }
    Ok(reg.size as usize)
}

/// Greedy as-early-as-possible list scheduling.
///
/// Each instruction lands at `1 + max(depth)` over its operand wires and
/// advances all of them to that depth, so no two instructions sharing a wire
/// ever occupy the same moment and program order survives as a partial order
/// on every wire. Barriers use the same rule, which makes them a
/// synchronization point across all of their operands.
pub fn schedule(instructions: &[Instruction], lines: &LineIndexMap) -> DrawResult<Schedule> {
    let mut depths: DepthMap = lines.keys().map(|key| (key.clone(), -1)).collect();
    let mut moments: Vec<Vec<Instruction>> = Vec::new();

    for instruction in instructions {
        let operands = instruction.operands();
        if operands.is_empty() {
            return Err(DrawError::configuration(
                "instruction has no operand wires, its depth is undefined",
            ));
        }

        let mut required = -1i64;
        for key in operands {
            let depth = depths
                .get(key)
                .copied()
                .ok_or_else(|| DrawError::UnknownWire(key.to_string()))?;
            required = required.max(depth);
        }

        let depth = required + 1;
        for key in operands {
            depths.insert(key.clone(), depth);
        }

        let slot = depth as usize;
        if slot >= moments.len() {
            moments.resize_with(slot + 1, Vec::new);
        }
        moments[slot].push(instruction.clone());
    }

    Ok(Schedule { moments, depths })
}
