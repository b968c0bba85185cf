use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one horizontal timeline in the diagram.
///
/// Either a single qubit/classical bit inside a sized register, or a whole
/// classical register drawn as a single line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireKey {
    Bit { register: String, index: u32 },
    Reg { register: String },
}

impl WireKey {
    pub fn bit(register: impl Into<String>, index: u32) -> Self {
        Self::Bit {
            register: register.into(),
            index,
        }
    }

    pub fn reg(register: impl Into<String>) -> Self {
        Self::Reg {
            register: register.into(),
        }
    }

    /// Diagram label: `q[3]` for bits, the bare register name otherwise.
    pub fn label(&self) -> String {
        match self {
            Self::Bit { register, index } => format!("{register}[{index}]"),
            Self::Reg { register } => register.clone(),
        }
    }
}

impl fmt::Display for WireKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// A register declaration from the circuit model provider.
///
/// Sizes are carried signed so that malformed declarations survive
/// deserialization and are rejected by the scheduler instead of panicking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterDecl {
    pub name: String,
    /// Declared register width; implicit size 1 when the provider omits it.
    #[serde(default = "implicit_register_size")]
    pub size: i64,
}

fn implicit_register_size() -> i64 {
    1
}

impl RegisterDecl {
    pub fn new(name: impl Into<String>, size: i64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// One statement from the circuit model provider that participates in
/// scheduling. Declaration-like statements never reach this contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Instruction {
    Gate {
        name: String,
        operands: Vec<WireKey>,
    },
    Measurement {
        operand: WireKey,
    },
    Barrier {
        operands: Vec<WireKey>,
    },
}

impl Instruction {
    /// The wires this instruction touches, in operand order.
    pub fn operands(&self) -> &[WireKey] {
        match self {
            Self::Gate { operands, .. } | Self::Barrier { operands } => operands,
            Self::Measurement { operand } => std::slice::from_ref(operand),
        }
    }
}

/// The circuit model consumed by the scheduler and renderer: ordered register
/// declarations plus an ordered instruction list. Parsing and semantic
/// validation of any textual circuit grammar happen upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    #[serde(default)]
    pub classical_registers: Vec<RegisterDecl>,
    #[serde(default)]
    pub qubit_registers: Vec<RegisterDecl>,
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}
