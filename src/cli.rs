use crate::model::Circuit;
use crate::render::write_output_svg;
use crate::theme::Theme;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "qvis", version, about = "Quantum circuit timeline renderer (circuit model to SVG)")]
pub struct Args {
    /// Input circuit file (JSON/JSON5) or '-' for stdin
    pub input: Option<PathBuf>,

    /// Theme name (default, night) or theme JSON file
    #[arg(short = 't', long = "theme")]
    pub theme: Option<String>,

    /// Output SVG file. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

pub fn run() -> Result<()> {
    let args = Args::parse();

    let input = read_input(args.input.as_deref())?;
    let circuit = parse_circuit(&input)?;
    let theme = match args.theme.as_deref() {
        Some(source) => Theme::load(source)?,
        None => Theme::default(),
    };

    let svg = crate::draw(&circuit, &theme)?;
    write_output_svg(&svg, args.output.as_deref())?;
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok(buf);
        }
        return std::fs::read_to_string(path)
            .with_context(|| format!("reading circuit from {}", path.display()));
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

/// Deserializes a circuit model document, accepting strict JSON with a JSON5
/// fallback for hand-written inputs.
pub fn parse_circuit(input: &str) -> Result<Circuit> {
    match serde_json::from_str(input) {
        Ok(circuit) => Ok(circuit),
        Err(json_err) => json5::from_str(input)
            .map_err(|_| anyhow::anyhow!("invalid circuit document: {json_err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Instruction, WireKey};

    #[test]
    fn parses_strict_json() {
        let circuit = parse_circuit(
            r#"{"qubit_registers": [{"name": "q", "size": 1}],
                "instructions": [{"kind": "gate", "name": "h", "operands": [{"register": "q", "index": 0}]}]}"#,
        )
        .unwrap();
        assert_eq!(circuit.instructions.len(), 1);
    }

    #[test]
    fn falls_back_to_json5() {
        // unquoted keys and a trailing comma
        let circuit = parse_circuit(
            "{qubit_registers: [{name: 'q', size: 2}],
              instructions: [{kind: 'measurement', operand: {register: 'q', index: 1}},]}",
        )
        .unwrap();
        assert_eq!(
            circuit.instructions[0],
            Instruction::Measurement {
                operand: WireKey::bit("q", 1)
            }
        );
    }

    #[test]
    fn reports_json_error_for_garbage() {
        let err = parse_circuit("not a circuit").unwrap_err();
        assert!(err.to_string().contains("invalid circuit document"));
    }
}
