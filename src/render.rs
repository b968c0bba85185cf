//! Converts the moment grid, line-index map and resolved theme into an SVG
//! document string.
//!
//! Coordinates: line `i` sits at `y = padding + i * line_spacing`; the first
//! moment's gate centers at `x = padding + label_offset + gate_width / 2` and
//! every following moment advances by `gate_width + gate_spacing`.

use anyhow::Result;
use std::f64::consts::TAU;
use std::path::Path;

use crate::error::{DrawError, DrawResult};
use crate::layout::{LineIndexMap, Schedule};
use crate::model::{Instruction, WireKey};
use crate::theme::{GateConfig, Substitution, Theme};

// Gap between the right edge of a wire label and the wire start.
const LABEL_GAP: f64 = 10.0;
const GATE_LABEL_FONT: &str = "sans-serif";
const GATE_LABEL_SIZE: f64 = 12.0;

/// Canvas geometry resolved once per render.
struct Frame {
    gate_width: f64,
    gate_height: f64,
    gate_spacing: f64,
    line_spacing: f64,
    padding: f64,
    label_offset: f64,
    width: f64,
    height: f64,
}

impl Frame {
    fn resolve(theme: &Theme, n_moments: usize, n_lines: usize) -> DrawResult<Self> {
        let gate_width = theme.dimension("gate_width")?;
        let gate_height = theme.dimension("gate_height")?;
        let gate_spacing = theme.dimension("gate_spacing")?;
        let line_spacing = theme.dimension("line_spacing")?;
        let padding = theme.dimension("padding")?;
        let label_offset = theme.dimension("label_offset")?;

        let width =
            padding * 2.0 + n_moments as f64 * (gate_width + gate_spacing) + label_offset * 2.0;
        let height = n_lines as f64 * line_spacing + 2.0 * padding;

        Ok(Self {
            gate_width,
            gate_height,
            gate_spacing,
            line_spacing,
            padding,
            label_offset,
            width,
            height,
        })
    }

    fn wire_y(&self, line: usize) -> f64 {
        self.padding + line as f64 * self.line_spacing
    }

    fn wire_x_start(&self) -> f64 {
        self.padding + self.label_offset
    }

    fn first_moment_x(&self) -> f64 {
        self.padding + self.label_offset + self.gate_width / 2.0
    }
}

/// Resolved `styles.wire` configuration.
struct WireStyle {
    stroke: String,
    stroke_width: f64,
    wave: Option<WaveParams>,
}

struct WaveParams {
    amplitude: f64,
    wavelength: f64,
    points_per_wavelength: f64,
}

impl WireStyle {
    fn resolve(theme: &Theme) -> DrawResult<Self> {
        let stroke = theme.style_field_str("wire", "stroke")?.to_string();
        let stroke_width = theme.style_field_f64("wire", "stroke_width")?;
        let wave = match theme.style_field_str("wire", "style")? {
            "wave" => Some(WaveParams {
                amplitude: theme.style_field_f64("wire", "amplitude")?,
                wavelength: theme.style_field_f64("wire", "wavelength")?,
                points_per_wavelength: theme.style_field_f64("wire", "points_per_wavelength")?,
            }),
            _ => None,
        };
        Ok(Self {
            stroke,
            stroke_width,
            wave,
        })
    }
}

/// Renders the scheduled circuit into a standalone SVG document.
///
/// All theme lookups are strict; on any failure the partial document is
/// discarded and only the error escapes.
pub fn render_svg(
    schedule: &Schedule,
    lines: &LineIndexMap,
    theme: &Theme,
) -> DrawResult<String> {
    let n_lines = lines.values().copied().max().map_or(0, |max| max + 1);
    let frame = Frame::resolve(theme, schedule.n_moments(), n_lines)?;
    let wire_style = WireStyle::resolve(theme)?;

    let mut svg = String::new();
    let (width, height) = (frame.width, frame.height);
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));

    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.style_str("background")?
    ));

    draw_wire_labels(&mut svg, lines, theme, &frame)?;
    draw_wires(&mut svg, lines, &wire_style, &frame);

    let mut x = frame.first_moment_x();
    for moment in &schedule.moments {
        for instruction in moment {
            draw_instruction(&mut svg, instruction, x, lines, theme, &wire_style, &frame)?;
        }
        x += frame.gate_width + frame.gate_spacing;
    }

    svg.push_str("</svg>");
    Ok(svg)
}

fn draw_wire_labels(
    svg: &mut String,
    lines: &LineIndexMap,
    theme: &Theme,
    frame: &Frame,
) -> DrawResult<()> {
    let text_color = theme.style_str("text")?;
    let family = theme.style_field_str("label_font", "family")?;
    let size = theme.style_field_f64("label_font", "size")?;
    let x = frame.padding + frame.label_offset - LABEL_GAP;

    for (key, &line) in lines {
        let y = frame.wire_y(line);
        svg.push_str(&format!(
            "<text x=\"{x}\" y=\"{y}\" fill=\"{text_color}\" font-family=\"{family}\" font-size=\"{size}\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>",
            escape_xml(&key.label())
        ));
    }
    Ok(())
}

fn draw_wires(svg: &mut String, lines: &LineIndexMap, wire: &WireStyle, frame: &Frame) {
    let x1 = frame.wire_x_start();
    let x2 = frame.width - frame.padding;

    for &line in lines.values() {
        let y = frame.wire_y(line);
        match &wire.wave {
            Some(wave) => {
                let d = wave_path(x1, x2, y, wave);
                svg.push_str(&format!(
                    "<path d=\"{d}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"/>",
                    wire.stroke, wire.stroke_width
                ));
            }
            None => {
                svg.push_str(&format!(
                    "<line x1=\"{x1}\" y1=\"{y}\" x2=\"{x2}\" y2=\"{y}\" stroke=\"{}\" stroke-width=\"{}\"/>",
                    wire.stroke, wire.stroke_width
                ));
            }
        }
    }
}

/// Deterministic sine sampling at a fixed per-wavelength density, rendered as
/// a polyline approximation along the wire.
fn wave_path(x1: f64, x2: f64, y: f64, wave: &WaveParams) -> String {
    let span = x2 - x1;
    let wavelength = wave.wavelength.max(1.0);
    let density = wave.points_per_wavelength.max(2.0);
    let samples = ((span / wavelength) * density).ceil().max(1.0) as usize;

    let mut d = String::new();
    for i in 0..=samples {
        let t = i as f64 / samples as f64;
        let x = x1 + span * t;
        let offset = wave.amplitude * (TAU * span * t / wavelength).sin();
        if i == 0 {
            d.push_str(&format!("M {:.2} {:.2}", x, y + offset));
        } else {
            d.push_str(&format!(" L {:.2} {:.2}", x, y + offset));
        }
    }
    d
}

fn draw_instruction(
    svg: &mut String,
    instruction: &Instruction,
    x: f64,
    lines: &LineIndexMap,
    theme: &Theme,
    wire: &WireStyle,
    frame: &Frame,
) -> DrawResult<()> {
    match instruction {
        Instruction::Gate { name, operands } => {
            let gate_lines = operand_lines(operands, lines)?;
            let name = name.to_ascii_lowercase();

            if name == "cx" && gate_lines.len() == 2 {
                return draw_cx(svg, gate_lines[0], gate_lines[1], x, theme, wire, frame);
            }
            if name == "swap" && gate_lines.len() == 2 {
                return draw_swap(svg, gate_lines[0], gate_lines[1], x, theme, wire, frame);
            }

            let substitution = theme.substitution(&name);
            let config = theme.gate_config(&name)?;
            for &line in &gate_lines {
                let y = frame.wire_y(line);
                match &substitution {
                    Some(Substitution::Glyph(glyph)) => draw_glyph(svg, x, y, glyph, theme)?,
                    Some(Substitution::Image(href)) => draw_image(svg, x, y, href, frame),
                    Some(Substitution::Animated(effect)) => {
                        draw_animated_box(svg, x, y, &name, &config, effect, theme, frame)?;
                    }
                    None => draw_box(svg, x, y, &name, &config, theme, frame)?,
                }
            }
            Ok(())
        }
        Instruction::Measurement { operand } => {
            let line = operand_lines(std::slice::from_ref(operand), lines)?[0];
            let config = theme.gate_config("measurement")?;
            draw_box(svg, x, frame.wire_y(line), "m", &config, theme, frame)
        }
        Instruction::Barrier { operands } => {
            let barrier_lines = operand_lines(operands, lines)?;
            draw_barrier(svg, &barrier_lines, x, theme, frame)
        }
    }
}

fn operand_lines(operands: &[WireKey], lines: &LineIndexMap) -> DrawResult<Vec<usize>> {
    operands
        .iter()
        .map(|key| {
            lines
                .get(key)
                .copied()
                .ok_or_else(|| DrawError::UnknownWire(key.to_string()))
        })
        .collect()
}

fn draw_box(
    svg: &mut String,
    x: f64,
    y: f64,
    gate_name: &str,
    config: &GateConfig,
    theme: &Theme,
    frame: &Frame,
) -> DrawResult<()> {
    push_gate_rect(svg, x, y, config, frame, "");
    push_gate_label(svg, x, y, &config.label_for(gate_name), theme)
}

fn draw_animated_box(
    svg: &mut String,
    x: f64,
    y: f64,
    gate_name: &str,
    config: &GateConfig,
    effect: &str,
    theme: &Theme,
    frame: &Frame,
) -> DrawResult<()> {
    let animate = match effect {
        "pulse" => {
            "<animate attributeName=\"fill-opacity\" values=\"1;0.4;1\" dur=\"2s\" repeatCount=\"indefinite\"/>"
        }
        _ => "",
    };
    push_gate_rect(svg, x, y, config, frame, animate);
    push_gate_label(svg, x, y, &config.label_for(gate_name), theme)
}

fn push_gate_rect(
    svg: &mut String,
    x: f64,
    y: f64,
    config: &GateConfig,
    frame: &Frame,
    children: &str,
) {
    let rect_x = x - frame.gate_width / 2.0;
    let rect_y = y - frame.gate_height / 2.0;
    let attrs = format!(
        "x=\"{rect_x}\" y=\"{rect_y}\" width=\"{}\" height=\"{}\" fill=\"{}\" stroke=\"{}\" rx=\"{}\"",
        frame.gate_width, frame.gate_height, config.fill, config.stroke, config.radius
    );
    if children.is_empty() {
        svg.push_str(&format!("<rect {attrs}/>"));
    } else {
        svg.push_str(&format!("<rect {attrs}>{children}</rect>"));
    }
}

fn push_gate_label(svg: &mut String, x: f64, y: f64, label: &str, theme: &Theme) -> DrawResult<()> {
    svg.push_str(&format!(
        "<text x=\"{x}\" y=\"{y}\" fill=\"{}\" font-family=\"{GATE_LABEL_FONT}\" font-size=\"{GATE_LABEL_SIZE}\" text-anchor=\"middle\" dominant-baseline=\"middle\">{}</text>",
        theme.style_str("text")?,
        escape_xml(label)
    ));
    Ok(())
}

/// Inline symbol substitution. Iconographic: no label is drawn.
fn draw_glyph(svg: &mut String, x: f64, y: f64, glyph: &str, theme: &Theme) -> DrawResult<()> {
    let size = theme.dimension("glyph_size")?;
    svg.push_str(&format!(
        "<text x=\"{x}\" y=\"{y}\" font-size=\"{size}\" text-anchor=\"middle\" dominant-baseline=\"middle\">{}</text>",
        escape_xml(glyph)
    ));
    Ok(())
}

/// External image substitution drawn at gate-box size. No label.
fn draw_image(svg: &mut String, x: f64, y: f64, href: &str, frame: &Frame) {
    svg.push_str(&format!(
        "<image href=\"{}\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"/>",
        escape_xml(href),
        x - frame.gate_width / 2.0,
        y - frame.gate_height / 2.0,
        frame.gate_width,
        frame.gate_height
    ));
}

/// Controlled-not: vertical connector, filled control dot at the first
/// operand line, circled cross at the second.
fn draw_cx(
    svg: &mut String,
    ctrl_line: usize,
    target_line: usize,
    x: f64,
    theme: &Theme,
    wire: &WireStyle,
    frame: &Frame,
) -> DrawResult<()> {
    let dot_radius = theme.dimension("control_dot_radius")?;
    let plus_radius = theme.dimension("target_plus_radius")?;
    let y1 = frame.wire_y(ctrl_line);
    let y2 = frame.wire_y(target_line);
    let stroke = &wire.stroke;
    let stroke_width = wire.stroke_width;

    svg.push_str(&format!(
        "<line x1=\"{x}\" y1=\"{y1}\" x2=\"{x}\" y2=\"{y2}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\"/>"
    ));
    svg.push_str(&format!(
        "<circle cx=\"{x}\" cy=\"{y1}\" r=\"{dot_radius}\" fill=\"{stroke}\"/>"
    ));
    svg.push_str(&format!(
        "<circle cx=\"{x}\" cy=\"{y2}\" r=\"{plus_radius}\" fill=\"none\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\"/>"
    ));
    svg.push_str(&format!(
        "<line x1=\"{}\" y1=\"{y2}\" x2=\"{}\" y2=\"{y2}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\"/>",
        x - plus_radius,
        x + plus_radius
    ));
    svg.push_str(&format!(
        "<line x1=\"{x}\" y1=\"{}\" x2=\"{x}\" y2=\"{}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\"/>",
        y2 - plus_radius,
        y2 + plus_radius
    ));
    Ok(())
}

/// Swap: vertical connector with an X cross at both operand lines.
fn draw_swap(
    svg: &mut String,
    line_a: usize,
    line_b: usize,
    x: f64,
    theme: &Theme,
    wire: &WireStyle,
    frame: &Frame,
) -> DrawResult<()> {
    let size = theme.dimension("swap_size")?;
    let y1 = frame.wire_y(line_a);
    let y2 = frame.wire_y(line_b);
    let stroke = &wire.stroke;
    let stroke_width = wire.stroke_width;

    svg.push_str(&format!(
        "<line x1=\"{x}\" y1=\"{y1}\" x2=\"{x}\" y2=\"{y2}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\"/>"
    ));
    for y in [y1, y2] {
        svg.push_str(&format!(
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\"/>",
            x - size,
            y - size,
            x + size,
            y + size
        ));
        svg.push_str(&format!(
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\"/>",
            x - size,
            y + size,
            x + size,
            y - size
        ));
    }
    Ok(())
}

/// Vertical styled line spanning the barrier's operand lines, extended by
/// `barrier_padding` past both extremes. Nothing is drawn on the wires.
fn draw_barrier(
    svg: &mut String,
    barrier_lines: &[usize],
    x: f64,
    theme: &Theme,
    frame: &Frame,
) -> DrawResult<()> {
    let Some(&min_line) = barrier_lines.iter().min() else {
        return Ok(());
    };
    let max_line = *barrier_lines.iter().max().unwrap_or(&min_line);

    let barrier_padding = theme.dimension("barrier_padding")?;
    let stroke = theme.style_field_str("barrier", "stroke")?;
    let stroke_width = theme.style_field_f64("barrier", "stroke_width")?;
    let dasharray = theme.style_field_str("barrier", "dasharray")?;

    let y_min = frame.wire_y(min_line) - barrier_padding;
    let y_max = frame.wire_y(max_line) + barrier_padding;
    svg.push_str(&format!(
        "<line x1=\"{x}\" y1=\"{y_min}\" x2=\"{x}\" y2=\"{y_max}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\" stroke-dasharray=\"{dasharray}\"/>"
    ));
    Ok(())
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{build_line_index_map, schedule};
    use crate::model::{Circuit, RegisterDecl};
    use serde_json::json;

    fn bell_circuit() -> Circuit {
        Circuit {
            classical_registers: Vec::new(),
            qubit_registers: vec![RegisterDecl::new("q", 2)],
            instructions: vec![
                Instruction::Gate {
                    name: "h".to_string(),
                    operands: vec![WireKey::bit("q", 0)],
                },
                Instruction::Gate {
                    name: "cx".to_string(),
                    operands: vec![WireKey::bit("q", 0), WireKey::bit("q", 1)],
                },
                Instruction::Measurement {
                    operand: WireKey::bit("q", 0),
                },
                Instruction::Measurement {
                    operand: WireKey::bit("q", 1),
                },
            ],
        }
    }

    fn render(circuit: &Circuit, theme: &Theme) -> DrawResult<String> {
        let lines = build_line_index_map(circuit)?;
        let scheduled = schedule(&circuit.instructions, &lines)?;
        render_svg(&scheduled, &lines, theme)
    }

    #[test]
    fn canvas_size_matches_declared_attributes() {
        let svg = render(&bell_circuit(), &Theme::default()).unwrap();
        // 3 moments, 2 lines with default dimensions:
        // width = 2*20 + 3*(40+20) + 2*50 = 320, height = 2*40 + 2*20 = 120
        assert!(svg.starts_with(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"320\" height=\"120\" viewBox=\"0 0 320 120\">"
        ));
    }

    #[test]
    fn unknown_gate_renders_base_box_with_uppercase_label() {
        let circuit = Circuit {
            classical_registers: Vec::new(),
            qubit_registers: vec![RegisterDecl::new("q", 1)],
            instructions: vec![Instruction::Gate {
                name: "foo".to_string(),
                operands: vec![WireKey::bit("q", 0)],
            }],
        };
        let svg = render(&circuit, &Theme::default()).unwrap();
        assert!(svg.contains(">FOO</text>"));
        assert!(svg.contains("rx=\"4\""));
    }

    #[test]
    fn cx_draws_control_dot_and_target_cross() {
        let svg = render(&bell_circuit(), &Theme::default()).unwrap();
        assert!(svg.contains("r=\"4\""));
        assert!(svg.contains("r=\"8\" fill=\"none\""));
        // cx must not fall through to box rendering
        assert!(!svg.contains(">CX</text>"));
    }

    #[test]
    fn swap_draws_crosses_at_both_lines() {
        let circuit = Circuit {
            classical_registers: Vec::new(),
            qubit_registers: vec![RegisterDecl::new("q", 2)],
            instructions: vec![Instruction::Gate {
                name: "swap".to_string(),
                operands: vec![WireKey::bit("q", 0), WireKey::bit("q", 1)],
            }],
        };
        let svg = render(&circuit, &Theme::default()).unwrap();
        assert!(!svg.contains(">SWAP</text>"));
        // vertical connector plus two X crosses of two lines each
        assert_eq!(svg.matches("<line").count() - 2, 5); // 2 wires drawn separately
    }

    #[test]
    fn measurement_renders_labelled_box() {
        let svg = render(&bell_circuit(), &Theme::default()).unwrap();
        assert!(svg.contains(">M</text>"));
    }

    #[test]
    fn barrier_renders_dashed_line_without_boxes() {
        let circuit = Circuit {
            classical_registers: Vec::new(),
            qubit_registers: vec![RegisterDecl::new("q", 3)],
            instructions: vec![Instruction::Barrier {
                operands: vec![WireKey::bit("q", 0), WireKey::bit("q", 2)],
            }],
        };
        let svg = render(&circuit, &Theme::default()).unwrap();
        assert!(svg.contains("stroke-dasharray=\"4,4\""));
        assert!(!svg.contains("<rect x="));
        // default dims: lines 0 and 2 at y 20 and 100, padded by 10
        assert!(svg.contains("y1=\"10\" x2="));
        assert!(svg.contains("y2=\"110\""));
    }

    #[test]
    fn empty_circuit_still_draws_full_width_wires() {
        let circuit = Circuit {
            classical_registers: Vec::new(),
            qubit_registers: vec![RegisterDecl::new("q", 2)],
            instructions: Vec::new(),
        };
        let svg = render(&circuit, &Theme::default()).unwrap();
        // width = 2*20 + 0 + 2*50 = 140; wires run from 70 to 120
        assert!(svg.contains("width=\"140\""));
        assert_eq!(svg.matches("x1=\"70\"").count(), 2);
        assert_eq!(svg.matches("x2=\"120\"").count(), 2);
    }

    #[test]
    fn wave_wires_emit_sampled_paths() {
        let theme = Theme::from_value(&json!({
            "styles": {"wire": {"style": "wave", "amplitude": 4, "wavelength": 20}}
        }));
        let svg = render(&bell_circuit(), &theme).unwrap();
        assert!(svg.contains("<path d=\"M "));
        assert!(svg.contains(" L "));
        // plain horizontal wire lines are gone
        assert!(!svg.contains("x1=\"70\" y1=\"20\" x2="));
    }

    #[test]
    fn glyph_substitution_replaces_box_and_label() {
        let theme = Theme::from_value(&json!({
            "substitutions": {"h": {"type": "emoji", "value": "🎲"}}
        }));
        let svg = render(&bell_circuit(), &theme).unwrap();
        assert!(svg.contains(">🎲</text>"));
        assert!(!svg.contains(">H</text>"));
    }

    #[test]
    fn image_substitution_embeds_href() {
        let theme = Theme::from_value(&json!({
            "substitutions": {"h": {"type": "image", "value": "gates/h.png"}}
        }));
        let svg = render(&bell_circuit(), &theme).unwrap();
        assert!(svg.contains("<image href=\"gates/h.png\""));
    }

    #[test]
    fn animated_substitution_keeps_box_and_label() {
        let theme = Theme::from_value(&json!({
            "substitutions": {"h": {"type": "animation", "value": "pulse"}}
        }));
        let svg = render(&bell_circuit(), &theme).unwrap();
        assert!(svg.contains("<animate attributeName=\"fill-opacity\""));
        assert!(svg.contains(">H</text>"));
    }

    #[test]
    fn unknown_wire_aborts_without_partial_output() {
        let circuit = bell_circuit();
        let lines = build_line_index_map(&circuit).unwrap();
        let mut scheduled = schedule(&circuit.instructions, &lines).unwrap();
        scheduled.moments[0].push(Instruction::Gate {
            name: "x".to_string(),
            operands: vec![WireKey::bit("ghost", 7)],
        });
        let err = render_svg(&scheduled, &lines, &Theme::default()).unwrap_err();
        assert!(matches!(err, DrawError::UnknownWire(ref wire) if wire == "ghost[7]"));
    }

    #[test]
    fn labels_are_right_anchored_with_register_indices() {
        let circuit = Circuit {
            classical_registers: vec![RegisterDecl::new("c", 2)],
            qubit_registers: vec![RegisterDecl::new("q", 1)],
            instructions: Vec::new(),
        };
        let svg = render(&circuit, &Theme::default()).unwrap();
        assert!(svg.contains(">c</text>"));
        assert!(svg.contains(">q[0]</text>"));
        assert!(svg.contains("text-anchor=\"end\""));
    }

    #[test]
    fn escapes_markup_in_labels() {
        assert_eq!(escape_xml("<&>"), "&lt;&amp;&gt;");
    }
}
