#[cfg(feature = "cli")]
pub mod cli;
pub mod error;
pub mod layout;
pub mod model;
pub mod render;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use error::{DrawError, DrawResult};
pub use layout::{DepthMap, LineIndexMap, Schedule, build_line_index_map, schedule};
pub use model::{Circuit, Instruction, RegisterDecl, WireKey};
pub use render::{render_svg, write_output_svg};
pub use theme::{GateConfig, Substitution, Theme, deep_merge};

/// Schedules and renders a circuit in one call: line-index assignment,
/// moment scheduling, then themed SVG emission.
pub fn draw(circuit: &Circuit, theme: &Theme) -> DrawResult<String> {
    let lines = layout::build_line_index_map(circuit)?;
    let scheduled = layout::schedule(&circuit.instructions, &lines)?;
    render::render_svg(&scheduled, &lines, theme)
}
