// Document comparison engine: line/word alignment and rendering.
// Pure and synchronous. Callers on the async side run it via spawn_blocking.

pub mod aligner;
pub mod renderer;

pub use aligner::align;
pub use renderer::{annotate_opcodes, render_view, OpcodeView, RenderedView};
