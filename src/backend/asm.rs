use std::fmt;

use strum_macros::Display;

/// The handful of general-purpose registers the target model exposes (spec
/// §4.3). Mirrors the enum-to-text idiom the rest of this stack's
/// instruction-set types use, just mapping to SPIM's `$`-prefixed register
/// names instead of opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Reg {
    #[strum(serialize = "$t0")]
    T0,
    #[strum(serialize = "$t1")]
    T1,
    #[strum(serialize = "$v0")]
    V0,
    #[strum(serialize = "$a0")]
    A0,
    #[strum(serialize = "$ra")]
    Ra,
    #[strum(serialize = "$fp")]
    Fp,
    #[strum(serialize = "$sp")]
    Sp,
}

/// A memory operand: either a global label or a frame-relative offset.
#[derive(Debug, Clone)]
pub enum Location {
    Global(String),
    Frame(i32),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Global(name) => write!(f, "{}", name),
            Location::Frame(offset) => write!(f, "{}({})", offset, Reg::Fp),
        }
    }
}

/// An append-only SPIM/MIPS assembly text builder. Analogous in spirit to
/// this stack's program-code builders: callers never touch the raw line
/// buffer directly, they call a small vocabulary of `emit_*` methods and
/// `finalize()` to collect the text stream. Because the target here is
/// textual assembly rather than resolved bytecode, there is no label
/// back-patching pass — the assembler resolves `.L`-prefixed labels itself.
pub struct AsmWriter {
    lines: Vec<String>,
}

impl AsmWriter {
    pub fn new() -> Self {
        AsmWriter { lines: Vec::new() }
    }

    pub fn section_text(&mut self) {
        self.lines.push(".text".to_string());
    }

    pub fn section_data(&mut self) {
        self.lines.push(".data".to_string());
    }

    pub fn align2(&mut self) {
        self.lines.push(".align 2".to_string());
    }

    pub fn globl(&mut self, name: &str) {
        self.lines.push(format!(".globl {}", name));
    }

    pub fn label(&mut self, name: &str) {
        self.lines.push(format!("{}:", name));
    }

    pub fn space(&mut self, name: &str, bytes: u32) {
        self.lines.push(format!("{}: .space {}", name, bytes));
    }

    pub fn asciiz(&mut self, name: &str, text: &str) {
        self.lines.push(format!("{}: .asciiz \"{}\"", name, escape(text)));
    }

    /// Emits a single instruction, indented like hand-written assembly.
    pub fn emit(&mut self, instruction: impl Into<String>) {
        self.lines.push(format!("    {}", instruction.into()));
    }

    pub fn comment(&mut self, text: &str) {
        self.lines.push(format!("    # {}", text));
    }

    pub fn finalize(self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

impl Default for AsmWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_display_matches_spim_names() {
        assert_eq!(Reg::T0.to_string(), "$t0");
        assert_eq!(Reg::Ra.to_string(), "$ra");
        assert_eq!(Reg::Sp.to_string(), "$sp");
    }

    #[test]
    fn frame_location_renders_relative_to_fp() {
        let loc = Location::Frame(-8);
        assert_eq!(loc.to_string(), "-8($fp)");
    }

    #[test]
    fn global_location_renders_bare_label() {
        let loc = Location::Global("_x".to_string());
        assert_eq!(loc.to_string(), "_x");
    }

    #[test]
    fn writer_emits_indented_instructions_and_bare_labels() {
        let mut writer = AsmWriter::new();
        writer.section_text();
        writer.label("_f");
        writer.emit(format!("li {}, 1", Reg::T0));
        let text = writer.finalize();
        assert_eq!(text, ".text\n_f:\n    li $t0, 1\n");
    }

    #[test]
    fn asciiz_escapes_quotes_and_backslashes() {
        let mut writer = AsmWriter::new();
        writer.asciiz("_s", "say \"hi\"\\now");
        let text = writer.finalize();
        assert!(text.contains(r#"_s: .asciiz "say \"hi\"\\now""#));
    }
}
