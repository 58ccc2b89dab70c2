//! The QBE textual IR vocabulary this front-end emits (spec.md §4.4, §6):
//! base types, operand forms, and a small line-buffering [`Writer`].
//!
//! Grounded on `examples/original_source/src/analyze.c`'s string-building
//! emit helpers (`qbe_write_var`/`qbe_write_type`, and the `%temp_N`/
//! `%ident_NAME` naming scheme `ctx_new_temp` and `qbe_write_var` build),
//! re-expressed with Rust's `fmt::Display` instead of hand-rolled `fprintf`
//! calls into a `FILE *`. The deferred `data $_data_N` table has no
//! counterpart in `analyze.c` (it never backs string literals with static
//! data) — it's this rewrite's own addition to cover spec.md §4.4's string
//! and character literal handling.

use std::fmt;
use std::io;

use cqc_util::Symbol;

/// A QBE base type tag. `Void` is a marker for "no result value", not a
/// real QBE keyword — it's never printed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QbeType {
    W,
    L,
    Sb,
    Ub,
    S,
    Void,
}

impl QbeType {
    pub fn text(self) -> &'static str {
        match self {
            QbeType::W => "w",
            QbeType::L => "l",
            QbeType::Sb => "sb",
            QbeType::Ub => "ub",
            QbeType::S => "s",
            QbeType::Void => "",
        }
    }

    pub fn is_void(self) -> bool {
        matches!(self, QbeType::Void)
    }

    /// The width QBE arithmetic actually computes in: sub-word types are
    /// only ever load/store widths, never the type of a temporary.
    pub fn arithmetic_type(self) -> QbeType {
        match self {
            QbeType::Sb | QbeType::Ub => QbeType::W,
            other => other,
        }
    }
}

impl fmt::Display for QbeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// One QBE operand (spec.md §4.4 "Value form"), plus the literal immediate
/// form QBE's instruction syntax accepts directly (e.g. the `1` in
/// `mul <i>, 1`) — the prose enumerates named operand forms but every
/// worked example embeds bare integer immediates, so `Const` rounds out
/// the vocabulary rather than routing every literal through a temporary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    /// A literal integer immediate, used directly in instruction text.
    Const(i64),
    /// `%temp_N` — a fresh SSA temporary.
    Temp(u32),
    /// `%ident_D_NAME` — the stack slot for a named variable declared at
    /// scope depth `D`.
    Local { scope: u32, name: Symbol },
    /// `%param_NAME` — a function parameter's incoming value, before it
    /// is copied into its own stack slot at function entry.
    Param(Symbol),
    /// `$NAME` — a function reference, used as an lvalue for calls.
    FuncRef(Symbol),
    /// `$_data_N` — a read-only data blob (string literal backing store).
    Data(u32),
    /// `%result` — the one designated temporary every `return` in a
    /// function stores its value into before jumping to `@end` (spec.md
    /// §4.4 "Function definitions").
    Result,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Const(n) => write!(f, "{n}"),
            Operand::Temp(n) => write!(f, "%temp_{n}"),
            Operand::Local { scope, name } => write!(f, "%ident_{scope}_{}", name.as_str()),
            Operand::Param(name) => write!(f, "%param_{}", name.as_str()),
            Operand::FuncRef(name) => write!(f, "${}", name.as_str()),
            Operand::Data(n) => write!(f, "$_data_{n}"),
            Operand::Result => write!(f, "%result"),
        }
    }
}

/// Generates `%temp_N` operands with strictly increasing `N`, reset once
/// per compile (spec.md §5: "per-context" counters, never global).
#[derive(Default)]
pub struct TempCounter(u32);

impl TempCounter {
    pub fn fresh(&mut self) -> Operand {
        let id = self.0;
        self.0 += 1;
        Operand::Temp(id)
    }
}

/// Generates globally unique `@name_N` labels.
#[derive(Default)]
pub struct LabelCounter(u32);

impl LabelCounter {
    pub fn fresh(&mut self, hint: &str) -> String {
        let id = self.0;
        self.0 += 1;
        format!("{hint}_{id}")
    }
}

/// Buffers emitted function text and the deferred read-only data table,
/// then flushes both to the compile's output sink in one shot: all
/// function definitions first, in source order, followed by every
/// `data $_data_N` blob collected while walking string literals
/// (spec.md §4.4 "String and character literals").
pub struct Writer {
    functions: String,
    data: Vec<(u32, Vec<u8>)>,
}

impl Writer {
    pub fn new() -> Self {
        Self {
            functions: String::new(),
            data: Vec::new(),
        }
    }

    pub fn raw_line(&mut self, line: impl AsRef<str>) {
        self.functions.push_str(line.as_ref());
        self.functions.push('\n');
    }

    pub fn blank_line(&mut self) {
        self.functions.push('\n');
    }

    /// `\t%dst =<ty> opcode arg1, arg2, ...`
    pub fn assign(&mut self, dst: &Operand, ty: QbeType, opcode: &str, args: &[String]) {
        if args.is_empty() {
            self.raw_line(format!("\t{dst} ={ty} {opcode}"));
        } else {
            self.raw_line(format!("\t{dst} ={ty} {opcode} {}", args.join(", ")));
        }
    }

    /// An instruction with no result: `store<ty>`, bare `call`, terminators.
    pub fn stmt(&mut self, text: impl AsRef<str>) {
        self.raw_line(format!("\t{}", text.as_ref()));
    }

    pub fn label(&mut self, name: &str) {
        self.raw_line(format!("@{name}"));
    }

    pub fn push_data(&mut self, id: u32, bytes: Vec<u8>) {
        self.data.push((id, bytes));
    }

    pub fn finish(self, out: &mut dyn io::Write) -> io::Result<()> {
        out.write_all(self.functions.as_bytes())?;
        for (id, bytes) in self.data {
            let items = bytes
                .iter()
                .map(|b| format!("b {b}"))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(out, "data $_data_{id} = {{ {items} }}")?;
        }
        Ok(())
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_counter_is_strictly_increasing() {
        let mut temps = TempCounter::default();
        assert_eq!(temps.fresh().to_string(), "%temp_0");
        assert_eq!(temps.fresh().to_string(), "%temp_1");
    }

    #[test]
    fn label_counter_is_globally_unique_across_hints() {
        let mut labels = LabelCounter::default();
        assert_eq!(labels.fresh("cond"), "cond_0");
        assert_eq!(labels.fresh("body"), "body_1");
    }

    #[test]
    fn finish_emits_functions_then_data() {
        let mut w = Writer::new();
        w.raw_line("export function w $main() {");
        w.raw_line("@start");
        w.stmt("ret 0");
        w.raw_line("}");
        w.push_data(0, vec![b'h', b'i', 0]);

        let mut out = Vec::new();
        w.finish(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.find("export function").unwrap() < text.find("data $_data_0").unwrap());
        assert!(text.contains("data $_data_0 = { b 104, b 105, b 0 }"));
    }
}
