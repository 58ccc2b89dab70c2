//! The compiler driver: the thin, hermetic entry point that strings the
//! three language phases together. It owns none of the language's logic —
//! lexing, parsing, and the fused analyzer/codegen pass all live in their
//! own crates — only argument parsing, file I/O, and exit-code mapping
//! belong here (spec.md §1, §12).

use std::io::Write;
use std::path::{Path, PathBuf};

use cqc_util::span::SourceMap;
use cqc_util::{CompileError, FileId};
use tracing::{info, info_span};

/// The options a single compile invocation needs: where to read from,
/// where to write to, and whether the thin binary should turn on verbose
/// tracing output (spec.md §12).
#[derive(Debug, Clone)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub verbose: bool,
}

/// Strips preprocessor linemarkers (`# <line> "file" ...`, and any other
/// line whose first non-whitespace byte is `#`) that survive in
/// already-preprocessed input, replacing each with a blank line so token
/// locations in the rest of the file are unaffected (spec.md §6: "lines
/// beginning with `#` that survive must be stripped before the lexer sees
/// them"). `cpp`/`gcc -E` emit these linemarkers in their output; the lexer
/// itself has no rule for `#` and would otherwise reject them outright.
fn strip_preprocessor_lines(source: &str) -> String {
    source
        .lines()
        .map(|line| if line.trim_start().starts_with('#') { "" } else { line })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Compiles `source` (already-preprocessed C-subset text, named `file_name`
/// for diagnostics) to QBE IR text written to `out`.
///
/// Hermetic and re-entrant (spec.md §5, §12): every call builds its own
/// token stream, AST arena, and symbol table, so calling this twice in one
/// process behaves exactly like two separate processes.
pub fn compile(source: &str, file_name: &str, out: &mut dyn Write) -> Result<(), CompileError> {
    let _span = info_span!("compile", file = file_name).entered();

    let source = strip_preprocessor_lines(source);
    let tokens = {
        let _lex = info_span!("lex").entered();
        let tokens = cqc_lex::tokenize(&source, FileId::DUMMY)?;
        info!(tokens = tokens.len(), "lexing complete");
        tokens
    };

    let ast = {
        let _parse = info_span!("parse").entered();
        let ast = cqc_par::parse_translation_unit(&tokens)?;
        info!(nodes = ast.len(), "parsing complete");
        ast
    };

    {
        let _emit = info_span!("analyze_and_emit").entered();
        cqc_gen::compile_to_qbe(&ast, out)?;
    }

    Ok(())
}

/// Reads `config.input`, compiles it, and writes QBE text to
/// `config.output`. On failure, renders the error against the source
/// (using [`SourceMap::format_span`] when the failure carries a real span)
/// and returns it for the caller to map to a process exit code.
pub fn run(config: &Config) -> anyhow::Result<()> {
    if config.verbose {
        info!(input = %config.input.display(), output = %config.output.display(), "starting compilation");
    }

    let source = std::fs::read_to_string(&config.input)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", config.input.display()))?;
    let file_name = display_name(&config.input);

    let mut buf = Vec::new();
    match compile(&source, &file_name, &mut buf) {
        Ok(()) => {
            std::fs::write(&config.output, &buf)
                .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", config.output.display()))?;
            Ok(())
        }
        Err(err) => {
            let mut sources = SourceMap::new();
            sources.add_file(file_name, source);
            Err(anyhow::anyhow!(render_error(&err, &sources)))
        }
    }
}

fn render_error(err: &CompileError, sources: &SourceMap) -> String {
    if matches!(err, CompileError::Io(_)) {
        return err.to_string();
    }
    match sources.format_span(err.span()) {
        Some(snippet) => format!("error: {err}\n{snippet}"),
        None => format!("error: {err}"),
    }
}

fn display_name(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linemarker_lines_are_blanked_not_removed() {
        let src = "# 1 \"foo.c\"\nint main(void) { return 0; }\n# 2 \"foo.c\"\n";
        let stripped = strip_preprocessor_lines(src);
        assert_eq!(stripped.lines().count(), src.lines().count());
        assert!(stripped.lines().all(|l| !l.trim_start().starts_with('#')));
    }

    #[test]
    fn indented_linemarker_is_also_stripped() {
        let src = "  # 5 \"bar.c\"\nint x;";
        let stripped = strip_preprocessor_lines(src);
        assert!(!stripped.contains('#'));
    }

    #[test]
    fn preprocessed_source_with_linemarkers_compiles() {
        let src = "# 1 \"t.c\"\nint main(void) {\n# 2 \"t.c\"\n    return 0;\n}\n";
        let mut out = Vec::new();
        compile(src, "t.c", &mut out).expect("linemarkers should be stripped before lexing");
        assert!(String::from_utf8(out).unwrap().contains("$main"));
    }
}
