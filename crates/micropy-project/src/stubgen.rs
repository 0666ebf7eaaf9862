//! Interface stub synthesis for pure-Python packages
//!
//! Produces a `.pyi` body from a `.py` module by keeping imports,
//! module- and class-level assignments, decorators, class headers and
//! function signatures. Function bodies become `...`. This is a line
//! scanner, not a parser: it tracks indentation, bracket depth and
//! triple-quoted strings, which covers the code found in MicroPython
//! libraries.

use std::path::Path;

/// Whether `file` should get an interface stub.
///
/// Skips `setup.py`, `__version__.py` and `test_*` modules.
pub fn is_stub_candidate(file: &Path) -> bool {
    let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let Some(stem) = name.strip_suffix(".py") else {
        return false;
    };
    stem != "setup" && stem != "__version__" && !stem.starts_with("test_")
}

/// Generate the interface stub for `source`.
pub fn generate(source: &str) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let mut out: Vec<String> = Vec::new();
    // Indent of each open class whose body is being kept.
    let mut classes: Vec<usize> = Vec::new();
    // Class header waiting for its first body line.
    let mut pending_body: Option<usize> = None;
    let mut i = 0;

    while i < lines.len() {
        let raw = lines[i];
        let line = raw.trim_end();
        let stripped = line.trim_start();
        i += 1;

        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }
        let indent = line.len() - stripped.len();

        if let Some(class_indent) = pending_body
            && indent <= class_indent
        {
            out.push(format!("{}...", " ".repeat(class_indent + 4)));
            pending_body = None;
        }
        while classes.last().is_some_and(|&c| indent <= c) {
            classes.pop();
        }
        // Indented lines outside a kept class belong to a dropped block.
        if classes.is_empty() && indent > 0 {
            continue;
        }

        if starts_docstring(stripped) {
            i = skip_string(&lines, i - 1, stripped);
            continue;
        }

        let pad = " ".repeat(indent);
        if stripped.starts_with("import ") || stripped.starts_with("from ") {
            let (statement, next) = collect_balanced(&lines, i - 1);
            out.push(format!("{pad}{statement}"));
            pending_body = None;
            i = next;
        } else if stripped.starts_with('@') {
            let (statement, next) = collect_balanced(&lines, i - 1);
            out.push(format!("{pad}{statement}"));
            i = next;
        } else if stripped.starts_with("class ") {
            let (header, next) = collect_header(&lines, i - 1);
            out.push(format!("{pad}{header}"));
            classes.push(indent);
            pending_body = Some(indent);
            i = next;
        } else if stripped.starts_with("def ") || stripped.starts_with("async def ") {
            let (header, next) = collect_header(&lines, i - 1);
            out.push(format!("{pad}{header} ..."));
            pending_body = None;
            i = skip_block(&lines, next, indent);
        } else if let Some(target) = assignment_target(stripped) {
            let (statement, next) = collect_balanced(&lines, i - 1);
            if next == i {
                out.push(format!("{pad}{statement}"));
            } else {
                out.push(format!("{pad}{target} = ..."));
            }
            pending_body = None;
            i = next;
        } else {
            // Other statements; drop them along with any block they open.
            let (statement, next) = collect_balanced(&lines, i - 1);
            i = if statement.ends_with(':') {
                skip_block(&lines, next, indent)
            } else {
                next
            };
        }
    }

    if let Some(class_indent) = pending_body {
        out.push(format!("{}...", " ".repeat(class_indent + 4)));
    }

    let mut stub = out.join("\n");
    stub.push('\n');
    stub
}

fn starts_docstring(stripped: &str) -> bool {
    let unprefixed = stripped.trim_start_matches(['r', 'R', 'b', 'B', 'u', 'U']);
    unprefixed.starts_with("\"\"\"") || unprefixed.starts_with("'''")
}

/// Skip a (possibly multi-line) triple-quoted string starting at `start`.
fn skip_string(lines: &[&str], start: usize, stripped: &str) -> usize {
    let unprefixed = stripped.trim_start_matches(['r', 'R', 'b', 'B', 'u', 'U']);
    let quote = &unprefixed[..3];
    if unprefixed[3..].contains(quote) {
        return start + 1;
    }
    let mut i = start + 1;
    while i < lines.len() {
        if lines[i].contains(quote) {
            return i + 1;
        }
        i += 1;
    }
    i
}

/// Skip every line indented deeper than `indent`.
fn skip_block(lines: &[&str], mut i: usize, indent: usize) -> usize {
    while i < lines.len() {
        let line = lines[i].trim_end();
        let stripped = line.trim_start();
        if !stripped.is_empty() && line.len() - stripped.len() <= indent {
            break;
        }
        i += 1;
    }
    i
}

/// Join lines from `start` until brackets balance. Returns the joined
/// statement and the index after it.
fn collect_balanced(lines: &[&str], start: usize) -> (String, usize) {
    let mut parts = Vec::new();
    let mut depth: i32 = 0;
    let mut i = start;
    while i < lines.len() {
        let part = strip_comment(lines[i].trim());
        depth += bracket_delta(part);
        parts.push(part.trim_end_matches('\\').trim().to_string());
        i += 1;
        if depth <= 0 && !lines[i - 1].trim_end().ends_with('\\') {
            break;
        }
    }
    (join_parts(&parts), i)
}

/// Collect a `def`/`class` header up to its terminating colon.
fn collect_header(lines: &[&str], start: usize) -> (String, usize) {
    let (mut header, next) = collect_balanced(lines, start);
    // A one-line body (`def f(): return 1`) is cut at the header colon.
    if let Some(colon) = header_colon(&header) {
        header.truncate(colon + 1);
    }
    (header, next)
}

/// Byte offset of the colon ending a header, ignoring colons nested in
/// brackets (annotations, defaults) or strings.
fn header_colon(header: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    for (idx, ch) in header.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, '(' | '[' | '{') => depth += 1,
            (None, ')' | ']' | '}') => depth -= 1,
            (None, ':') if depth == 0 => return Some(idx),
            _ => {}
        }
    }
    None
}

fn join_parts(parts: &[String]) -> String {
    let mut joined = String::new();
    for part in parts {
        if part.is_empty() {
            continue;
        }
        let glue = !joined.is_empty()
            && !joined.ends_with(['(', '[', '{'])
            && !part.starts_with([')', ']', '}']);
        if glue {
            joined.push(' ');
        }
        joined.push_str(part);
    }
    joined
}

fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    for (idx, ch) in line.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, '#') => return line[..idx].trim_end(),
            _ => {}
        }
    }
    line
}

fn bracket_delta(line: &str) -> i32 {
    let mut delta = 0;
    let mut quote: Option<char> = None;
    for ch in line.chars() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, '(' | '[' | '{') => delta += 1,
            (None, ')' | ']' | '}') => delta -= 1,
            _ => {}
        }
    }
    delta
}

/// The assigned name(s) for `NAME = ...`, `NAME: T = ...` or `A, B = ...`.
fn assignment_target(stripped: &str) -> Option<&str> {
    let eq = stripped.find('=')?;
    let target = stripped[..eq].trim_end();
    let next = stripped[eq + 1..].chars().next();
    let prev = target.chars().last();
    if next == Some('=') || matches!(prev, Some('!' | '<' | '>' | '=')) {
        return None;
    }
    let target = target.trim_end_matches(['+', '-', '*', '/', '%', '&', '|', '^']);
    let name_part = target.split(':').next().unwrap_or(target);
    let valid = !name_part.is_empty()
        && name_part
            .split(',')
            .map(str::trim)
            .all(|n| !n.is_empty() && n.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.'));
    valid.then_some(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("picoweb/__init__.py", true)]
    #[case("utils.py", true)]
    #[case("setup.py", false)]
    #[case("__version__.py", false)]
    #[case("test_utils.py", false)]
    #[case("README.md", false)]
    fn test_is_stub_candidate(#[case] file: &str, #[case] expected: bool) {
        assert_eq!(is_stub_candidate(Path::new(file)), expected);
    }

    #[test]
    fn test_generate_module() {
        let source = r#""""A tiny web framework."""
import gc
from machine import (
    Pin,
    PWM,
)

DEBUG = False
ROUTES = {
    "/": "index",
}


def start(host="0.0.0.0", port=80):
    """Serve forever."""
    while True:
        gc.collect()


@micropython.native
def checksum(data: bytes) -> int: return sum(data)


class Server(object):
    """Request dispatcher."""

    backlog: int = 5

    def __init__(self, app,
                 debug=False):
        self.app = app

    @property
    def routes(self):
        return ROUTES


class Empty:
    pass


if __name__ == "__main__":
    start()
"#;
        let expected = "\
import gc
from machine import (Pin, PWM,)
DEBUG = False
ROUTES = ...
def start(host=\"0.0.0.0\", port=80): ...
@micropython.native
def checksum(data: bytes) -> int: ...
class Server(object):
    backlog: int = 5
    def __init__(self, app, debug=False): ...
    @property
    def routes(self): ...
class Empty:
    ...
";
        assert_eq!(generate(source), expected);
    }

    #[test]
    fn test_assignment_targets() {
        assert_eq!(assignment_target("x = 1"), Some("x"));
        assert_eq!(assignment_target("a, b = 1, 2"), Some("a, b"));
        assert_eq!(assignment_target("count: int = 0"), Some("count: int"));
        assert_eq!(assignment_target("x == 1"), None);
        assert_eq!(assignment_target("print(x=1)"), None);
        assert_eq!(assignment_target("if x >= 1:"), None);
    }
}
