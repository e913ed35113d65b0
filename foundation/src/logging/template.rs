//! Message template rendering for backends that need a human-readable line.
//!
//! Holes are `{...}`. A numeric hole (`{0}`) indexes the arguments directly;
//! a named hole (`{path}`) takes the argument at its position among all holes.
//! `{{` and `}}` are literal braces. Holes without an argument stay verbatim.

use super::facade::LogValue;

/// Render `template` against `args`.
pub fn render(template: &str, args: &[LogValue]) -> String {
    let mut out = String::with_capacity(template.len() + args.len() * 8);
    let mut hole_index = 0usize;
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            out.push('}');
            rest = &tail[1..];
            continue;
        }

        let Some(close) = tail.find('}') else {
            out.push_str(tail);
            return out;
        };
        let hole = &tail[..=close];
        let name = &tail[1..close];
        let arg = match name.parse::<usize>() {
            Ok(index) => args.get(index),
            Err(_) => args.get(hole_index),
        };
        match arg {
            Some(value) => out.push_str(&value.to_string()),
            None => out.push_str(hole),
        }
        hole_index += 1;
        rest = &tail[close + 1..];
    }

    out.push_str(rest);
    out
}
