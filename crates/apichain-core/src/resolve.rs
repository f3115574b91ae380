//! Path template resolution: `{name}` placeholders → learned values

use crate::context::RunContext;

/// Keys consulted, in order, when an id-like placeholder has no exact match.
const ID_FALLBACK_KEYS: &[&str] = &["id", "uuid"];

/// A `{name}` span inside a template: byte range of the braces and the name.
struct Span<'a> {
    start: usize,
    end: usize,
    name: &'a str,
}

/// Scan a template for non-empty `{name}` spans, left to right.
///
/// The name runs up to the next `}`. An unmatched `{` ends the scan.
fn spans(template: &str) -> Vec<Span<'_>> {
    let mut out = Vec::new();
    let mut cursor = 0;
    while let Some(open) = template[cursor..].find('{').map(|i| cursor + i) {
        let Some(close) = template[open + 1..].find('}').map(|i| open + 1 + i) else {
            break;
        };
        if close > open + 1 {
            out.push(Span {
                start: open,
                end: close + 1,
                name: &template[open + 1..close],
            });
            cursor = close + 1;
        } else {
            // `{}` carries no name; keep it verbatim and move on.
            cursor = open + 1;
        }
    }
    out
}

/// Placeholder names in a template, in order of appearance.
#[must_use]
pub fn placeholders(template: &str) -> Vec<&str> {
    spans(template).into_iter().map(|s| s.name).collect()
}

/// Whether a path still carries at least one `{name}` span.
#[must_use]
pub fn has_unresolved(path: &str) -> bool {
    !spans(path).is_empty()
}

/// Replace each `{name}` span with `lookup(name)`, leaving misses verbatim.
///
/// Substituted values are written once and never rescanned.
pub fn substitute<'v, F>(template: &str, mut lookup: F) -> String
where
    F: FnMut(&str) -> Option<&'v str>,
{
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for span in spans(template) {
        out.push_str(&template[last..span.start]);
        match lookup(span.name) {
            Some(value) => out.push_str(value),
            None => out.push_str(&template[span.start..span.end]),
        }
        last = span.end;
    }
    out.push_str(&template[last..]);
    out
}

/// Value for one placeholder name: exact key first, then the generic id
/// fallback when the name looks like an identifier.
#[must_use]
pub fn lookup<'c>(name: &str, context: &'c RunContext) -> Option<&'c str> {
    if let Some(v) = context.get(name) {
        return Some(v);
    }
    if !name.to_lowercase().contains("id") {
        return None;
    }
    ID_FALLBACK_KEYS.iter().find_map(|k| context.get(k))
}

/// Resolve a path template against a context.
///
/// ```
/// use apichain_core::{RunContext, resolve};
///
/// let ctx: RunContext = [("id", "7")].into_iter().collect();
/// assert_eq!(resolve("/drivers/{driver_id}", &ctx), "/drivers/7");
/// assert_eq!(resolve("/drivers/{name}", &ctx), "/drivers/{name}");
/// ```
#[must_use]
pub fn resolve(template: &str, context: &RunContext) -> String {
    substitute(template, |name| lookup(name, context))
}
