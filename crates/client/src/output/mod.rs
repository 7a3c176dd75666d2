//! Rendering of command results.
//!
//! `--format json` prints the serialized value as one line; the pretty
//! format uses the renderer picked by the command.

pub mod json;
pub mod pretty;

use serde::Serialize;

use crate::cli::OutputFormat;

/// Render `value` for the requested format.
pub fn render<T, F>(value: &T, format: OutputFormat, pretty_text: F) -> String
where
    T: Serialize + ?Sized,
    F: FnOnce(&T) -> String,
{
    match format {
        OutputFormat::Json => json::format_json(value),
        OutputFormat::Pretty => pretty_text(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::state::CounterState;

    #[test]
    fn json_ignores_the_pretty_renderer() {
        let state = CounterState::default();
        let text = render(&state, OutputFormat::Json, |_| unreachable!());
        assert!(text.starts_with('{'));
        assert!(!text.contains('\n'));
    }

    #[test]
    fn pretty_uses_the_renderer() {
        let text = render(&[1, 2, 3][..], OutputFormat::Pretty, |items| {
            format!("{} items", items.len())
        });
        assert_eq!(text, "3 items");
    }
}
