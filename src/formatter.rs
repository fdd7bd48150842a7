//! Alignment padding and format-specifier dispatch.

use crate::error::{RenderError, RenderResult};
use crate::renderer::RenderConfig;
use crate::value::{FormatProvider, Value};

/// Renders `value` to its final placeholder text: format specifier first
/// (if any), then alignment padding.
///
/// A positive `alignment` right-aligns (pads on the left); negative
/// left-aligns (pads on the right); `0` applies no padding. Padding counts
/// chars, not bytes, and never truncates text already wider than the field.
pub fn format_value(
    value: &Value,
    alignment: i32,
    format: Option<&str>,
    format_provider: Option<&dyn FormatProvider>,
    config: &RenderConfig,
) -> RenderResult<String> {
    let mut text = match format {
        Some(spec) => match format_provider.and_then(|p| p.format(value, spec)) {
            Some(formatted) => formatted,
            None => {
                if config.strict_format {
                    return Err(RenderError::FormatProviderMissing {
                        path: value.to_string(),
                        format: spec.to_string(),
                    });
                }
                value.to_string()
            }
        },
        None => value.to_string(),
    };

    if alignment != 0 {
        let width = alignment.unsigned_abs() as usize;
        let len = text.chars().count();
        if len < width {
            let pad = " ".repeat(width - len);
            if alignment < 0 {
                text.push_str(&pad);
            } else {
                text = pad + &text;
            }
        }
    }

    Ok(text)
}
