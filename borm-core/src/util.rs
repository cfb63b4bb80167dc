/// Writes the items produced by `f` into `out`, with `separator` between them.
pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    for (i, v) in values.into_iter().enumerate() {
        if i > 0 {
            out.push_str(separator);
        }
        f(out, v);
    }
}

/// Number of `?` placeholders, comma separated: `?,?,?`.
pub fn placeholders(out: &mut String, count: usize) {
    separated_by(out, 0..count, |out, _| out.push('?'), ",");
}

/// Longest prefix of `value` that fits in `max` bytes without splitting a char.
pub fn truncated(value: &str, max: usize) -> &str {
    if value.len() <= max {
        return value;
    }
    let mut end = max;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            $crate::truncated(&$query, 497).trim_end(),
            if $query.len() > 497 { "..." } else { "" },
        )
    };
}
