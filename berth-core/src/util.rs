pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {{
        let query: &str = &$query;
        let end = query.char_indices().nth(497).map_or(query.len(), |(i, _)| i);
        format!(
            "{}{}",
            query[..end].trim_end(),
            if end < query.len() { "..." } else { "" },
        )
    }};
}

/// Logs the error and hands it back, for use inside `map_err`.
#[macro_export]
macro_rules! log_error {
    ($error:expr) => {{
        let error = $error;
        ::log::error!("{:#}", error);
        error
    }};
}
