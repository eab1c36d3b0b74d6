/// Longest identifier PostgreSQL keeps (NAMEDATALEN - 1)
pub(crate) const MAX_IDENTIFIER_LENGTH: usize = 63;

const CSV_EXTENSION: &str = ".csv";

///
/// Make a word usable as a SQL table or column name.
///
/// Non-ASCII characters are dropped, the first character must be alphabetic or '_'
/// (a '_' is put in front otherwise), then everything but [A-Za-z0-9_] is removed.
/// None if nothing is left after trimming.
///
pub(crate) fn clean_word(word: &str) -> Option<String> {
    let ascii_word: String = word.chars().filter(|c| c.is_ascii()).collect();
    let trimmed = ascii_word.trim();

    let first = trimmed.chars().next()?;

    let mut cleaned = String::with_capacity(trimmed.len() + 1);
    if !first.is_ascii_alphabetic() && first != '_' {
        cleaned.push('_');
    }
    cleaned.extend(trimmed.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '_'));
    cleaned.truncate(MAX_IDENTIFIER_LENGTH);

    Some(cleaned)
}

/// Name of the dataset (and its table) for an uploaded file
pub(crate) fn dataset_name_from_filename(filename: &str) -> Option<String> {
    let base = filename.strip_suffix(CSV_EXTENSION).unwrap_or(filename);
    clean_word(base)
}

/// Quote an identifier which went through clean_word
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name)
}
