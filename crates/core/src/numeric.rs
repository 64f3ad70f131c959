/// Parses locally-formatted price and stock strings into canonical numbers.
///
/// The sheet mixes Danish notation (`"450,-"`, `"1.200,00"`, `"12,5"`) with
/// plain integers and free text. Anything unparseable resolves to `None`;
/// this never panics and never produces NaN or a placeholder zero.
pub fn parse_locale_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return None;
    }

    // "kroner, no øre" suffix
    let trimmed = trimmed.strip_suffix(",-").unwrap_or(trimmed);

    let mut cleaned: String = trimmed
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == ',' || *ch == '.')
        .collect();

    if cleaned.contains('.') && cleaned.contains(',') {
        // "1.200,00": period is a thousands separator, comma is the decimal
        cleaned.retain(|ch| ch != '.');
        cleaned = cleaned.replacen(',', ".", 1);
    } else if cleaned.contains(',') {
        cleaned = cleaned.replacen(',', ".", 1);
    }

    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}
