/// Normalizes a scraped cell: drops non-ASCII characters, deletes line
/// breaks and tabs outright, collapses remaining whitespace runs to one space
/// and trims the ends.
///
/// Every scraped value goes through here so cells compare equal across terms.
pub fn decrap(item: &str) -> String {
    let ascii: String = item
        .chars()
        .filter(|c| c.is_ascii() && !matches!(c, '\n' | '\r' | '\t'))
        .collect();
    ascii.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Course location as listed in the `alt` text of the location icon: one
/// `Building/Room: X` line per room after a venue line.
pub fn decode_location(alt: &str) -> String {
    alt.lines()
        .map(str::trim)
        .filter(|line| line.starts_with("Building"))
        .map(|line| match line.split_once("Building/Room: ") {
            Some((_, room)) => room.trim(),
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}
