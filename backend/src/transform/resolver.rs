//! Column resolution by candidate fragments.
//!
//! A header matches when any candidate fragment occurs in it,
//! case-insensitively. Headers are scanned in their original order and the
//! first match wins. No match is not an error: the caller skips the table.

/// Index of the first header containing any candidate fragment.
pub fn resolve_position<H, C>(headers: &[H], candidates: &[C]) -> Option<usize>
where
    H: AsRef<str>,
    C: AsRef<str>,
{
    resolve_position_excluding(headers, candidates, None)
}

/// Like [`resolve_position`], but never returns `excluded`.
///
/// Used so the value column cannot be the column already chosen as key.
pub fn resolve_position_excluding<H, C>(
    headers: &[H],
    candidates: &[C],
    excluded: Option<usize>,
) -> Option<usize>
where
    H: AsRef<str>,
    C: AsRef<str>,
{
    let fragments: Vec<String> = candidates
        .iter()
        .map(|c| c.as_ref().trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect();

    headers.iter().enumerate().position(|(i, header)| {
        if Some(i) == excluded {
            return false;
        }
        let header = header.as_ref().to_lowercase();
        fragments.iter().any(|f| header.contains(f.as_str()))
    })
}

/// The first header containing any candidate fragment.
pub fn resolve<'h, H, C>(headers: &'h [H], candidates: &[C]) -> Option<&'h str>
where
    H: AsRef<str>,
    C: AsRef<str>,
{
    resolve_position(headers, candidates).map(|i| headers[i].as_ref())
}
