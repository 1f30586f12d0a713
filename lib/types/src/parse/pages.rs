#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageSpecError {
    #[error("Malformed page spec token `{0}`: expected `N` or `A-B`")]
    Malformed(String),
}

/// Upper bound on the number of pages one specification may expand to.
pub const MAX_PAGES: usize = 10_000;

/// Expands a page-range specification such as `1,3,5-8` into page numbers, in input order.
///
/// Ranges are inclusive and ascending; `A-B` with `A > B` expands to nothing. A specification
/// expanding to more than [`MAX_PAGES`] pages is rejected.
pub fn parse_page_spec(spec: &str) -> Result<Vec<u32>, PageSpecError> {
    let mut pages = Vec::new();
    for token in spec.split(',') {
        let token = token.trim();
        let malformed = || PageSpecError::Malformed(token.to_owned());
        match token.split_once('-') {
            Some((start, end)) => {
                let start: u32 = start.trim().parse().map_err(|_| malformed())?;
                let end: u32 = end.trim().parse().map_err(|_| malformed())?;
                let count = end.checked_sub(start).map_or(0, |span| span as usize + 1);
                if pages.len() + count > MAX_PAGES {
                    return Err(malformed());
                }
                pages.extend(start..=end);
            }
            None => {
                if pages.len() == MAX_PAGES {
                    return Err(malformed());
                }
                pages.push(token.parse().map_err(|_| malformed())?);
            }
        }
    }
    Ok(pages)
}
