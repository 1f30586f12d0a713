//! Synchronous extraction of owned values from parsed pages.

use finality_scraper_explorer::{HtmlPage, SYSTEM_ADDRESS, ScrapeError, Selectors};
use finality_scraper_types::parse::parse_timestamp;
use finality_scraper_types::{RootReference, TransactionHash, UnixMillis};

/// Outcome for one row of a transaction listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ListingRow {
    Transaction(TransactionHash),
    /// Sequencer-injected transaction.
    System,
}

pub(crate) fn listing_rows(
    page: &HtmlPage,
    selectors: &Selectors,
) -> Result<Vec<Result<ListingRow, ScrapeError>>, ScrapeError> {
    let body = page
        .first(selectors.listing_body)?
        .ok_or(ScrapeError::SelectorMiss {
            element: "transaction listing",
        })?;

    let mut rows = Vec::new();
    for row in body.find(selectors.listing_row)? {
        let from = row.first(selectors.from_address)?;
        let Some(from) = from else {
            rows.push(Err(ScrapeError::SelectorMiss {
                element: "from address",
            }));
            continue;
        };
        if from.text().trim() == SYSTEM_ADDRESS {
            rows.push(Ok(ListingRow::System));
            continue;
        }

        let hash = row
            .first(selectors.hash_link)?
            .map(|link| link.text().trim().to_owned())
            .filter(|hash| !hash.is_empty());
        rows.push(match hash {
            Some(hash) => Ok(ListingRow::Transaction(hash.into())),
            None => Err(ScrapeError::SelectorMiss {
                element: "transaction hash",
            }),
        });
    }
    Ok(rows)
}

/// Values scraped from a transaction detail page. Each one fails independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Detail {
    pub start: Result<UnixMillis, ScrapeError>,
    pub reference: Result<RootReference, ScrapeError>,
}

pub(crate) fn detail(page: &HtmlPage, selectors: &Selectors) -> Detail {
    let start = timestamp_at(page, selectors.start_timestamp, "start timestamp");
    let reference = page
        .first(selectors.root_reference)
        .and_then(|link| {
            link.ok_or(ScrapeError::SelectorMiss {
                element: "root reference",
            })
        })
        .and_then(|link| {
            link.attr("href").ok_or(ScrapeError::AttributeMissing {
                element: "root reference",
                attribute: "href",
            })
        })
        .map(RootReference::from);
    Detail { start, reference }
}

pub(crate) fn timestamp_at(
    page: &HtmlPage,
    selector: &str,
    element: &'static str,
) -> Result<UnixMillis, ScrapeError> {
    let text = page
        .first(selector)?
        .ok_or(ScrapeError::SelectorMiss { element })?
        .text();
    Ok(parse_timestamp(&text)?.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use finality_scraper_types::ChainFamily;
    use finality_scraper_types::parse::TimestampError;

    fn selectors() -> &'static Selectors {
        Selectors::for_family(ChainFamily::Optimism)
    }

    fn listing_row(hash: Option<&str>, from: &str) -> String {
        let link = hash.map_or(String::new(), |hash| format!("<a href=\"/tx/{hash}\">{hash}</a>"));
        format!(
            "<tr><td></td><td>{link}</td><td></td><td></td><td></td><td></td><td>{from}</td></tr>"
        )
    }

    #[test]
    fn listing_classifies_rows() {
        let body = format!(
            "<table><tbody>{}{}{}<tr><td>short</td></tr></tbody></table>",
            listing_row(Some("0xaa"), "0xsender"),
            listing_row(Some("0xbb"), " System Address "),
            listing_row(None, "0xsender"),
        );
        let rows = listing_rows(&HtmlPage::parse(&body), selectors()).unwrap();
        assert_eq!(
            rows,
            vec![
                Ok(ListingRow::Transaction("0xaa".into())),
                Ok(ListingRow::System),
                Err(ScrapeError::SelectorMiss {
                    element: "transaction hash"
                }),
                Err(ScrapeError::SelectorMiss {
                    element: "from address"
                }),
            ]
        );
    }

    #[test]
    fn listing_without_table() {
        let err = listing_rows(&HtmlPage::parse("<p>rate limited</p>"), selectors()).unwrap_err();
        assert!(matches!(err, ScrapeError::SelectorMiss { .. }));
    }

    #[test]
    fn detail_fields_fail_independently() {
        let body = r#"
            <div id="ContentPlaceHolder1_divTimeStamp"><div><div>Timestamp:</div><div>
              5 mins ago (Jan-05-2024 09:15:30 PM +UTC)
            </div></div></div>
            <div id="ContentPlaceHolder1_l1TransactionRow"><div><div>L1 Tx:</div><div>
              <a>0xroot</a>
            </div></div></div>
        "#;
        let detail = detail(&HtmlPage::parse(body), selectors());
        assert_eq!(detail.start, Ok(1_704_489_330_000));
        assert_eq!(
            detail.reference,
            Err(ScrapeError::AttributeMissing {
                element: "root reference",
                attribute: "href"
            })
        );
    }

    #[test]
    fn unparsable_timestamp() {
        let page = HtmlPage::parse(r#"<span id="showUtcLocalDate">Foo-05-2024 09:15:30 AM</span>"#);
        assert_eq!(
            timestamp_at(&page, "#showUtcLocalDate", "root timestamp"),
            Err(ScrapeError::Timestamp(TimestampError::UnknownMonth(
                "Foo".to_owned()
            )))
        );
        assert_eq!(
            timestamp_at(&page, "#other", "root timestamp"),
            Err(ScrapeError::SelectorMiss {
                element: "root timestamp"
            })
        );
    }
}
