use scraper::{ElementRef, Html, Selector};

use crate::ScrapeError;

/// Parsed explorer page, queryable by CSS selector.
///
/// The underlying DOM is not `Send`; extract owned values from it before the next `.await`.
pub struct HtmlPage {
    document: Html,
}

/// Element of an [`HtmlPage`].
#[derive(Debug, Clone, Copy)]
pub struct Element<'a>(ElementRef<'a>);

impl HtmlPage {
    pub fn parse(body: &str) -> Self {
        Self {
            document: Html::parse_document(body),
        }
    }

    /// First element matching `selector` in document order.
    pub fn first(&self, selector: &str) -> Result<Option<Element<'_>>, ScrapeError> {
        let selector = compile(selector)?;
        Ok(self.document.select(&selector).next().map(Element))
    }

    pub fn find(&self, selector: &str) -> Result<Vec<Element<'_>>, ScrapeError> {
        let selector = compile(selector)?;
        Ok(self.document.select(&selector).map(Element).collect())
    }
}

impl std::fmt::Debug for HtmlPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlPage").finish_non_exhaustive()
    }
}

impl<'a> Element<'a> {
    /// First descendant matching `selector`.
    pub fn first(&self, selector: &str) -> Result<Option<Element<'a>>, ScrapeError> {
        let selector = compile(selector)?;
        Ok(self.0.select(&selector).next().map(Element))
    }

    pub fn find(&self, selector: &str) -> Result<Vec<Element<'a>>, ScrapeError> {
        let selector = compile(selector)?;
        Ok(self.0.select(&selector).map(Element).collect())
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.0.value().attr(name)
    }

    /// Concatenated text of the element and its descendants.
    pub fn text(&self) -> String {
        self.0.text().collect()
    }
}

fn compile(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|_| ScrapeError::InvalidSelector(selector.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <table><tbody>
            <tr><td>1</td><td><a href="/tx/0x01">0x01</a></td></tr>
            <tr><td>2</td><td><a>0x02</a></td></tr>
          </tbody></table>
          <div id="stamp"><span>Jan-05-2024</span> <span>09:15:30 AM</span></div>
        </body></html>
    "#;

    #[test]
    fn queries() {
        let page = HtmlPage::parse(PAGE);
        let rows = page.first("tbody").unwrap().unwrap().find("tr").unwrap();
        assert_eq!(rows.len(), 2);

        let link = rows[0].first("td:nth-child(2) a").unwrap().unwrap();
        assert_eq!(link.attr("href"), Some("/tx/0x01"));
        assert_eq!(link.text(), "0x01");
        let link = rows[1].first("td:nth-child(2) a").unwrap().unwrap();
        assert_eq!(link.attr("href"), None);

        let stamp = page.first("#stamp").unwrap().unwrap();
        assert_eq!(stamp.text(), "Jan-05-2024 09:15:30 AM");
        assert!(page.first("#missing").unwrap().is_none());
    }

    #[test]
    fn invalid_selector() {
        let page = HtmlPage::parse(PAGE);
        assert_eq!(
            page.first("<<<").unwrap_err(),
            ScrapeError::InvalidSelector("<<<".to_owned())
        );
    }
}
