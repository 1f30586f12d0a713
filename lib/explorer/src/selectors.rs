use finality_scraper_types::ChainFamily;

/// Locations of the scraped values on an L2 explorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selectors {
    /// Body of the transaction listing table. Only the first match is used.
    pub listing_body: &'static str,
    pub listing_row: &'static str,
    /// Cell holding the originating address, relative to a row.
    pub from_address: &'static str,
    /// Link holding the transaction hash, relative to a row.
    pub hash_link: &'static str,
    pub start_timestamp: &'static str,
    /// Link to the L1 transaction that anchors the batch.
    pub root_reference: &'static str,
}

/// Finalization timestamp on the L1 root-anchor page.
pub const ROOT_ANCHOR_TIMESTAMP: &str = "#showUtcLocalDate";

/// Origin shown for sequencer-injected transactions, which are not measured.
pub const SYSTEM_ADDRESS: &str = "System Address";

const ETHERSCAN_LAYOUT: Selectors = Selectors {
    listing_body: "tbody",
    listing_row: "tr",
    from_address: "td:nth-child(7)",
    hash_link: "td:nth-child(2) a",
    start_timestamp: "#ContentPlaceHolder1_divTimeStamp > div > div:last-child",
    root_reference: "#ContentPlaceHolder1_l1TransactionRow > div > div:last-child > a",
};

impl Selectors {
    pub fn for_family(family: ChainFamily) -> &'static Selectors {
        match family {
            // Both explorers are Etherscan deployments.
            ChainFamily::Optimism | ChainFamily::Arbitrum => &ETHERSCAN_LAYOUT,
        }
    }
}
