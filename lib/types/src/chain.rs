use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Base URL of the L1 explorer that hosts root-anchor pages.
/// Relative root references are resolved against it.
pub const L1_EXPLORER_URL: &str = "https://etherscan.io";

/// Layer-2 chains whose explorers can be scraped.
///
/// The mapping from identifier to explorer is fixed: every supported identifier maps to exactly
/// one explorer and no two identifiers share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainId {
    Optimism,
    OptimismGoerli,
    Arbitrum,
    ArbitrumGoerli,
}

/// Explorer layouts. Chains of the same family are scraped with the same selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainFamily {
    Optimism,
    Arbitrum,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown chain id: {0}")]
pub struct UnknownChain(pub String);

impl ChainId {
    pub const ALL: [ChainId; 4] = [
        ChainId::Optimism,
        ChainId::OptimismGoerli,
        ChainId::Arbitrum,
        ChainId::ArbitrumGoerli,
    ];

    /// Numeric EIP-155 identifier, as it appears in requests and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainId::Optimism => "10",
            ChainId::OptimismGoerli => "420",
            ChainId::Arbitrum => "42161",
            ChainId::ArbitrumGoerli => "421613",
        }
    }

    pub fn explorer_url(&self) -> &'static str {
        match self {
            ChainId::Optimism => "https://optimistic.etherscan.io",
            ChainId::OptimismGoerli => "https://goerli-optimism.etherscan.io",
            ChainId::Arbitrum => "https://arbiscan.io",
            ChainId::ArbitrumGoerli => "https://goerli.arbiscan.io",
        }
    }

    pub fn family(&self) -> ChainFamily {
        match self {
            ChainId::Optimism | ChainId::OptimismGoerli => ChainFamily::Optimism,
            ChainId::Arbitrum | ChainId::ArbitrumGoerli => ChainFamily::Arbitrum,
        }
    }

    /// Listing page `page` of the most recent transactions, ten per page.
    pub fn listing_url(&self, page: u32) -> String {
        format!("{}/txs?ps=10&p={page}", self.explorer_url())
    }

    pub fn transaction_url(&self, hash: &crate::TransactionHash) -> String {
        format!("{}/tx/{}", self.explorer_url(), hash)
    }
}

impl FromStr for ChainId {
    type Err = UnknownChain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChainId::ALL
            .into_iter()
            .find(|chain| chain.as_str() == s)
            .ok_or_else(|| UnknownChain(s.to_owned()))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn mapping_is_total_and_injective() {
        let urls: HashSet<_> = ChainId::ALL.iter().map(ChainId::explorer_url).collect();
        assert_eq!(urls.len(), ChainId::ALL.len());

        for chain in ChainId::ALL {
            assert_eq!(chain.as_str().parse::<ChainId>(), Ok(chain));
        }
    }

    #[test]
    fn unknown_chain_is_rejected() {
        assert_eq!(
            "1".parse::<ChainId>(),
            Err(UnknownChain("1".to_owned()))
        );
        assert!("".parse::<ChainId>().is_err());
    }

    #[test]
    fn urls() {
        let hash = crate::TransactionHash::from("0xabc");
        assert_eq!(
            ChainId::Arbitrum.listing_url(3),
            "https://arbiscan.io/txs?ps=10&p=3"
        );
        assert_eq!(
            ChainId::Optimism.transaction_url(&hash),
            "https://optimistic.etherscan.io/tx/0xabc"
        );
        assert_eq!(ChainId::ArbitrumGoerli.family(), ChainFamily::Arbitrum);
        assert_eq!(ChainId::OptimismGoerli.family(), ChainFamily::Optimism);
    }
}
