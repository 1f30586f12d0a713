use finality_scraper::scan::run_scan;
use finality_scraper_integration_tests::times::{T0, T0_MS, T10, T10_MS, T20, T20_MS};
use finality_scraper_integration_tests::{Tester, anchor_url, transaction_url};
use finality_scraper_latency_store::{AggregateError, LatencyStore};
use finality_scraper_types::{ChainId, LatencyRecord};

const CHAIN: ChainId = ChainId::Arbitrum;

#[test_log::test(tokio::test)]
async fn scan_persists_and_reports() -> anyhow::Result<()> {
    let tester = Tester::setup()?;
    tester.listing(
        CHAIN,
        1,
        &[("0x01", "0xsender"), ("0x02", "0xsender"), ("0xsys", "System Address")],
    );
    tester.listing(CHAIN, 2, &[("0x03", "0xsender")]);
    tester.transaction(CHAIN, "0x01", Some(T0), Some("/tx/0xbatch1"));
    tester.transaction(CHAIN, "0x02", Some(T0), Some("/tx/0xbatch1"));
    tester.transaction(CHAIN, "0x03", Some(T0), Some("/tx/0xbatch2"));
    tester.anchor("/tx/0xbatch1", T10);
    tester.anchor("/tx/0xbatch2", T20);

    let report = run_scan(&tester.scan_config(CHAIN, "1-2"), tester.explorer()).await?;

    assert_eq!(report.flushed, 3);
    assert_eq!(report.stats.count, 3);
    assert_eq!(report.stats.max_ms, 1_200_000.0);
    assert_eq!(report.stats.mean_ms, 800_000.0);
    assert_eq!(
        report.summary(),
        "Avg latency: 800.00s (13mins 20s); Max: 1200.00s (20mins)"
    );
    assert_eq!(tester.fetcher.fetch_count(&anchor_url("/tx/0xbatch1")), 1);

    let store = LatencyStore::open(tester.log_path())?;
    assert_eq!(
        store.get(&"0x03".into()),
        Some(LatencyRecord::new(T0_MS, T20_MS))
    );
    assert_eq!(
        store.get(&"0x01".into()),
        Some(LatencyRecord::new(T0_MS, T10_MS))
    );
    Ok(())
}

#[test_log::test(tokio::test)]
async fn rescan_appends_only_new_hashes() -> anyhow::Result<()> {
    let tester = Tester::setup()?;
    tester.listing(CHAIN, 1, &[("0x01", "0xsender")]);
    tester.transaction(CHAIN, "0x01", Some(T0), Some("/tx/0xbatch1"));
    tester.anchor("/tx/0xbatch1", T10);

    let first = run_scan(&tester.scan_config(CHAIN, "1"), tester.explorer()).await?;
    assert_eq!(first.flushed, 1);

    tester.listing(CHAIN, 1, &[("0x01", "0xsender"), ("0x02", "0xsender")]);
    tester.transaction(CHAIN, "0x02", Some(T10), Some("/tx/0xbatch2"));
    tester.anchor("/tx/0xbatch2", T20);
    let second = run_scan(&tester.scan_config(CHAIN, "1"), tester.explorer()).await?;

    assert_eq!(second.flushed, 1);
    assert_eq!(second.stats.count, 2);
    // The persisted hash is not scraped again.
    assert_eq!(tester.fetcher.fetch_count(&transaction_url(CHAIN, "0x01")), 1);
    let log = std::fs::read_to_string(tester.log_path())?;
    assert_eq!(log.lines().count(), 4);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn failed_hashes_are_not_persisted() -> anyhow::Result<()> {
    let tester = Tester::setup()?;
    tester.listing(
        CHAIN,
        1,
        &[("0xgood", "0xsender"), ("0xnoanchor", "0xsender"), ("0xnostart", "0xsender")],
    );
    tester.transaction(CHAIN, "0xgood", Some(T0), Some("/tx/0xbatch1"));
    tester.transaction(CHAIN, "0xnoanchor", Some(T0), Some("/tx/0xgone"));
    tester.transaction(CHAIN, "0xnostart", None, Some("/tx/0xbatch1"));
    tester.anchor("/tx/0xbatch1", T10);

    let report = run_scan(&tester.scan_config(CHAIN, "1"), tester.explorer()).await?;

    assert_eq!(report.flushed, 1);
    assert_eq!(report.stats.count, 1);
    let store = LatencyStore::open(tester.log_path())?;
    assert_eq!(store.len(), 1);
    assert!(store.contains(&"0xgood".into()));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn startup_errors_are_fatal() -> anyhow::Result<()> {
    let tester = Tester::setup()?;

    let mut config = tester.scan_config(CHAIN, "1");
    config.from_chain = "1".to_owned();
    let err = run_scan(&config, tester.explorer()).await.unwrap_err();
    assert!(err.to_string().contains("Unknown chain id"), "{err}");

    let config = tester.scan_config(CHAIN, "1,x");
    let err = run_scan(&config, tester.explorer()).await.unwrap_err();
    assert!(err.to_string().contains("Malformed page spec"), "{err}");
    assert_eq!(tester.fetcher.total_fetches(), 0);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn interrupted_scan_reports_nothing_new() -> anyhow::Result<()> {
    let tester = Tester::setup()?;
    tester.listing(CHAIN, 1, &[("0x01", "0xsender")]);
    tester.stop.cancel();

    let err = run_scan(&tester.scan_config(CHAIN, "1"), tester.explorer())
        .await
        .unwrap_err();
    assert_eq!(err.downcast_ref::<AggregateError>(), Some(&AggregateError::Empty));
    assert_eq!(tester.fetcher.total_fetches(), 0);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn orphan_log_row_is_not_paired_with_a_rescan() -> anyhow::Result<()> {
    let tester = Tester::setup()?;
    // A flush interrupted after the `start` row of 0xh.
    std::fs::write(tester.log_path(), format!("0xh,{T0_MS}\n"))?;
    tester.listing(CHAIN, 1, &[("0xh", "0xsender"), ("0x02", "0xsender")]);
    tester.transaction(CHAIN, "0xh", Some(T10), Some("/tx/0xbatch2"));
    tester.transaction(CHAIN, "0x02", Some(T10), Some("/tx/0xbatch2"));
    tester.anchor("/tx/0xbatch2", T20);

    let report = run_scan(&tester.scan_config(CHAIN, "1"), tester.explorer()).await?;

    assert_eq!(report.flushed, 1);
    assert_eq!(tester.fetcher.fetch_count(&transaction_url(CHAIN, "0xh")), 0);
    let store = LatencyStore::open(tester.log_path())?;
    assert_eq!(store.get(&"0xh".into()), None);
    assert_eq!(
        store.get(&"0x02".into()),
        Some(LatencyRecord::new(T10_MS, T20_MS))
    );
    let log = std::fs::read_to_string(tester.log_path())?;
    assert_eq!(log.lines().count(), 3);
    Ok(())
}
