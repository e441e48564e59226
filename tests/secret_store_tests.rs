//! Tests for the hot-reloading secret store

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "This is a test module")]
mod tests {

    use prow_config::error::ConfigError;
    use prow_config::secret::{IntervalTicker, ManualTicker, SecretStore};
    use prow_config::system::MockSystem;
    use std::fs;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    const TOKEN: &[u8] = b"121f3cb3e7f70feeb35f9204f5a988d7292c7ba1";
    const CHANGED_TOKEN: &[u8] = b"121f3cb3e7f70feeb35f9204f5a988d7292c7ba0";

    fn two_secrets() -> MockSystem {
        MockSystem::new()
            .with_file("/secrets/first", TOKEN)
            .unwrap()
            .with_file("/secrets/second", TOKEN)
            .unwrap()
    }

    #[test]
    fn test_start_reads_every_secret() {
        let (ticker, _handle) = ManualTicker::new();
        let store = SecretStore::start(
            Arc::new(two_secrets()),
            ["/secrets/first", "/secrets/second"],
            Box::new(ticker),
        )
        .unwrap();

        assert_eq!(store.get_secret("/secrets/first").as_deref(), Some(TOKEN));
        assert_eq!(store.get_secret("/secrets/second").as_deref(), Some(TOKEN));
        assert_eq!(store.get_secret("/secrets/unknown"), None);
    }

    #[test]
    fn test_tick_picks_up_changes() {
        let system = two_secrets();
        let (ticker, handle) = ManualTicker::new();
        let store = SecretStore::start(
            Arc::new(system.clone()),
            ["/secrets/first", "/secrets/second"],
            Box::new(ticker),
        )
        .unwrap();

        system.write_file("/secrets/first", CHANGED_TOKEN).unwrap();
        system.write_file("/secrets/second", CHANGED_TOKEN).unwrap();
        assert_eq!(store.get_secret("/secrets/first").as_deref(), Some(TOKEN));

        assert!(handle.tick());
        assert_eq!(store.get_secret("/secrets/first").as_deref(), Some(CHANGED_TOKEN));
        assert_eq!(store.get_secret("/secrets/second").as_deref(), Some(CHANGED_TOKEN));
    }

    #[test]
    fn test_failed_refresh_keeps_previous_value() {
        let system = two_secrets();
        let (ticker, handle) = ManualTicker::new();
        let store = SecretStore::start(
            Arc::new(system.clone()),
            ["/secrets/first", "/secrets/second"],
            Box::new(ticker),
        )
        .unwrap();

        system.remove_file("/secrets/first").unwrap();
        system.write_file("/secrets/second", CHANGED_TOKEN).unwrap();
        assert!(handle.tick());

        assert_eq!(store.get_secret("/secrets/first").as_deref(), Some(TOKEN));
        assert_eq!(store.get_secret("/secrets/second").as_deref(), Some(CHANGED_TOKEN));

        system.write_file("/secrets/first", CHANGED_TOKEN).unwrap();
        assert!(handle.tick());
        assert_eq!(store.get_secret("/secrets/first").as_deref(), Some(CHANGED_TOKEN));
    }

    #[test]
    fn test_start_fails_on_unreadable_secret() {
        let (ticker, _handle) = ManualTicker::new();
        let result = SecretStore::start(
            Arc::new(two_secrets()),
            ["/secrets/first", "/secrets/missing"],
            Box::new(ticker),
        );

        let err = result.err().unwrap();
        let config_err = err.downcast_ref::<ConfigError>().unwrap();
        assert!(matches!(config_err, ConfigError::Secret { .. }));
        assert!(err.to_string().contains("/secrets/missing"), "{err}");
    }

    #[test]
    fn test_stop_ends_refreshes_but_keeps_values() {
        let system = two_secrets();
        let (ticker, handle) = ManualTicker::new();
        let mut store = SecretStore::start(Arc::new(system.clone()), ["/secrets/first"], Box::new(ticker)).unwrap();

        store.stop();
        store.stop();
        assert!(!handle.tick());

        system.write_file("/secrets/first", CHANGED_TOKEN).unwrap();
        assert_eq!(store.get_secret("/secrets/first").as_deref(), Some(TOKEN));
    }

    #[test]
    fn test_interval_ticker_refreshes_in_background() {
        let system = two_secrets();
        let store = SecretStore::start(
            Arc::new(system.clone()),
            ["/secrets/first"],
            Box::new(IntervalTicker::new(Duration::from_millis(20))),
        )
        .unwrap();

        system.write_file("/secrets/first", CHANGED_TOKEN).unwrap();
        let updated = (0..100).any(|_| {
            if store.get_secret("/secrets/first").as_deref() == Some(CHANGED_TOKEN) {
                return true;
            }
            thread::sleep(Duration::from_millis(20));
            false
        });
        assert!(updated, "secret was not refreshed");
    }

    #[test]
    fn test_polling_store_follows_real_files() {
        let secret_dir = TempDir::new().unwrap();
        let first = secret_dir.path().join("firstTempSecret");
        let second = secret_dir.path().join("secondTempSecret");
        fs::write(&first, TOKEN).unwrap();
        fs::write(&second, TOKEN).unwrap();

        let store = SecretStore::start_polling([first.clone(), second.clone()]).unwrap();
        for path in [&first, &second] {
            assert_eq!(store.get_secret(path).as_deref(), Some(TOKEN));
        }

        fs::write(&first, CHANGED_TOKEN).unwrap();
        fs::write(&second, CHANGED_TOKEN).unwrap();

        let retries = 10;
        for path in [&first, &second] {
            let mut attempt = 0;
            while store.get_secret(path).as_deref() != Some(CHANGED_TOKEN) {
                assert!(attempt < retries, "secret {} was not updated", path.display());
                thread::sleep(Duration::from_millis(400));
                attempt += 1;
            }
        }
    }
}
