//! Tests for configuration snapshot publication

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "This is a test module")]
mod tests {

    use prow_config::config::Config;
    use prow_config::config::agent::ConfigAgent;
    use prow_config::system::MockSystem;
    use std::sync::Arc;
    use std::thread;

    const JOBS: &str = "periodics:\n- name: foo\n  interval: 1h\n  spec:\n    containers:\n    - image: alpine\n";

    #[test]
    fn test_reload_publishes_new_snapshot() {
        let system = MockSystem::new()
            .with_file("/config.yaml", b"pod_namespace: first\n")
            .unwrap()
            .with_file("/jobs.yaml", JOBS.as_bytes())
            .unwrap();
        let agent = ConfigAgent::new(Config::load(&system, "/config.yaml", "/jobs.yaml").unwrap());
        let before = agent.config();

        system.write_file("/config.yaml", b"pod_namespace: second\n").unwrap();
        agent.reload(&system, "/config.yaml", "/jobs.yaml").unwrap();

        assert_eq!(before.prow_config.pod_namespace, "first");
        assert_eq!(agent.config().prow_config.pod_namespace, "second");
        assert_eq!(agent.config().all_periodics().len(), 1);
    }

    #[test]
    fn test_failed_reload_keeps_previous_snapshot() {
        let system = MockSystem::new()
            .with_file("/config.yaml", b"pod_namespace: first\n")
            .unwrap();
        let agent = ConfigAgent::new(Config::load(&system, "/config.yaml", "").unwrap());

        system
            .write_file("/config.yaml", b"deck:\n  spyglass:\n    size_limit: -4\n")
            .unwrap();
        assert!(agent.reload(&system, "/config.yaml", "").is_err());
        assert_eq!(agent.config().prow_config.pod_namespace, "first");
    }

    #[test]
    fn test_concurrent_readers_see_whole_snapshots() {
        let system = MockSystem::new()
            .with_file("/config.yaml", b"pod_namespace: ns\n")
            .unwrap();
        let agent = Arc::new(ConfigAgent::new(Config::default()));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let agent = Arc::clone(&agent);
                thread::spawn(move || {
                    for _ in 0..100 {
                        let namespace = agent.config().prow_config.pod_namespace.clone();
                        assert!(namespace == "default" || namespace == "ns", "{namespace}");
                    }
                })
            })
            .collect();

        for _ in 0..10 {
            agent.reload(&system, "/config.yaml", "").unwrap();
        }
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(agent.config().prow_config.pod_namespace, "ns");
    }
}
