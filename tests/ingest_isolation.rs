// tests/ingest_isolation.rs
//
// One bad source never costs the others their results.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use async_trait::async_trait;

use job_board_watcher::ingest::types::{JobRecord, SourceAdapter, SourceKind};
use job_board_watcher::ingest::{run_once, FetchOptions, SourceStatus};

fn job(id: &str, source: &str) -> JobRecord {
    JobRecord {
        id: id.into(),
        title: format!("Posting {id}"),
        source: source.into(),
        url: format!("https://jobs.test/{id}"),
        extra: Default::default(),
    }
}

enum Behaviour {
    Return(Vec<&'static str>),
    Fail,
    Hang,
    Panic,
}

struct Scripted {
    name: &'static str,
    behaviour: Behaviour,
}

#[async_trait]
impl SourceAdapter for Scripted {
    async fn fetch_latest(&self) -> Result<Vec<JobRecord>> {
        match &self.behaviour {
            Behaviour::Return(ids) => Ok(ids.iter().map(|id| job(id, self.name)).collect()),
            Behaviour::Fail => bail!("{} non-2xx: 500 Internal Server Error", self.name),
            Behaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(vec![])
            }
            Behaviour::Panic => panic!("malformed payload in {}", self.name),
        }
    }
    fn name(&self) -> &str {
        self.name
    }
    fn kind(&self) -> SourceKind {
        SourceKind::ThirdParty
    }
}

fn adapter(name: &'static str, behaviour: Behaviour) -> Arc<dyn SourceAdapter> {
    Arc::new(Scripted { name, behaviour })
}

#[tokio::test]
async fn failures_timeouts_and_panics_are_isolated() {
    let adapters = vec![
        adapter("A", Behaviour::Return(vec!["a1", "a2"])),
        adapter("B", Behaviour::Fail),
        adapter("C", Behaviour::Hang),
        adapter("D", Behaviour::Panic),
        adapter("E", Behaviour::Return(vec!["e1"])),
    ];
    let opts = FetchOptions {
        timeout: Duration::from_millis(150),
        concurrency: 8,
    };

    let started = Instant::now();
    let out = run_once(&adapters, &opts).await;
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "hung source must be abandoned at the timeout"
    );

    let ids: Vec<_> = out.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a1", "a2", "e1"]);

    let names: Vec<_> = out.sources.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C", "D", "E"]);
    assert_eq!(out.sources[0].status, SourceStatus::Ok { count: 2 });
    assert!(matches!(&out.sources[1].status, SourceStatus::Failed { error } if error.contains("500")));
    assert_eq!(out.sources[2].status, SourceStatus::TimedOut);
    assert!(matches!(out.sources[3].status, SourceStatus::Failed { .. }));
    assert_eq!(out.sources[4].status, SourceStatus::Ok { count: 1 });
    assert_eq!(out.failed_sources().count(), 3);
}

#[tokio::test]
async fn every_source_failing_yields_empty_records() {
    let adapters = vec![adapter("A", Behaviour::Fail), adapter("B", Behaviour::Fail)];
    let out = run_once(&adapters, &FetchOptions::default()).await;
    assert!(out.records.is_empty());
    assert_eq!(out.failed_sources().count(), 2);
}

#[tokio::test]
async fn queued_sources_get_their_own_timeout_budget() {
    // With one slot, the second source waits for the first; its budget starts
    // only once it is running.
    struct Slow(&'static str);

    #[async_trait]
    impl SourceAdapter for Slow {
        async fn fetch_latest(&self) -> Result<Vec<JobRecord>> {
            tokio::time::sleep(Duration::from_millis(120)).await;
            Ok(vec![job(self.0, self.0)])
        }
        fn name(&self) -> &str {
            self.0
        }
        fn kind(&self) -> SourceKind {
            SourceKind::Workday
        }
    }

    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![Arc::new(Slow("x")), Arc::new(Slow("y"))];
    let opts = FetchOptions {
        timeout: Duration::from_millis(400),
        concurrency: 1,
    };
    let out = run_once(&adapters, &opts).await;
    assert!(out.sources.iter().all(|s| s.status.is_ok()));
    assert_eq!(out.records.len(), 2);
}

#[test]
fn source_status_serializes_with_a_status_tag() {
    let v = serde_json::to_value(SourceStatus::Ok { count: 3 }).unwrap();
    assert_eq!(v, serde_json::json!({"status": "ok", "count": 3}));
    let v = serde_json::to_value(SourceStatus::TimedOut).unwrap();
    assert_eq!(v, serde_json::json!({"status": "timed_out"}));
}
