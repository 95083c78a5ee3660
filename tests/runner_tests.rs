//! Runner integration tests
//!
//! Backends come from TOML through a registry holding a `recorder` type. Recorders
//! append `start:<name>` / `end:<name>` to a shared event list kept in the
//! state store, which is also what backends use to share data.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bots::schedule::{self, Recurrence};
use bots::{
    Backend, BackendCore, BackendFilter, BackendLoader, BackendSet, BackendType, BuildError,
    ConfigSection, Registry, RunError, Runner, StateStore,
};
use chrono::NaiveDate;

const EVENTS: &str = "_events";

struct Recorder {
    core: BackendCore,
    delay: Duration,
    mode: String,
}

#[async_trait]
impl Backend for Recorder {
    fn core(&self) -> &BackendCore {
        &self.core
    }

    fn type_name(&self) -> &'static str {
        "recorder"
    }

    async fn run(&self, state: &StateStore) -> Result<(), RunError> {
        record(state, format!("start:{}", self.core.name));
        tokio::time::sleep(self.delay).await;
        record(state, format!("end:{}", self.core.name));

        match self.mode.as_str() {
            "fail" => Err(RunError::Failed(format!("{} failed on purpose", self.core.name))),
            "panic" => panic!("{} panicked on purpose", self.core.name),
            _ => Ok(()),
        }
    }
}

fn build_recorder(
    core: BackendCore,
    section: &mut ConfigSection,
) -> Result<Arc<dyn Backend>, BuildError> {
    let delay_ms = match section.take("delay_ms") {
        Some(raw) => raw.parse::<u64>().map_err(|e| BuildError::InvalidValue {
            key: "delay_ms".into(),
            reason: e.to_string(),
        })?,
        None => 0,
    };
    let mode = section.take("mode").unwrap_or_default();

    Ok(Arc::new(Recorder {
        core,
        delay: Duration::from_millis(delay_ms),
        mode,
    }))
}

fn record(state: &StateStore, event: String) {
    state.update(|data| {
        let mut events = data.get(EVENTS, "log").unwrap_or_default().to_string();
        events.push_str(&event);
        events.push(';');
        data.set(EVENTS, "log", events);
    });
}

fn events(state: &StateStore) -> Vec<String> {
    state
        .get_or(EVENTS, "log", "")
        .split(';')
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}

fn position(events: &[String], event: &str) -> usize {
    events
        .iter()
        .position(|e| e == event)
        .unwrap_or_else(|| panic!("missing {event} in {events:?}"))
}

fn loader() -> BackendLoader {
    let mut registry = Registry::with_builtins().unwrap();
    registry
        .register(BackendType {
            name: "recorder",
            summary: "Records start/end events",
            recurring: false,
            build: build_recorder,
        })
        .unwrap();
    BackendLoader::new(Arc::new(registry))
}

fn backends(config: &str) -> Arc<BackendSet> {
    Arc::new(loader().load_str(config, BackendFilter::All).unwrap())
}

fn fresh_state() -> StateStore {
    StateStore::with_data("unused.json", Default::default())
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_dependency_completes_before_dependent() {
    let set = backends(
        r#"
[report]
type = "recorder"
depends = ["fetch"]

[fetch]
type = "recorder"
delay_ms = 100
"#,
    );
    let state = fresh_state();

    let report = Runner::new(set, state.clone())
        .run(&names(&["report", "fetch"]))
        .await;

    assert!(report.all_succeeded());
    let events = events(&state);
    assert!(position(&events, "end:fetch") < position(&events, "start:report"));
}

#[tokio::test]
async fn test_diamond_waits_for_every_dependency() {
    let set = backends(
        r#"
[a]
type = "recorder"
delay_ms = 30

[b]
type = "recorder"
depends = ["a"]
delay_ms = 80

[c]
type = "recorder"
depends = ["a"]
delay_ms = 10

[d]
type = "recorder"
depends = ["b", "c"]
"#,
    );
    let state = fresh_state();

    let report = Runner::new(set, state.clone()).run_all().await;

    assert_eq!(report.len(), 4);
    let events = events(&state);
    assert!(position(&events, "end:a") < position(&events, "start:b"));
    assert!(position(&events, "end:a") < position(&events, "start:c"));
    assert!(position(&events, "end:b") < position(&events, "start:d"));
    assert!(position(&events, "end:c") < position(&events, "start:d"));
}

#[tokio::test]
async fn test_each_backend_runs_exactly_once() {
    let set = backends(
        r#"
[a]
type = "recorder"

[b]
type = "recorder"
depends = ["a"]

[c]
type = "recorder"
depends = ["a", "b"]
"#,
    );
    let state = fresh_state();

    Runner::new(set, state.clone())
        .run(&names(&["c", "b", "a", "c"]))
        .await;

    let events = events(&state);
    for name in ["a", "b", "c"] {
        let starts = events.iter().filter(|e| **e == format!("start:{name}")).count();
        assert_eq!(starts, 1, "{name} in {events:?}");
    }
}

#[tokio::test]
async fn test_failure_and_panic_release_dependents() {
    let set = backends(
        r#"
[flaky]
type = "recorder"
mode = "fail"

[crashy]
type = "recorder"
mode = "panic"

[after]
type = "recorder"
depends = ["flaky", "crashy"]
"#,
    );
    let state = fresh_state();

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        Runner::new(set, state.clone()).run_all(),
    )
    .await
    .expect("dependents of failed backends must still run");

    assert_eq!(report.len(), 3);
    assert_eq!(
        report.get("flaky").unwrap().error(),
        Some("flaky failed on purpose")
    );
    assert!(report
        .get("crashy")
        .unwrap()
        .error()
        .unwrap()
        .contains("panicked"));
    assert!(report.get("after").unwrap().is_success());
    assert!(events(&state).contains(&"end:after".to_string()));
}

#[tokio::test]
async fn test_unconfigured_name_does_not_block_batch() {
    let set = backends(
        r#"
[real]
type = "recorder"
"#,
    );

    let report = Runner::new(set, fresh_state())
        .run(&names(&["ghost", "real"]))
        .await;

    assert_eq!(report.len(), 2);
    assert!(report.get("real").unwrap().is_success());
    assert_eq!(
        report.get("ghost").unwrap().error(),
        Some("backend not configured")
    );
}

#[tokio::test]
async fn test_concurrent_state_writes_are_not_lost() {
    let config: String = (0..20)
        .map(|i| format!("[p{i}]\ntype = \"recorder\"\ndelay_ms = {}\n\n", i % 3))
        .collect();
    let set = backends(&config);
    let state = fresh_state();

    let report = Runner::new(set, state.clone()).run_all().await;

    assert_eq!(report.succeeded(), 20);
    assert_eq!(events(&state).len(), 40);
}

#[tokio::test]
async fn test_recurring_filter_and_gate_select_due_shell_backends() {
    let loader = loader();
    let config = r#"
[hourly]
type = "shell"
command = "true"
cron = "hourly"

[idle]
type = "shell"
command = "true"

[recorder]
type = "recorder"
"#;
    let set = Arc::new(loader.load_str(config, BackendFilter::Recurring).unwrap());
    assert_eq!(set.names(), ["hourly", "idle"]);
    assert_eq!(
        set.get("hourly").unwrap().recurrence(),
        Some(Recurrence::Hourly)
    );

    let state = fresh_state();
    let t0 = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();

    let due = schedule::due_backends(&set, &state, t0);
    assert_eq!(due, ["hourly"]);
    let report = Runner::new(Arc::clone(&set), state.clone()).run(&due).await;
    assert!(report.all_succeeded());

    assert!(schedule::due_backends(&set, &state, t0 + chrono::Duration::minutes(59)).is_empty());
    assert_eq!(
        schedule::due_backends(&set, &state, t0 + chrono::Duration::hours(1)),
        ["hourly"]
    );
}
