use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};
use serde_json::{json, Value};
use tak_sync::*;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

/// Each connection replays the next script, then stays open.
struct ScriptedTransport {
    scripts: VecDeque<Vec<TransportEvent>>,
    connects: Arc<Mutex<Vec<Instant>>>,
}

impl Transport for ScriptedTransport {
    fn connect(&mut self) -> BoxStream<'static, TransportEvent> {
        self.connects.lock().unwrap().push(Instant::now());
        let events = self.scripts.pop_front().unwrap_or_default();
        stream::iter(events).chain(stream::pending()).boxed()
    }
}

#[derive(Clone, Default)]
struct Recorder {
    viewer: Arc<Mutex<Vec<ViewerCommand>>>,
    chart: Arc<Mutex<Vec<ChartCommand>>>,
    status: Arc<Mutex<Vec<StatusNotice>>>,
    persisted: Arc<Mutex<BTreeMap<String, Value>>>,
}

impl ViewerWidget for Recorder {
    fn send(&mut self, command: ViewerCommand) {
        self.viewer.lock().unwrap().push(command);
    }
}

impl ChartSink for Recorder {
    fn apply(&mut self, command: ChartCommand) {
        self.chart.lock().unwrap().push(command);
    }
}

impl StatusSink for Recorder {
    fn notify(&mut self, notice: StatusNotice) {
        self.status.lock().unwrap().push(notice);
    }
}

impl PreferenceStore for Recorder {
    fn load(&self) -> BTreeMap<String, Value> {
        self.persisted.lock().unwrap().clone()
    }

    fn set(&mut self, key: &str, value: &Value) -> std::io::Result<()> {
        self.persisted
            .lock()
            .unwrap()
            .insert(key.to_string(), value.clone());
        Ok(())
    }
}

impl Recorder {
    fn collaborators(&self) -> Collaborators {
        Collaborators {
            viewer: Box::new(self.clone()),
            chart: Box::new(self.clone()),
            status: Box::new(self.clone()),
            preferences: Box::new(self.clone()),
        }
    }
}

fn snapshot(round: u64, moves: &[&str]) -> TransportEvent {
    let doc = json!({
        "roundNumber": round,
        "openingTps": "x6/x6/x6/x6/x6/x6 1 1",
        "whitePlayer": "Tiltak",
        "blackPlayer": "Topaz",
        "halfKomi": 5,
        "size": 6,
        "moves": moves.iter().map(|mv| json!({ "move": mv })).collect::<Vec<_>>(),
    });
    TransportEvent::Message(json!([{ "op": "replace", "path": "", "value": doc }]).to_string())
}

fn patch(ops: Value) -> TransportEvent {
    TransportEvent::Message(ops.to_string())
}

struct Harness {
    recorder: Recorder,
    connects: Arc<Mutex<Vec<Instant>>>,
    viewer_tx: mpsc::Sender<ViewerEvent>,
    shutdown_tx: oneshot::Sender<()>,
    handle: tokio::task::JoinHandle<SyncDriver>,
}

fn spawn(config: SyncConfig, scripts: Vec<Vec<TransportEvent>>) -> Harness {
    let recorder = Recorder::default();
    let connects = Arc::new(Mutex::new(Vec::new()));
    let transport = ScriptedTransport {
        scripts: scripts.into(),
        connects: connects.clone(),
    };
    let (viewer_tx, viewer_rx) = mpsc::channel(16);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let runner = Runner::new(config, transport, recorder.collaborators());
    let handle = tokio::spawn(runner.run(viewer_rx, async {
        let _ = shutdown_rx.await;
    }));

    Harness {
        recorder,
        connects,
        viewer_tx,
        shutdown_tx,
        handle,
    }
}

impl Harness {
    async fn stop(self) -> (Recorder, Vec<Instant>, SyncDriver) {
        let _ = self.shutdown_tx.send(());
        let driver = self.handle.await.unwrap();
        let connects = self.connects.lock().unwrap().clone();
        (self.recorder, connects, driver)
    }
}

#[tokio::test(start_paused = true)]
async fn streams_game_into_viewer() {
    let harness = spawn(
        SyncConfig::default(),
        vec![vec![
            TransportEvent::Opened,
            snapshot(5, &["a1", "f6"]),
            patch(json!([{ "op": "add", "path": "/moves/-", "value": { "move": "c3" } }])),
        ]],
    );

    harness
        .viewer_tx
        .send(ViewerEvent::GameState(ViewerSyncState::default()))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let (recorder, connects, driver) = harness.stop().await;
    assert_eq!(connects.len(), 1);
    assert_eq!(driver.connection(), ConnectionState::Streaming);
    assert_eq!(driver.document().unwrap().moves.len(), 3);
    assert!(driver.ptn().ends_with("[Komi \"2.5\"]\na1 f6 c3"));

    let viewer = recorder.viewer.lock().unwrap();
    assert!(matches!(viewer[0], ViewerCommand::SetCurrentPtn(ref ptn) if ptn.ends_with("a1 f6")));
    assert!(viewer.contains(&ViewerCommand::AppendPly("c3".to_string())));
    assert_eq!(viewer.last(), Some(&ViewerCommand::Last));

    let status = recorder.status.lock().unwrap();
    assert_eq!(status[0], StatusNotice::Connecting);
    assert_eq!(status[1], StatusNotice::Connected);
}

#[tokio::test(start_paused = true)]
async fn failed_patch_reconnects_after_fixed_delay() {
    let config = SyncConfig {
        retry_delay: Duration::from_millis(500),
        wait_for_viewer: false,
        ..Default::default()
    };
    let harness = spawn(
        config,
        vec![
            vec![
                TransportEvent::Opened,
                snapshot(1, &["a1"]),
                patch(json!([{ "op": "test", "path": "/roundNumber", "value": 9 }])),
            ],
            vec![TransportEvent::Opened, snapshot(1, &["a1", "f6"])],
        ],
    );

    tokio::time::sleep(Duration::from_secs(5)).await;

    let (recorder, connects, driver) = harness.stop().await;
    assert_eq!(connects.len(), 2);
    assert_eq!(connects[1] - connects[0], Duration::from_millis(500));
    assert_eq!(driver.connection(), ConnectionState::Streaming);
    assert_eq!(driver.document().unwrap().moves.len(), 2);

    let status = recorder.status.lock().unwrap();
    assert!(status
        .iter()
        .any(|notice| matches!(notice, StatusNotice::ConnectionLost(_))));
}

#[tokio::test(start_paused = true)]
async fn stream_end_counts_as_failure() {
    struct EndingTransport {
        connects: Arc<Mutex<Vec<Instant>>>,
    }

    impl Transport for EndingTransport {
        fn connect(&mut self) -> BoxStream<'static, TransportEvent> {
            self.connects.lock().unwrap().push(Instant::now());
            stream::iter(vec![TransportEvent::Opened]).boxed()
        }
    }

    let connects = Arc::new(Mutex::new(Vec::new()));
    let recorder = Recorder::default();
    let config = SyncConfig {
        wait_for_viewer: false,
        ..Default::default()
    };
    let runner = Runner::new(
        config,
        EndingTransport {
            connects: connects.clone(),
        },
        recorder.collaborators(),
    );
    let (_viewer_tx, viewer_rx) = mpsc::channel(1);

    // three attempts fit into 4.5s with the default 2s delay
    runner
        .run(viewer_rx, tokio::time::sleep(Duration::from_millis(4500)))
        .await;

    assert_eq!(connects.lock().unwrap().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn viewer_settings_are_persisted() {
    let harness = spawn(SyncConfig::default(), vec![]);
    harness
        .viewer_tx
        .send(ViewerEvent::GameState(ViewerSyncState::default()))
        .await
        .unwrap();
    harness
        .viewer_tx
        .send(ViewerEvent::SetUi(BTreeMap::from([(
            "themeID".to_string(),
            json!("dark"),
        )])))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let (recorder, _, _) = harness.stop().await;
    assert_eq!(
        recorder.persisted.lock().unwrap().get("themeID"),
        Some(&json!("dark"))
    );
}
