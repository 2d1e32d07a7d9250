//! Async event loop around [`SyncDriver`].

use std::future::Future;

use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::Instrument;

use crate::collaborators::{Collaborators, Transport};
use crate::commands::{Command, TransportEvent, ViewerEvent};
use crate::driver::{SyncConfig, SyncDriver};
use crate::retry::RetryTimer;

/// Owns the driver, the live transport stream and the reconnect timer.
/// Processes one input at a time, strictly in arrival order.
pub struct Runner<T: Transport> {
    driver: SyncDriver,
    transport: T,
    collaborators: Collaborators,
    stream: Option<BoxStream<'static, TransportEvent>>,
    retry: RetryTimer,
}

impl<T: Transport> Runner<T> {
    pub fn new(config: SyncConfig, transport: T, collaborators: Collaborators) -> Self {
        let preferences = collaborators.preferences.load();
        Self {
            driver: SyncDriver::new(config, preferences),
            transport,
            collaborators,
            stream: None,
            retry: RetryTimer::new(),
        }
    }

    /// Run until `shutdown` resolves. Returns the driver for inspection.
    pub async fn run<F>(self, viewer_events: mpsc::Receiver<ViewerEvent>, shutdown: F) -> SyncDriver
    where
        F: Future<Output = ()>,
    {
        self.run_inner(viewer_events, shutdown)
            .instrument(tracing::info_span!("sync"))
            .await
    }

    async fn run_inner<F>(
        mut self,
        mut viewer_events: mpsc::Receiver<ViewerEvent>,
        shutdown: F,
    ) -> SyncDriver
    where
        F: Future<Output = ()>,
    {
        tracing::info!("Sync loop started");
        tokio::pin!(shutdown);

        let commands = self.driver.start();
        self.execute(commands);

        let mut viewer_open = true;
        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => break,

                event = viewer_events.recv(), if viewer_open => match event {
                    Some(event) => {
                        let commands = self.driver.on_viewer(event);
                        self.execute(commands);
                    }
                    None => {
                        tracing::debug!("Viewer channel closed");
                        viewer_open = false;
                    }
                },

                event = next_event(&mut self.stream) => {
                    let event = event.unwrap_or_else(|| {
                        self.stream = None;
                        TransportEvent::Closed
                    });
                    let commands = self.driver.on_transport(event);
                    self.execute(commands);
                }

                _ = self.retry.elapsed() => {
                    let commands = self.driver.on_retry_elapsed();
                    self.execute(commands);
                }
            }
        }

        self.retry.cancel();
        self.stream = None;
        tracing::info!("Sync loop exited");
        self.driver
    }

    fn execute(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::Connect => {
                    self.retry.cancel();
                    self.stream = Some(self.transport.connect());
                }
                Command::Disconnect => self.stream = None,
                Command::ScheduleReconnect(delay) => self.retry.schedule(delay),
                Command::Viewer(command) => self.collaborators.viewer.send(command),
                Command::Chart(command) => self.collaborators.chart.apply(command),
                Command::Status(notice) => self.collaborators.status.notify(notice),
                Command::Persist { key, value } => {
                    if let Err(e) = self.collaborators.preferences.set(&key, &value) {
                        tracing::warn!(%key, error = %e, "Failed to persist preference");
                    }
                }
            }
        }
    }
}

/// Next event of the live stream; pending forever while there is none.
async fn next_event(stream: &mut Option<BoxStream<'static, TransportEvent>>) -> Option<TransportEvent> {
    match stream {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}
