use super::coordinator::{Coordinator, Directive, PlaybackEvent, SessionSnapshot};
use crate::audio::AudioElement;
use crate::session::SessionSummary;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

/// How often the active narration element is checked for its end
pub const ENDED_POLL_INTERVAL: Duration = Duration::from_millis(250);

const TICK_INTERVAL: Duration = Duration::from_secs(1);
const COMMAND_BUFFER: usize = 32;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("session is no longer running")]
    Closed,
}

struct Command {
    event: PlaybackEvent,
    reply: oneshot::Sender<SessionSnapshot>,
}

/// Control surface of a running session
///
/// Cloneable. When the last handle is dropped the session is torn down
/// without recording anything.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub async fn start(&self) -> Result<SessionSnapshot, DriverError> {
        self.send(PlaybackEvent::Start).await
    }

    pub async fn pause(&self) -> Result<SessionSnapshot, DriverError> {
        self.send(PlaybackEvent::Pause).await
    }

    pub async fn resume(&self) -> Result<SessionSnapshot, DriverError> {
        self.send(PlaybackEvent::Resume).await
    }

    pub async fn stop(&self) -> Result<SessionSnapshot, DriverError> {
        self.send(PlaybackEvent::Stop).await
    }

    pub async fn set_music_volume(&self, volume: f32) -> Result<SessionSnapshot, DriverError> {
        self.send(PlaybackEvent::SetMusicVolume(volume)).await
    }

    pub async fn set_voice_volume(&self, volume: f32) -> Result<SessionSnapshot, DriverError> {
        self.send(PlaybackEvent::SetVoiceVolume(volume)).await
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that wakes on every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    async fn send(&self, event: PlaybackEvent) -> Result<SessionSnapshot, DriverError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command { event, reply })
            .await
            .map_err(|_| DriverError::Closed)?;
        response.await.map_err(|_| DriverError::Closed)
    }
}

/// Run `coordinator` on its own task
///
/// The task resolves to the session summary on completion, or `None` if
/// every handle was dropped first.
pub fn spawn<E>(coordinator: Coordinator<E>) -> (SessionHandle, JoinHandle<Option<SessionSummary>>)
where
    E: AudioElement + 'static,
{
    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
    let (snapshots_tx, snapshots_rx) = watch::channel(coordinator.snapshot());

    let task = tokio::spawn(run(coordinator, commands_rx, snapshots_tx));

    (
        SessionHandle {
            commands: commands_tx,
            snapshots: snapshots_rx,
        },
        task,
    )
}

/// Timers owned by the driver on the coordinator's behalf
struct Timers {
    ticker: Option<Interval>,
    lead_in_token: Option<u64>,
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Event loop of one session
///
/// Every coordinator call happens here, in the order events arrive.
async fn run<E: AudioElement>(
    mut coordinator: Coordinator<E>,
    mut commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<SessionSnapshot>,
) -> Option<SessionSummary> {
    let mut timers = Timers {
        ticker: None,
        lead_in_token: None,
    };
    let lead_in = tokio::time::sleep(Duration::ZERO);
    tokio::pin!(lead_in);

    let mut ended_poll = tokio::time::interval(ENDED_POLL_INTERVAL);
    ended_poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    debug!("Session driver running in phase {}", coordinator.phase());

    loop {
        let (directives, reply) = tokio::select! {
            command = commands.recv() => match command {
                Some(Command { event, reply }) => {
                    (coordinator.handle(event, Instant::now()), Some(reply))
                }
                None => {
                    info!("Session handles dropped, tearing down");
                    return None;
                }
            },
            _ = next_tick(&mut timers.ticker) => {
                (coordinator.handle(PlaybackEvent::Tick, Instant::now()), None)
            }
            _ = &mut lead_in, if timers.lead_in_token.is_some() => {
                let directives = match timers.lead_in_token.take() {
                    Some(token) => coordinator.handle(PlaybackEvent::LeadInElapsed { token }, Instant::now()),
                    None => Vec::new(),
                };
                (directives, None)
            }
            _ = ended_poll.tick() => match coordinator.poll_ended() {
                Some(segment) => (coordinator.handle(PlaybackEvent::SegmentEnded(segment), Instant::now()), None),
                None => continue,
            },
        };

        let mut completed = None;
        for directive in directives {
            match directive {
                Directive::StartTicker => {
                    let mut ticker =
                        tokio::time::interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    timers.ticker = Some(ticker);
                }
                Directive::StopTicker => timers.ticker = None,
                Directive::ScheduleLeadIn { after, token } => {
                    lead_in.as_mut().reset(Instant::now() + after);
                    timers.lead_in_token = Some(token);
                }
                Directive::CancelLeadIn => timers.lead_in_token = None,
                Directive::Completed(summary) => completed = Some(summary),
            }
        }

        let snapshot = coordinator.snapshot();
        snapshots.send_replace(snapshot.clone());
        if let Some(reply) = reply {
            // The caller may have stopped waiting
            let _ = reply.send(snapshot);
        }

        if completed.is_some() {
            return completed;
        }
    }
}
