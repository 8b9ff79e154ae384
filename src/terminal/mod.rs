//! Terminal presentation of a running session
//!
//! Renders snapshots and turns typed commands into `SessionHandle` calls.
//! All timing lives in the driver.

use crate::playback::{SessionHandle, SessionPhase, SessionSnapshot};
use anyhow::Result;
use std::io::{BufRead, Write};
use tokio::sync::mpsc;
use tracing::{debug, warn};

const INPUT_BUFFER: usize = 16;

pub const HELP: &str =
    "commands: start | pause | resume | stop | music <0-1> | voice <0-1> | quit";

/// Something the user asked for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    Start,
    Pause,
    Resume,
    Stop,
    MusicVolume(f32),
    VoiceVolume(f32),
    Quit,
    Help,
}

/// Parse one line of input; `None` for anything unrecognised
pub fn parse_intent(line: &str) -> Option<Intent> {
    let mut words = line.split_whitespace();
    let command = words.next()?.to_ascii_lowercase();
    let mut volume = || words.next().and_then(|v| v.parse::<f32>().ok());

    match command.as_str() {
        "start" | "s" => Some(Intent::Start),
        "pause" | "p" => Some(Intent::Pause),
        "resume" | "r" => Some(Intent::Resume),
        "stop" => Some(Intent::Stop),
        "music" | "m" => volume().map(Intent::MusicVolume),
        "voice" | "v" => volume().map(Intent::VoiceVolume),
        "quit" | "q" | "exit" => Some(Intent::Quit),
        "help" | "h" | "?" => Some(Intent::Help),
        _ => None,
    }
}

/// `m:ss`
pub fn format_clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// One status line for `snapshot`
pub fn render(snapshot: &SessionSnapshot) -> String {
    match snapshot.phase {
        SessionPhase::Loading => "Preparing your meditation...".to_string(),
        SessionPhase::Ready => format!(
            "Ready: {} session. Type `start` to begin.",
            format_clock(snapshot.total_secs)
        ),
        SessionPhase::Playing => format!(
            "{} remaining  [{}]  music {:.0}%  voice {:.0}%",
            format_clock(snapshot.remaining_secs),
            snapshot
                .active_segment
                .map_or("music", |segment| segment.as_str()),
            snapshot.music_volume * 100.0,
            snapshot.voice_volume * 100.0
        ),
        SessionPhase::Paused => format!(
            "Paused with {} remaining. Type `resume` to continue.",
            format_clock(snapshot.remaining_secs)
        ),
        SessionPhase::Completed => format!(
            "Session complete: {} meditated ({} min credited).",
            format_clock(snapshot.elapsed_secs),
            snapshot.elapsed_secs / 60
        ),
    }
}

/// Lines typed on stdin
///
/// Read on a plain thread so a pending read never holds up process exit.
/// The receiver closes at end of input.
pub fn stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(INPUT_BUFFER);

    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });

    rx
}

/// Drive `handle` from stdin until the session completes or the user quits
///
/// Returns true when the session reached completion.
pub async fn present(handle: SessionHandle, autostart: bool) -> Result<bool> {
    present_from(handle, autostart, stdin_lines()).await
}

/// Drive `handle` from `input` lines
pub async fn present_from(
    handle: SessionHandle,
    autostart: bool,
    mut input: mpsc::Receiver<String>,
) -> Result<bool> {
    let mut snapshots = handle.subscribe();
    let mut input_open = true;

    println!("{}", render(&handle.snapshot()));
    println!("{}", HELP);

    if autostart {
        handle.start().await?;
    }

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    // Driver finished
                    return Ok(handle.snapshot().phase.is_terminal());
                }
                let snapshot = snapshots.borrow_and_update().clone();
                print_status(&snapshot);
                if snapshot.phase.is_terminal() {
                    println!();
                    return Ok(true);
                }
            }
            line = input.recv(), if input_open => {
                let Some(line) = line else {
                    debug!("Input closed; waiting for the session timer");
                    input_open = false;
                    continue;
                };

                let result = match parse_intent(&line) {
                    Some(Intent::Start) => handle.start().await,
                    Some(Intent::Pause) => handle.pause().await,
                    Some(Intent::Resume) => handle.resume().await,
                    Some(Intent::Stop) => handle.stop().await,
                    Some(Intent::MusicVolume(v)) => handle.set_music_volume(v).await,
                    Some(Intent::VoiceVolume(v)) => handle.set_voice_volume(v).await,
                    Some(Intent::Quit) => {
                        println!("\nLeaving without recording this session.");
                        return Ok(false);
                    }
                    Some(Intent::Help) => {
                        println!("{}", HELP);
                        continue;
                    }
                    None => {
                        if !line.trim().is_empty() {
                            println!("Unknown command. {}", HELP);
                        }
                        continue;
                    }
                };

                if result.is_err() {
                    return Ok(handle.snapshot().phase.is_terminal());
                }
            }
        }
    }
}

fn print_status(snapshot: &SessionSnapshot) {
    let mut stdout = std::io::stdout();
    // Countdown redraws in place
    let _ = write!(stdout, "\r\x1b[2K{}", render(snapshot));
    let _ = stdout.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narration::Segment;

    fn snapshot(phase: SessionPhase) -> SessionSnapshot {
        SessionSnapshot {
            phase,
            elapsed_secs: 65,
            total_secs: 137,
            remaining_secs: 72,
            active_segment: Some(Segment::Main),
            music_volume: 0.4,
            voice_volume: 0.9,
        }
    }

    #[test]
    fn test_parse_intent() {
        assert_eq!(parse_intent("start"), Some(Intent::Start));
        assert_eq!(parse_intent("  Pause "), Some(Intent::Pause));
        assert_eq!(parse_intent("music 0.25"), Some(Intent::MusicVolume(0.25)));
        assert_eq!(parse_intent("voice"), None);
        assert_eq!(parse_intent("voice loud"), None);
        assert_eq!(parse_intent("q"), Some(Intent::Quit));
        assert_eq!(parse_intent(""), None);
        assert_eq!(parse_intent("dance"), None);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(137), "2:17");
        assert_eq!(format_clock(600), "10:00");
    }

    #[test]
    fn test_render_by_phase() {
        assert_eq!(
            render(&snapshot(SessionPhase::Ready)),
            "Ready: 2:17 session. Type `start` to begin."
        );
        assert_eq!(
            render(&snapshot(SessionPhase::Playing)),
            "1:12 remaining  [main]  music 40%  voice 90%"
        );
        assert!(render(&snapshot(SessionPhase::Paused)).starts_with("Paused with 1:12"));
        assert_eq!(
            render(&snapshot(SessionPhase::Completed)),
            "Session complete: 1:05 meditated (1 min credited)."
        );
    }
}
