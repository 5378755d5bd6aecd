//! Interactive control from standard input.
//!
//! A helper thread reads lines, parses them into [`Command`]s and sends
//! them over a channel; the frame loop drains the channel between frames
//! so the session is only ever touched from one thread.

use std::io::BufRead;
use std::path::PathBuf;
use std::thread;

use crossbeam_channel::{Receiver, unbounded};

/// A control panel action typed by the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Start plotting.
    Plot,
    /// Pause a running plot.
    Pause,
    /// Resume a paused plot.
    Resume,
    /// Stop and reset.
    Stop,
    /// Set speed (1-100).
    Speed(u32),
    /// Drop the image and path.
    Clear,
    /// Load another image.
    Load(PathBuf),
    /// Resize the machine.
    Size(f64, f64),
    /// Print the command list.
    Help,
    /// Leave the loop.
    Quit,
}

/// Command summary shown by `help`.
pub const HELP: &str = "commands: plot | pause | resume | stop | speed N | clear | load PATH | size W H | help | quit";

/// Parse one input line. Blank lines yield `Ok(None)`.
///
/// # Errors
///
/// Returns a message for unknown commands or bad arguments.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match (word.to_ascii_lowercase().as_str(), rest.as_slice()) {
        ("plot" | "start", []) => Command::Plot,
        ("pause", []) => Command::Pause,
        ("resume", []) => Command::Resume,
        ("stop", []) => Command::Stop,
        ("clear", []) => Command::Clear,
        ("help" | "?", []) => Command::Help,
        ("quit" | "exit" | "q", []) => Command::Quit,
        ("speed", [n]) => Command::Speed(
            n.parse()
                .map_err(|e| format!("speed expects a whole number: {e}"))?,
        ),
        ("load", [_, ..]) => Command::Load(PathBuf::from(rest.join(" "))),
        ("size", [w, h]) => {
            let parse = |s: &str| {
                s.parse::<f64>()
                    .map_err(|e| format!("size expects two numbers in mm: {e}"))
            };
            Command::Size(parse(w)?, parse(h)?)
        }
        (other, _) => return Err(format!("unrecognised command '{other}', try 'help'")),
    };
    Ok(Some(command))
}

/// Spawn a thread that forwards parsed stdin commands.
///
/// Parse errors are logged and skipped. The channel closes at end of
/// input; a `Quit` is sent first so the loop ends cleanly.
pub fn spawn_stdin_reader() -> Receiver<Command> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match parse_command(&line) {
                Ok(Some(command)) => {
                    if tx.send(command).is_err() {
                        return;
                    }
                }
                Ok(None) => {}
                Err(message) => tracing::warn!("{message}"),
            }
        }
        let _ = tx.send(Command::Quit);
    });
    rx
}
