//! Terminal front end
//!
//! Raw-mode keypress loop over the shared transport. Keys resolve into the
//! same symbolic command set as the HTTP routes; the display is whatever the
//! transport's `displayed_text` composition says to draw, redrawn on a fixed
//! refresh delay. Runs on a blocking thread and exits when the session ends.

use std::io::Write;
use std::time::Duration;

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind},
    queue,
    style::Print,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::debug;

use crate::commands::{self, Command};
use crate::error::Result;
use crate::playback::SharedTransport;

/// Map a keypress to a symbolic command; unmapped keys are ignored
fn key_command(code: KeyCode) -> Option<Command> {
    match code {
        KeyCode::Up => Some(Command::VolumeUp),
        KeyCode::Down => Some(Command::VolumeDown),
        KeyCode::Right => Some(Command::Skip),
        KeyCode::Left => Some(Command::Previous),
        KeyCode::Char(' ') => Some(Command::PauseUnpause),
        KeyCode::Char('s') | KeyCode::Char('q') => Some(Command::Stop),
        _ => None,
    }
}

/// Run the terminal front end until the session ends
pub fn run(transport: SharedTransport, refresh: Duration) -> Result<()> {
    let mut stdout = std::io::stdout();
    terminal::enable_raw_mode()?;
    queue!(stdout, EnterAlternateScreen, cursor::Hide)?;
    stdout.flush()?;

    let result = event_loop(&transport, refresh, &mut stdout);

    // Best-effort restore; the error that matters is the loop's.
    let _ = queue!(stdout, cursor::Show, LeaveAlternateScreen);
    let _ = stdout.flush();
    let _ = terminal::disable_raw_mode();
    result
}

fn event_loop(
    transport: &SharedTransport,
    refresh: Duration,
    stdout: &mut std::io::Stdout,
) -> Result<()> {
    loop {
        {
            let mut t = transport.blocking_lock();
            if t.is_stopped() {
                return Ok(());
            }
            let (columns, lines) = terminal::size()?;
            queue!(stdout, Clear(ClearType::All))?;
            for (text, position) in t.displayed_text(columns, lines) {
                queue!(stdout, cursor::MoveTo(position.x, position.y), Print(text))?;
            }
        }
        stdout.flush()?;

        if event::poll(refresh)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key_command(key.code) {
                    Some(command) => {
                        let mut t = transport.blocking_lock();
                        commands::apply_logged(&mut t, command);
                    }
                    None => debug!("unmapped key: {:?}", key.code),
                }
            }
        }
    }
}
