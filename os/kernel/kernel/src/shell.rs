//! # Command shell
//!
//! A cooperative read-eval-print loop with a single state, *awaiting line*:
//!
//! ```text
//!            ┌──────── printable: append + echo (dropped when full)
//!            │  ┌───── backspace: remove last + erase (no-op when empty)
//!            ▼  ▼
//!  ─▶ [ awaiting line ] ── enter ─▶ dispatch ─▶ clear buffer ─▶ "> "
//!                                     │
//!                                     └─ reboot / halt leave the loop
//! ```
//!
//! Keys come from [`KeyboardDriver::poll`]; output goes to a [`Terminal`].

mod calc;
mod commands;
mod line;

pub use calc::{CalcError, Operator, evaluate};
pub use commands::{COMMANDS, Command, find};
pub use line::{LineBuffer, LineFull};

use crate::console::Terminal;
use crate::keyboard::{BACKSPACE, ENTER, KeyboardDriver};
use crate::status::StatusReport;
use core::fmt::Write;

pub const PROMPT: &str = "> ";

/// Characters a command line holds.
pub const LINE_CAPACITY: usize = 64;

pub const UNKNOWN_COMMAND: &str = "Unknown command. Type 'help' for a list of commands.";

/// What the loop does after a key.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Action {
    Continue,
    Reboot,
    Halt,
}

/// Everything the shell owns between keys.
#[derive(Debug, Clone)]
pub struct ShellState {
    line: LineBuffer<LINE_CAPACITY>,
    status: Option<StatusReport>,
}

impl ShellState {
    /// `status` is what the `status` command prints; `None` if the handoff
    /// block could not be read.
    #[must_use]
    pub const fn new(status: Option<StatusReport>) -> Self {
        Self {
            line: LineBuffer::new(),
            status,
        }
    }

    /// The line typed so far.
    #[must_use]
    pub fn line(&self) -> &str {
        self.line.as_str()
    }

    /// Feed one key.
    pub fn handle_key(&mut self, key: char, term: &mut dyn Terminal) -> Action {
        match key {
            ENTER => {
                term.put_byte(b'\n');
                let action = self.dispatch(self.line.as_str(), term);
                self.line.clear();
                if action == Action::Continue {
                    prompt(term);
                }
                action
            }
            BACKSPACE => {
                if self.line.pop().is_some() {
                    term.backspace();
                }
                Action::Continue
            }
            ' '..='~' => {
                let byte = u8::try_from(key).unwrap_or(b'?');
                match self.line.push(byte) {
                    Ok(()) => term.put_byte(byte),
                    Err(full) => log::trace!("{full}, dropping {key:?}"),
                }
                Action::Continue
            }
            _ => Action::Continue,
        }
    }

    /// Run the command named by the first word of `line`.
    ///
    /// Names must match exactly, and only commands that take an argument may
    /// be followed by one. An empty line does nothing.
    pub fn dispatch(&self, line: &str, term: &mut dyn Terminal) -> Action {
        let line = line.trim();
        if line.is_empty() {
            return Action::Continue;
        }
        let (name, argument) = line.split_once(' ').unwrap_or((line, ""));
        let argument = argument.trim();

        let result = match find(name) {
            Some(command) if command.takes_argument || argument.is_empty() => {
                log::debug!("command {name:?}");
                (command.run)(self, argument, term)
            }
            _ => writeln!(term, "{UNKNOWN_COMMAND}").map(|()| Action::Continue),
        };
        result.unwrap_or_else(|e| {
            log::warn!("output of {name:?} cut short: {e}");
            Action::Continue
        })
    }
}

/// Print the banner and the first prompt.
pub fn start(term: &mut dyn Terminal) {
    if let Err(e) = writeln!(term, "Type 'help' for a list of commands.") {
        log::warn!("banner not shown: {e}");
    }
    prompt(term);
}

fn prompt(term: &mut dyn Terminal) {
    if let Err(e) = term.write_str(PROMPT) {
        log::warn!("prompt not shown: {e}");
    }
}

/// Control over the interrupt that fills the pending-key slot.
///
/// The loop checks the slot with the interrupt held off and only sleeps
/// through [`enable_and_wait`](Self::enable_and_wait), which must re-enable
/// and wait as one step (`sti; hlt`). A key landing between the check and
/// the sleep then wakes the loop instead of waiting for the next one.
pub trait KeyInterrupts {
    /// Hold off the keyboard interrupt (`cli`).
    fn disable(&mut self);
    /// Let it through again (`sti`).
    fn enable(&mut self);
    /// Let it through and sleep until an interrupt arrives (`sti; hlt`).
    fn enable_and_wait(&mut self);
}

/// Poll `keyboard` and feed keys to `shell` until a command ends the loop.
///
/// Keys are handled with interrupts enabled; the loop only sleeps when the
/// slot was empty while `interrupts` held the producer off.
pub fn run<T: Terminal>(
    shell: &mut ShellState,
    term: &mut T,
    keyboard: &KeyboardDriver,
    interrupts: &mut impl KeyInterrupts,
) -> Action {
    loop {
        interrupts.disable();
        let Some(key) = keyboard.poll() else {
            interrupts.enable_and_wait();
            continue;
        };
        interrupts.enable();

        let action = shell.handle_key(key, term);
        if action != Action::Continue {
            return action;
        }
    }
}
