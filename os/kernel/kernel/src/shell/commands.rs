use super::calc::evaluate;
use super::{Action, ShellState};
use crate::console::Terminal;
use core::fmt::{self, Write};

type Run = fn(&ShellState, &str, &mut dyn Terminal) -> Result<Action, fmt::Error>;

/// One entry of the command table.
pub struct Command {
    pub name: &'static str,
    /// Shown in `help`; includes the argument syntax where there is one.
    pub usage: &'static str,
    pub summary: &'static str,
    /// Whether anything may follow the name.
    pub takes_argument: bool,
    pub(super) run: Run,
}

pub static COMMANDS: [Command; 7] = [
    Command {
        name: "help",
        usage: "help",
        summary: "show this list",
        takes_argument: false,
        run: help,
    },
    Command {
        name: "clear",
        usage: "clear",
        summary: "clear the screen",
        takes_argument: false,
        run: clear,
    },
    Command {
        name: "calc",
        usage: "calc <a><op><b>",
        summary: "integer arithmetic, op is one of + - * / %",
        takes_argument: true,
        run: calc,
    },
    Command {
        name: "status",
        usage: "status",
        summary: "machine facts handed over by the loader",
        takes_argument: false,
        run: status,
    },
    Command {
        name: "about",
        usage: "about",
        summary: "about this system",
        takes_argument: false,
        run: about,
    },
    Command {
        name: "reboot",
        usage: "reboot",
        summary: "restart the machine",
        takes_argument: false,
        run: reboot,
    },
    Command {
        name: "halt",
        usage: "halt",
        summary: "stop the CPU",
        takes_argument: false,
        run: halt,
    },
];

/// Exact name lookup.
#[must_use]
pub fn find(name: &str) -> Option<&'static Command> {
    COMMANDS.iter().find(|command| command.name == name)
}

fn help(_: &ShellState, _: &str, term: &mut dyn Terminal) -> Result<Action, fmt::Error> {
    writeln!(term, "Available commands:")?;
    for command in &COMMANDS {
        writeln!(term, "  {:<16} {}", command.usage, command.summary)?;
    }
    Ok(Action::Continue)
}

#[allow(clippy::unnecessary_wraps)]
fn clear(_: &ShellState, _: &str, term: &mut dyn Terminal) -> Result<Action, fmt::Error> {
    term.clear();
    Ok(Action::Continue)
}

fn calc(_: &ShellState, expression: &str, term: &mut dyn Terminal) -> Result<Action, fmt::Error> {
    match evaluate(expression) {
        Ok(value) => writeln!(term, "{value}")?,
        Err(e) => writeln!(term, "Error: {e}")?,
    }
    Ok(Action::Continue)
}

fn status(shell: &ShellState, _: &str, term: &mut dyn Terminal) -> Result<Action, fmt::Error> {
    match &shell.status {
        Some(report) => write!(term, "{report}")?,
        None => writeln!(term, "No handoff information available.")?,
    }
    Ok(Action::Continue)
}

fn about(_: &ShellState, _: &str, term: &mut dyn Terminal) -> Result<Action, fmt::Error> {
    writeln!(term, "BIOS bootstrap kernel {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(term, "Stage-1 boot sector, Stage-2 mode switch, 64-bit long mode,")?;
    writeln!(term, "8259 PIC interrupts and a PS/2 keyboard.")?;
    Ok(Action::Continue)
}

fn reboot(_: &ShellState, _: &str, term: &mut dyn Terminal) -> Result<Action, fmt::Error> {
    writeln!(term, "Rebooting...")?;
    Ok(Action::Reboot)
}

fn halt(_: &ShellState, _: &str, term: &mut dyn Terminal) -> Result<Action, fmt::Error> {
    writeln!(term, "Halting.")?;
    Ok(Action::Halt)
}
