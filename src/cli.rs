//! Command-line interface and REPL
//!
//! Stands in for a GUI: forwards startup/shutdown commands and key events to
//! the pad and prints its activation notifications.

use crate::driver::DriverApi;
use crate::keys::Key;
use crate::lifecycle::PadEvent;
use crate::operation::Operation;
use crate::pad::VirtualPad;
use anyhow::{anyhow, Result};
use colored::*;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::Path;

/// One parsed REPL line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Startup(Option<String>),
    Shutdown,
    Press(Operation),
    Release(Operation),
    /// Press then release
    Tap(Operation),
    /// Physical key down
    Down(Key),
    /// Physical key up
    Up(Key),
    Keys,
    Bind(Operation, Key),
    Unbind(Operation),
    Save,
    State,
    Help,
    Quit,
    Empty,
}

impl ReplCommand {
    pub fn parse(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let Some(cmd) = parts.next() else {
            return Ok(ReplCommand::Empty);
        };
        let rest: Vec<&str> = parts.collect();

        let command = match (cmd.to_ascii_lowercase().as_str(), rest.as_slice()) {
            ("startup" | "start", []) => ReplCommand::Startup(None),
            ("startup" | "start", [profile]) => ReplCommand::Startup(Some(profile.to_string())),
            ("shutdown" | "stop", []) => ReplCommand::Shutdown,
            ("press", [op]) => ReplCommand::Press(parse_op(op)?),
            ("release", [op]) => ReplCommand::Release(parse_op(op)?),
            ("tap", [op]) => ReplCommand::Tap(parse_op(op)?),
            ("down", [key]) => ReplCommand::Down(parse_key(key)?),
            ("up", [key]) => ReplCommand::Up(parse_key(key)?),
            ("keys", []) => ReplCommand::Keys,
            ("bind", [op, key]) => ReplCommand::Bind(parse_op(op)?, parse_key(key)?),
            ("unbind", [op]) => ReplCommand::Unbind(parse_op(op)?),
            ("save", []) => ReplCommand::Save,
            ("state", []) => ReplCommand::State,
            ("help" | "?", []) => ReplCommand::Help,
            ("quit" | "exit", []) => ReplCommand::Quit,
            (other, _) => return Err(anyhow!("Unknown or malformed command: {} (try 'help')", other)),
        };
        Ok(command)
    }
}

fn parse_op(text: &str) -> Result<Operation> {
    text.parse::<Operation>().map_err(|e| anyhow!(e))
}

fn parse_key(text: &str) -> Result<Key> {
    text.parse::<Key>()
        .map_err(|e| anyhow!("Invalid key '{}': {}", text, e))
}

/// Whether the REPL keeps reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Run one command against the pad
pub fn execute<D: DriverApi>(
    pad: &mut VirtualPad<D>,
    command: ReplCommand,
    keymap_path: &Path,
) -> Result<Flow> {
    match command {
        ReplCommand::Empty => {}
        ReplCommand::Startup(profile) => {
            let profile = profile.unwrap_or_else(|| pad.default_profile().as_str().to_string());
            pad.startup(&profile)?;
        }
        ReplCommand::Shutdown => pad.shutdown()?,
        ReplCommand::Press(op) => pad.press(op)?,
        ReplCommand::Release(op) => pad.release(op)?,
        ReplCommand::Tap(op) => {
            pad.press(op)?;
            pad.release(op)?;
        }
        ReplCommand::Down(key) => {
            if !pad.is_key_associated(key) {
                println!("  {}", format!("{} is not bound", key).dimmed());
            }
            pad.press_key(key)?;
        }
        ReplCommand::Up(key) => pad.release_key(key)?,
        ReplCommand::Keys => print_keymap(pad),
        ReplCommand::Bind(op, key) => {
            pad.key_map_mut().bind(op, key);
            println!("  {} → {}", op.to_string().yellow(), key.to_string().green());
        }
        ReplCommand::Unbind(op) => match pad.key_map_mut().unbind(op) {
            Some(key) => println!("  {} unbound (was {})", op.to_string().yellow(), key),
            None => println!("  {}", format!("{} was not bound", op).dimmed()),
        },
        ReplCommand::Save => {
            pad.key_map().write_to_file(keymap_path)?;
            println!("  Key map saved to {}", keymap_path.display());
        }
        ReplCommand::State => print_state(pad),
        ReplCommand::Help => print_help(),
        ReplCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

/// Interactive loop until `quit`, Ctrl+C or Ctrl+D
pub fn run_repl<D: DriverApi>(pad: &mut VirtualPad<D>, keymap_path: &Path) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    pad.subscribe(|event| match event {
        PadEvent::Activated => println!("{}", "activated".bright_green()),
        PadEvent::Deactivated => println!("{}", "deactivated".yellow()),
    });

    println!("{}", "=== ViGEm Keypad ===".bold().cyan());
    println!("Type 'help' for commands\n");

    loop {
        let prompt = if pad.is_active() { "pad*> " } else { "pad> " };
        let line = match rl.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if !line.trim().is_empty() {
            let _ = rl.add_history_entry(line.as_str());
        }

        let outcome = ReplCommand::parse(&line).and_then(|cmd| execute(pad, cmd, keymap_path));
        match outcome {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {}
            Err(e) => println!("  {} {}", "error:".red().bold(), e),
        }
    }

    Ok(())
}

/// Print operation → key bindings in operation order
pub fn print_keymap<D: DriverApi>(pad: &VirtualPad<D>) {
    println!("\n{}", "Key bindings:".bold());
    for op in Operation::ALL {
        match pad.key_map().key_for(op) {
            Some(key) => println!("  {:<20} {}", op.name().yellow(), key.to_string().green()),
            None => println!("  {:<20} {}", op.name().yellow(), "-".dimmed()),
        }
    }
    println!();
}

fn print_state<D: DriverApi>(pad: &VirtualPad<D>) {
    let report = pad.report();
    println!("  state:    {}", pad.state().to_string().bright_white());
    if let Some(profile) = pad.lifecycle().profile() {
        println!("  profile:  {}", profile);
    }
    println!("  buttons:  {:?}", report.buttons);
    println!(
        "  triggers: L={} R={}",
        report.left_trigger, report.right_trigger
    );
    println!(
        "  left:     ({}, {})  right: ({}, {})",
        report.thumb_lx, report.thumb_ly, report.thumb_rx, report.thumb_ry
    );
}

fn print_help() {
    println!("\n{}", "Commands:".bold());
    let rows = [
        ("startup [x360|ds4]", "plug in the virtual controller"),
        ("shutdown", "unplug it"),
        ("press|release|tap <op>", "drive an operation (e.g. A, LThumbUp)"),
        ("down|up <key>", "simulate a physical key"),
        ("keys", "list key bindings"),
        ("bind <op> <key>", "bind a key"),
        ("unbind <op>", "remove a binding"),
        ("save", "write the key map"),
        ("state", "show lifecycle and report"),
        ("quit", "exit"),
    ];
    for (cmd, what) in rows {
        println!("  {:<24} {}", cmd.cyan(), what);
    }
    println!();
}
