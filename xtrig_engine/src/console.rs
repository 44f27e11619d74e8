//! Line-oriented operator console over the configuration interface.
//!
//! ```text
//! > exposure
//! 200
//! > exposure=500
//! ok (4 bytes)
//! > mode once
//! ok (4 bytes)
//! ```

use std::io::{self, BufRead, Write};

use crate::attr::{Attribute, ConfigurationInterface};

const HELP: &str = "\
commands:
  <attr>            read an attribute
  <attr>=<value>    write an attribute
  <attr> <value>    write an attribute
  list              list attributes
  status            JSON status snapshot
  help              this text
  quit              stop the generator";

/// One parsed console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Blank line.
    Empty,
    /// Read an attribute.
    Read(&'a str),
    /// Write an attribute.
    Write(&'a str, &'a str),
    /// List attributes.
    List,
    /// Print the JSON status.
    Status,
    /// Print help.
    Help,
    /// End the session.
    Quit,
}

impl<'a> Command<'a> {
    /// Parse one input line.
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        match line {
            "" => return Self::Empty,
            "list" => return Self::List,
            "status" => return Self::Status,
            "help" | "?" => return Self::Help,
            "quit" | "exit" => return Self::Quit,
            _ => {}
        }
        let split = line
            .split_once('=')
            .or_else(|| line.split_once(char::is_whitespace));
        match split {
            Some((name, value)) => Self::Write(name.trim(), value.trim()),
            None => Self::Read(line),
        }
    }
}

/// Why a console session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleExit {
    /// The operator asked to quit.
    Quit,
    /// Input closed.
    Eof,
}

/// Console session bound to one interface.
pub struct Console<'a> {
    iface: &'a ConfigurationInterface,
    prompt: bool,
}

impl<'a> Console<'a> {
    /// Console over `iface`. `prompt` prints "> " before each line.
    pub fn new(iface: &'a ConfigurationInterface, prompt: bool) -> Self {
        Self { iface, prompt }
    }

    /// Execute one command. Returns `false` on quit.
    pub fn execute<W: Write>(&self, cmd: Command<'_>, out: &mut W) -> io::Result<bool> {
        match cmd {
            Command::Empty => {}
            Command::Read(name) => match self.iface.show(name) {
                Ok(value) => write!(out, "{}", value.as_str())?,
                Err(e) => writeln!(out, "error: {e}")?,
            },
            Command::Write(name, value) => match self.iface.store(name, value) {
                Ok(n) => writeln!(out, "ok ({n} bytes)")?,
                Err(e) => writeln!(out, "error: {e}")?,
            },
            Command::List => {
                for attr in Attribute::ALL {
                    let access = if attr.is_writable() { "rw" } else { "ro" };
                    let value = self.iface.show_attr(attr);
                    write!(out, "{:<16} {access}  {}", attr.name(), value.as_str())?;
                }
            }
            Command::Status => match serde_json::to_string(&self.iface.status()) {
                Ok(json) => writeln!(out, "{json}")?,
                Err(e) => writeln!(out, "error: {e}")?,
            },
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }

    /// Run until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&self, input: R, out: &mut W) -> io::Result<ConsoleExit> {
        let mut lines = input.lines();
        loop {
            if self.prompt {
                write!(out, "> ")?;
                out.flush()?;
            }
            let Some(line) = lines.next() else {
                return Ok(ConsoleExit::Eof);
            };
            let line = line?;
            if !self.execute(Command::parse(&line), out)? {
                return Ok(ConsoleExit::Quit);
            }
            out.flush()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EngineState;
    use std::sync::Arc;
    use xtrig_common::generator::GeneratorConfig;

    fn iface() -> ConfigurationInterface {
        let state = EngineState::new(&GeneratorConfig::default()).unwrap();
        ConfigurationInterface::new(Arc::new(state))
    }

    fn session(input: &str) -> (String, ConsoleExit) {
        let iface = iface();
        let console = Console::new(&iface, false);
        let mut out = Vec::new();
        let exit = console.run(input.as_bytes(), &mut out).unwrap();
        (String::from_utf8(out).unwrap(), exit)
    }

    #[test]
    fn parse_forms() {
        assert_eq!(Command::parse("  "), Command::Empty);
        assert_eq!(Command::parse("exposure"), Command::Read("exposure"));
        assert_eq!(Command::parse("exposure=300"), Command::Write("exposure", "300"));
        assert_eq!(Command::parse("mode  once"), Command::Write("mode", "once"));
        assert_eq!(Command::parse("mode = off"), Command::Write("mode", "off"));
        assert_eq!(Command::parse("quit"), Command::Quit);
    }

    #[test]
    fn read_write_roundtrip() {
        let (out, exit) = session("exposure=300\nexposure\n");
        assert_eq!(out, "ok (3 bytes)\n300\n");
        assert_eq!(exit, ConsoleExit::Eof);
    }

    #[test]
    fn errors_do_not_end_session() {
        let (out, exit) = session("bogus\ntick_period=5\nquit\nexposure\n");
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("error: unknown attribute"));
        assert!(lines[1].contains("read-only"));
        assert_eq!(exit, ConsoleExit::Quit);
    }

    #[test]
    fn list_shows_every_attribute() {
        let (out, _) = session("list\n");
        assert_eq!(out.lines().count(), Attribute::ALL.len());
        assert!(out.contains("tick_period"));
        assert!(out.lines().any(|l| l.starts_with("mode") && l.contains("rw")));
    }

    #[test]
    fn status_is_json() {
        let (out, _) = session("status\n");
        let value: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(value["cycle_ticks"], 2600);
    }
}
