use std::io::{BufRead, Write};

use log::debug;
use thiserror::Error;

use super::Confirm;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("scanner input is closed")]
    InputClosed,
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Source of raw scan payloads. `start` and `stop` complete before the session
/// moves to its next state.
pub trait Camera {
    fn start(&mut self) -> Result<(), CameraError>;
    /// Next payload, or `None` once the scanner has nothing more to send.
    fn next_payload(&mut self) -> Result<Option<String>, CameraError>;
    fn stop(&mut self) -> Result<(), CameraError>;
}

/// Terminal front end: a keyboard-wedge barcode scanner types one payload per
/// line on `input`, prompts and output go to `output`.
pub struct Terminal<R, W> {
    input: R,
    output: W,
    active: bool,
    closed: bool,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Terminal<R, W> {
        Terminal {
            input,
            output,
            active: false,
            closed: false,
        }
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            self.closed = true;
            return Ok(None);
        }

        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

impl<R: BufRead, W: Write> Camera for Terminal<R, W> {
    fn start(&mut self) -> Result<(), CameraError> {
        if self.closed {
            return Err(CameraError::InputClosed);
        }

        writeln!(self.output, "Scanner ready, waiting for a code...")?;
        self.output.flush()?;
        self.active = true;

        Ok(())
    }

    fn next_payload(&mut self) -> Result<Option<String>, CameraError> {
        if !self.active {
            return Ok(None);
        }

        loop {
            match self.read_line()? {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => {
                    debug!("scanner payload, len={}", line.len());
                    return Ok(Some(line));
                },
                None => return Ok(None),
            }
        }
    }

    fn stop(&mut self) -> Result<(), CameraError> {
        self.active = false;
        Ok(())
    }
}

impl<R: BufRead, W: Write> Confirm for Terminal<R, W> {
    fn confirm(&mut self, question: &str) -> bool {
        if write!(self.output, "{} [y/N] ", question)
            .and_then(|_| self.output.flush())
            .is_err()
        {
            return false;
        }

        match self.read_line() {
            Ok(Some(answer)) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use anyhow::{bail, Result};
    use pretty_assertions::assert_eq;

    use super::*;

    fn terminal(input: &str) -> Terminal<Cursor<Vec<u8>>, Vec<u8>> {
        Terminal::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_payloads_only_while_active() -> Result<()> {
        let mut terminal = terminal("1-A1-10\n\n2-B2-20\r\n");
        assert_eq!(terminal.next_payload()?, None);

        terminal.start()?;
        assert_eq!(terminal.next_payload()?, Some("1-A1-10".to_string()));
        assert_eq!(terminal.next_payload()?, Some("2-B2-20".to_string()));
        assert_eq!(terminal.next_payload()?, None);

        Ok(())
    }

    #[test]
    fn test_start_after_input_closed_fails() -> Result<()> {
        let mut terminal = terminal("");
        terminal.start()?;
        assert_eq!(terminal.next_payload()?, None);
        terminal.stop()?;

        if let Err(err) = terminal.start() {
            assert!(matches!(err, CameraError::InputClosed));
        } else {
            bail!("scanner should not start on a closed input");
        }

        Ok(())
    }

    #[test]
    fn test_confirm_answers() {
        let mut terminal = terminal("y\nno\nYES\n");
        assert!(terminal.confirm("first?"));
        assert!(!terminal.confirm("second?"));
        assert!(terminal.confirm("third?"));
        assert!(!terminal.confirm("closed?"));

        let output = String::from_utf8(terminal.into_output()).unwrap();
        assert!(output.starts_with("first? [y/N] second? [y/N] "));
    }
}
