//! Interactive yes/no confirmation.

use std::io::{BufRead, Write};

use anyhow::Result;

/// Something that can approve an action before it happens.
pub trait Confirm {
    /// Ask `prompt`; `true` means go ahead.
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Prompts on a writer and reads the answer from a line-oriented reader.
///
/// Only a line reading exactly `y` or `yes` (any case) approves; surrounding
/// whitespace declines. End of input declines.
pub struct Confirmation<R, W> {
    /// Skip the prompt and approve (`--yes`).
    pub confirmed: bool,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Confirmation<R, W> {
    /// Create a confirmation gate over the given streams.
    pub fn new(confirmed: bool, input: R, output: W) -> Self {
        Confirmation {
            confirmed,
            input,
            output,
        }
    }
}

impl<R: BufRead, W: Write> Confirm for Confirmation<R, W> {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        if self.confirmed {
            return Ok(true);
        }

        write!(self.output, "{prompt} [y/N] ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(false);
        }

        let answer = line
            .strip_suffix('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .unwrap_or(line.as_str());
        Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(confirmed: bool, input: &str) -> (bool, String) {
        let mut out = Vec::new();
        let answer = Confirmation::new(confirmed, input.as_bytes(), &mut out)
            .confirm("Push?")
            .unwrap();
        (answer, String::from_utf8(out).unwrap())
    }

    #[test]
    fn forcibly_confirmed_skips_prompt() {
        let (answer, out) = ask(true, "");
        assert!(answer);
        assert!(out.is_empty());
    }

    #[test]
    fn manually_confirmed() {
        assert!(ask(false, "yes\n").0);
        assert!(ask(false, "Y").0);
        assert!(ask(false, "YES\r\n").0);
    }

    #[test]
    fn anything_else_declines() {
        assert!(!ask(false, "no\n").0);
        assert!(!ask(false, "yes no\n").0);
        assert!(!ask(false, "\n").0);
        assert!(!ask(false, "  YES  \n").0);
        assert!(!ask(false, " y").0);
    }

    #[test]
    fn piped_input_is_read_like_a_terminal() {
        let (answer, out) = ask(false, "y\nignored\n");
        assert!(answer);
        assert_eq!(out, "Push? [y/N] ");
    }

    #[test]
    fn end_of_input_declines() {
        let (answer, out) = ask(false, "");
        assert!(!answer);
        assert_eq!(out, "Push? [y/N] ");
    }
}
