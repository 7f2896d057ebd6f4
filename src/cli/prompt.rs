//! Interactive questions for values the user did not pass as flags.
//!
//! Questions go to stderr so stdout stays reserved for results.

use std::io::{self, BufRead, IsTerminal, Write};

use chrono::{Datelike, Days, NaiveDate};

/// Reads answers line by line from `input`, writing questions to `output`.
pub(crate) struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<io::StdinLock<'static>, io::Stderr> {
    pub(crate) fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub(crate) fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Ask a question and return the trimmed answer. End of input yields an
    /// empty answer.
    pub(crate) fn ask(&mut self, question: &str) -> io::Result<String> {
        write!(self.output, "{question}: ")?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line)?;
        if read == 0 {
            writeln!(self.output)?;
        }
        Ok(line.trim().to_string())
    }

    /// Like [`ask`](Self::ask), but an empty answer selects `default`.
    pub(crate) fn ask_with_default(&mut self, question: &str, default: &str) -> io::Result<String> {
        let answer = self.ask(&format!("{question} [{default}]"))?;
        if answer.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(answer)
        }
    }
}

/// True when stdin is attached to a terminal.
pub(crate) fn stdin_is_interactive() -> bool {
    io::stdin().is_terminal()
}

/// The first Sunday strictly after `today`.
pub(crate) fn next_sunday(today: NaiveDate) -> NaiveDate {
    let days = 7 - today.weekday().num_days_from_sunday();
    today + Days::new(u64::from(days))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_next_sunday_from_weekdays() {
        // 2026-02-23 is a Monday
        assert_eq!(next_sunday(date(2026, 2, 23)), date(2026, 3, 1));
        assert_eq!(next_sunday(date(2026, 2, 28)), date(2026, 3, 1));
    }

    #[test]
    fn test_next_sunday_skips_today() {
        assert_eq!(next_sunday(date(2026, 3, 1)), date(2026, 3, 8));
    }

    #[test]
    fn test_next_sunday_crosses_year_end() {
        // 2026-12-31 is a Thursday
        assert_eq!(next_sunday(date(2026, 12, 31)), date(2027, 1, 3));
    }

    #[test]
    fn test_ask_trims_and_echoes_question() {
        let mut out = Vec::new();
        let mut prompter = Prompter::new(Cursor::new("  Ezekiel 36  \n"), &mut out);

        let answer = prompter.ask("Bible passage").unwrap();

        assert_eq!(answer, "Ezekiel 36");
        assert_eq!(String::from_utf8(out).unwrap(), "Bible passage: ");
    }

    #[test]
    fn test_ask_with_default() {
        let mut prompter = Prompter::new(Cursor::new("\n2026-03-08\n"), Vec::new());

        assert_eq!(
            prompter.ask_with_default("Date", "2026-03-01").unwrap(),
            "2026-03-01"
        );
        assert_eq!(
            prompter.ask_with_default("Date", "2026-03-01").unwrap(),
            "2026-03-08"
        );
    }

    #[test]
    fn test_ask_at_end_of_input_is_empty() {
        let mut prompter = Prompter::new(Cursor::new(""), Vec::new());
        assert_eq!(prompter.ask("Anything").unwrap(), "");
        assert_eq!(prompter.ask_with_default("Date", "x").unwrap(), "x");
    }
}
