//! Terminal presentation of lint results and the y/N prompts.

use std::{
    io::{self, BufRead, Write},
    path::Path,
};

use {
    colored::Colorize,
    deadlist_linter::{Confirm, Edit, FileSummary, LintResult},
    tracing::warn,
};

/// How confirmations are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Ask on the terminal.
    Ask,
    /// Accept everything without asking.
    Auto,
    /// Print what would change, accept nothing.
    Show,
}

/// Prints each issue and answers confirmations according to [`Mode`].
pub struct Prompter<R, W> {
    mode: Mode,
    input: R,
    output: W,
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio(mode: Mode) -> Self {
        Self::new(mode, io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(mode: Mode, input: R, output: W) -> Self {
        Self {
            mode,
            input,
            output,
        }
    }

    fn decide(&mut self, question: &str) -> io::Result<bool> {
        match self.mode {
            Mode::Auto => return Ok(true),
            Mode::Show => return Ok(false),
            Mode::Ask => {},
        }
        write!(self.output, "{} {} ", question.bold(), "[y/N]".dimmed())?;
        self.output.flush()?;
        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }

    fn print_issue(&mut self, path: &Path, result: &LintResult, edit: &Edit) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(
            self.output,
            "{}",
            format!("{}:{}", path.display(), result.line_number).cyan().bold()
        )?;
        writeln!(
            self.output,
            "  dead domains: {}",
            result.dead_domains.join(", ").yellow()
        )?;
        writeln!(self.output, "  {} {}", "-".red(), result.original_text.red())?;
        match edit {
            Edit::Remove => writeln!(self.output, "  {}", "(rule removed)".dimmed())?,
            Edit::ReplaceWith(text) => writeln!(self.output, "  {} {}", "+".green(), text.green())?,
        }
        Ok(())
    }

    fn print_summary(&mut self, path: &Path, summary: &FileSummary) -> io::Result<()> {
        let rows = [
            path.display().to_string(),
            format!("lines to remove: {}", summary.removed),
            format!("lines to modify: {}", summary.modified),
        ];
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let border = "─".repeat(width + 2);
        writeln!(self.output)?;
        writeln!(self.output, "┌{border}┐")?;
        for row in &rows {
            writeln!(self.output, "│ {row:<width$} │")?;
        }
        writeln!(self.output, "└{border}┘")?;
        Ok(())
    }

    /// Terminal errors count as "no".
    fn answer(&mut self, outcome: io::Result<bool>) -> bool {
        outcome.unwrap_or_else(|e| {
            warn!(error = %e, "terminal interaction failed, declining");
            false
        })
    }
}

impl<R: BufRead, W: Write> Confirm for Prompter<R, W> {
    fn confirm_issue(&mut self, path: &Path, result: &LintResult, edit: &Edit) -> bool {
        let outcome = self
            .print_issue(path, result, edit)
            .and_then(|()| self.decide("Apply this change?"));
        self.answer(outcome)
    }

    fn confirm_file(&mut self, path: &Path, summary: &FileSummary) -> bool {
        let outcome = self
            .print_summary(path, summary)
            .and_then(|()| self.decide(&format!("Write changes to {}?", path.display())));
        self.answer(outcome)
    }
}
