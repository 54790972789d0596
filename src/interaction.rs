//! Interactive selection of upgrade candidates
//!
//! Walks the candidates in display order and asks, for each one, whether it
//! should be applied. A final prompt confirms writing the manifest. Input and
//! output are generic so the whole dialogue can be driven from tests.

use crate::domain::version::is_prerelease;
use crate::domain::{sort_candidates, UpgradeCandidate, UpgradeMagnitude};
use crate::error::PromptError;
use crate::output::colorize_version;
use crate::repository::changes_url;
use crate::resolver::ResultSet;
use colored::Colorize;
use std::io::{BufRead, Write};

/// Answer to the per-candidate prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateChoice {
    Update,
    Skip,
    ShowChanges,
    Finish,
}

impl UpdateChoice {
    fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "u" | "update" => Some(UpdateChoice::Update),
            "" | "s" | "skip" => Some(UpdateChoice::Skip),
            "c" | "changes" => Some(UpdateChoice::ShowChanges),
            "f" | "finish" => Some(UpdateChoice::Finish),
            _ => None,
        }
    }
}

/// Answer to the write confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteChoice {
    Yes,
    YesWithBackup,
    No,
}

impl WriteChoice {
    fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "y" | "yes" => Some(WriteChoice::Yes),
            "b" | "backup" => Some(WriteChoice::YesWithBackup),
            "" | "n" | "no" => Some(WriteChoice::No),
            _ => None,
        }
    }
}

/// Notices shown next to a candidate before asking about it
pub fn warnings(candidate: &UpgradeCandidate) -> Vec<String> {
    let mut notes = Vec::new();
    if candidate.is_locked() {
        notes.push("version is locked".to_string());
    }
    if candidate.is_recent_release() {
        if let Some(hours) = candidate.hours_since_last_release {
            notes.push(format!("released {} hours ago", hours));
        }
    }
    if is_prerelease(&candidate.latest_version) {
        notes.push("latest version is a pre-release".to_string());
    }
    notes
}

/// Terminal dialogue over any line-based input and output
pub struct Prompter<R, W> {
    input: R,
    output: W,
    color: bool,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            color: true,
        }
    }

    /// Set whether to colour prompts (builder pattern)
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn read_answer(&mut self) -> Result<String, PromptError> {
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(PromptError::Interrupted);
        }
        Ok(line)
    }

    fn say(&mut self, text: &str, style: fn(&str) -> colored::ColoredString) -> Result<(), PromptError> {
        if self.color {
            writeln!(self.output, "{}", style(text))?;
        } else {
            writeln!(self.output, "{}", text)?;
        }
        Ok(())
    }

    /// Ask about one candidate until a valid answer is given
    pub fn ask_update(
        &mut self,
        candidate: &UpgradeCandidate,
        position: usize,
        total: usize,
    ) -> Result<UpdateChoice, PromptError> {
        let latest = if self.color {
            colorize_version(&candidate.latest_version, candidate.magnitude)
        } else {
            candidate.latest_version.clone()
        };
        let dev = if candidate.is_dev { " (dev)" } else { "" };

        writeln!(
            self.output,
            "\n[{}/{}] {}{} {} → {} [{}]",
            position,
            total,
            if self.color {
                candidate.dependency_name.bold().to_string()
            } else {
                candidate.dependency_name.clone()
            },
            dev,
            candidate.current_version,
            latest,
            candidate.magnitude
        )?;

        for note in warnings(candidate) {
            self.say(&format!("  ⚠ {}", note), |s| s.yellow())?;
        }

        loop {
            write!(self.output, "Update? [u]pdate / [s]kip / [c]hanges / [f]inish: ")?;
            let answer = self.read_answer()?;
            match UpdateChoice::parse(&answer) {
                Some(choice) => return Ok(choice),
                None => self.say(
                    "Please answer with u(pdate), s(kip), c(hanges), or f(inish).",
                    |s| s.red(),
                )?,
            }
        }
    }

    /// Run the selection loop, setting `should_apply` on chosen candidates.
    ///
    /// With `update_patches`, patch candidates are selected up front and not
    /// asked about. Returns the number of selected candidates.
    pub fn select(
        &mut self,
        results: &mut ResultSet,
        update_patches: bool,
    ) -> Result<usize, PromptError> {
        let order: Vec<String> = sort_candidates(results.candidates.values())
            .into_iter()
            .map(|c| c.dependency_name.clone())
            .collect();

        let mut pending = Vec::new();
        let mut preselected = 0;
        for name in order {
            let Some(candidate) = results.candidates.get_mut(&name) else {
                continue;
            };
            if update_patches && candidate.magnitude == UpgradeMagnitude::Patch {
                candidate.should_apply = true;
                preselected += 1;
            } else {
                pending.push(name);
            }
        }

        if preselected > 0 {
            self.say(
                &format!("Selected {} patch update(s) automatically", preselected),
                |s| s.green(),
            )?;
        }

        let total = pending.len();
        'candidates: for (index, name) in pending.iter().enumerate() {
            let Some(candidate) = results.candidates.get(name).cloned() else {
                continue;
            };

            loop {
                match self.ask_update(&candidate, index + 1, total)? {
                    UpdateChoice::Update => {
                        if let Some(c) = results.candidates.get_mut(name) {
                            c.should_apply = true;
                        }
                        break;
                    }
                    UpdateChoice::Skip => break,
                    UpdateChoice::ShowChanges => {
                        match changes_url(
                            candidate.repository_url.as_deref(),
                            candidate.homepage.as_deref(),
                            &candidate.current_version,
                        ) {
                            Some(url) => writeln!(self.output, "Changes: {}", url)?,
                            None => {
                                self.say("No repository or homepage URL found", |s| s.yellow())?
                            }
                        }
                    }
                    UpdateChoice::Finish => {
                        writeln!(self.output, "Finished update process")?;
                        break 'candidates;
                    }
                }
            }
        }

        Ok(results.selected().count())
    }

    /// Ask whether to write the manifest
    pub fn confirm_write(&mut self, selected: usize) -> Result<WriteChoice, PromptError> {
        self.say(
            &format!("\nThere are {} package(s) selected to be updated", selected),
            |s| s.green(),
        )?;

        loop {
            write!(
                self.output,
                "Write package.json? [y]es / [b]ackup then yes / [n]o: "
            )?;
            let answer = self.read_answer()?;
            match WriteChoice::parse(&answer) {
                Some(choice) => return Ok(choice),
                None => self.say("Please answer with y(es), b(ackup), or n(o).", |s| s.red())?,
            }
        }
    }

    /// Write a plain line to the prompt output
    pub fn note(&mut self, text: &str) -> Result<(), PromptError> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }
}
