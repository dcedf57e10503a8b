//! Fuzzy selection over an external enumeration
//!
//! Keymaps and timezones are long lists owned by the live system
//! (`localectl list-keymaps`, `timedatectl list-timezones`). Rather than load
//! them, the producer is piped straight into `fzf`, which takes over the
//! terminal until the operator picks a line.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};

use crate::error::{Result, TonarchyError};

/// External command that prints one candidate per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumeration {
    pub program: String,
    pub args: Vec<String>,
}

impl Enumeration {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { program: program.into(), args: args.into_iter().map(Into::into).collect() }
    }

    pub fn keymaps() -> Self {
        Self::new("localectl", ["list-keymaps"])
    }

    pub fn timezones() -> Self {
        Self::new("timedatectl", ["list-timezones"])
    }
}

/// One picker session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickRequest {
    pub enumeration: Enumeration,
    pub prompt: String,
    pub header: String,
    pub query: Option<String>,
}

impl PickRequest {
    /// Arguments passed to `fzf`.
    pub fn fzf_args(&self) -> Vec<String> {
        let mut args = vec![
            "--height=40%".to_string(),
            "--reverse".to_string(),
            format!("--prompt={}", self.prompt),
            format!("--header={}", self.header),
        ];
        if let Some(ref query) = self.query {
            args.push(format!("--query={}", query));
        }
        args
    }
}

/// Interactive filter over an enumeration.
pub trait FuzzyPicker {
    /// `Ok(Some(line))` for a choice, `Ok(None)` when nothing was chosen.
    ///
    /// # Errors
    ///
    /// The picker could not be launched or its input is exhausted.
    fn pick(&mut self, request: &PickRequest) -> Result<Option<String>>;
}

/// Runs `<producer> | fzf ...` and reads the first line fzf prints.
#[derive(Debug, Default)]
pub struct FzfPicker;

impl FuzzyPicker for FzfPicker {
    fn pick(&mut self, request: &PickRequest) -> Result<Option<String>> {
        let enumeration = &request.enumeration;
        let mut producer = Command::new(&enumeration.program)
            .args(&enumeration.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| TonarchyError::picker(format!("failed to run {}: {}", enumeration.program, e)))?;

        let listing = producer
            .stdout
            .take()
            .ok_or_else(|| TonarchyError::picker("producer has no stdout"))?;

        let filter = Command::new("fzf")
            .args(request.fzf_args())
            .stdin(Stdio::from(listing))
            .stdout(Stdio::piped())
            .spawn();

        let mut filter = match filter {
            Ok(child) => child,
            Err(e) => {
                let _ = producer.kill();
                let _ = producer.wait();
                return Err(TonarchyError::picker(format!("failed to run fzf: {}", e)));
            }
        };

        let mut first = String::new();
        if let Some(out) = filter.stdout.take() {
            BufReader::new(out).read_line(&mut first)?;
        }
        let status = filter.wait()?;

        // The operator may pick before the producer finishes printing.
        let _ = producer.kill();
        let _ = producer.wait();

        match status.code() {
            Some(0) => {}
            // 1: no match, 130: aborted with Esc/Ctrl-C
            Some(1) | Some(130) => return Ok(None),
            other => {
                return Err(TonarchyError::picker(format!("fzf exited with {:?}", other)));
            }
        }

        let choice = first.trim();
        Ok((!choice.is_empty()).then(|| choice.to_string()))
    }
}

/// Picker double that answers from a queue and records every request.
#[derive(Debug, Default)]
pub struct ScriptedPicker {
    answers: VecDeque<std::result::Result<Option<String>, String>>,
    requests: Vec<PickRequest>,
}

impl ScriptedPicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a choice.
    pub fn choose(mut self, line: impl Into<String>) -> Self {
        self.answers.push_back(Ok(Some(line.into())));
        self
    }

    /// Queue a session where nothing is chosen.
    pub fn choose_nothing(mut self) -> Self {
        self.answers.push_back(Ok(None));
        self
    }

    /// Queue a launch failure.
    pub fn fail(mut self, reason: impl Into<String>) -> Self {
        self.answers.push_back(Err(reason.into()));
        self
    }

    pub fn requests(&self) -> &[PickRequest] {
        &self.requests
    }
}

impl FuzzyPicker for ScriptedPicker {
    fn pick(&mut self, request: &PickRequest) -> Result<Option<String>> {
        self.requests.push(request.clone());
        match self.answers.pop_front() {
            Some(Ok(answer)) => Ok(answer),
            Some(Err(reason)) => Err(TonarchyError::picker(reason)),
            None => Err(TonarchyError::picker("picker input exhausted")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(enumeration: Enumeration, query: Option<&str>) -> PickRequest {
        PickRequest {
            enumeration,
            prompt: "Keyboard: ".to_string(),
            header: "Start typing to filter, Enter to select".to_string(),
            query: query.map(str::to_string),
        }
    }

    #[test]
    fn test_fzf_args() {
        let args = request(Enumeration::keymaps(), Some("us")).fzf_args();
        assert_eq!(
            args,
            vec![
                "--height=40%",
                "--reverse",
                "--prompt=Keyboard: ",
                "--header=Start typing to filter, Enter to select",
                "--query=us",
            ]
        );
        assert_eq!(request(Enumeration::timezones(), None).fzf_args().len(), 4);
    }

    #[test]
    fn test_enumerations() {
        assert_eq!(Enumeration::keymaps().program, "localectl");
        assert_eq!(Enumeration::timezones().args, vec!["list-timezones"]);
    }

    #[test]
    fn test_scripted_picker() {
        let mut picker = ScriptedPicker::new().choose("de").choose_nothing().fail("boom");
        let req = request(Enumeration::keymaps(), Some("us"));
        assert_eq!(picker.pick(&req).unwrap(), Some("de".to_string()));
        assert_eq!(picker.pick(&req).unwrap(), None);
        assert!(matches!(picker.pick(&req), Err(TonarchyError::Picker(_))));
        assert!(picker.pick(&req).is_err());
        assert_eq!(picker.requests().len(), 4);
    }

    #[test]
    fn test_missing_producer_is_an_error() {
        let req = request(Enumeration::new("/nonexistent/producer", Vec::<String>::new()), None);
        assert!(matches!(FzfPicker.pick(&req), Err(TonarchyError::Picker(_))));
    }
}
