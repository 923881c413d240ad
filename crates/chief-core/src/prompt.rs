//! Confirmation prompts.

use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;

/// Asks the user yes/no questions.
pub trait Prompter: Send + Sync {
    /// Ask `question`; an empty answer picks `default_yes`.
    fn confirm(&self, question: &str, default_yes: bool) -> io::Result<bool>;
}

/// Prompter that replays a fixed list of answers.
///
/// Once the answers run out every question is declined. Questions asked are
/// recorded for inspection.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<bool>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    /// Create a prompter that answers with `answers` in order.
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Questions asked so far.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, question: &str, _default_yes: bool) -> io::Result<bool> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(question.to_string());
        }
        let answer = self
            .answers
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "prompter lock poisoned"))?
            .pop_front()
            .unwrap_or(false);
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_answers_then_decline() {
        let prompter = ScriptedPrompter::new([true]);
        assert!(prompter.confirm("first?", false).unwrap());
        assert!(!prompter.confirm("second?", true).unwrap());
        assert_eq!(prompter.asked(), vec!["first?", "second?"]);
    }
}
