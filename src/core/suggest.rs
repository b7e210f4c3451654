//! Suggestion vocabulary
//!
//! Every command contributes its bare name plus one `"<name> <argument>"`
//! candidate per declared argument. Candidates are kept sorted so the
//! lexicographically smallest match always wins.

use super::command::CommandDefinition;

/// Sorted set of completion candidates
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Vocabulary {
    candidates: Vec<String>,
}

impl Vocabulary {
    /// Build the vocabulary for a command set
    pub fn from_commands(commands: &[CommandDefinition]) -> Self {
        let mut candidates = Vec::new();
        for command in commands {
            candidates.push(command.name.clone());
            for argument in &command.available_arguments {
                candidates.push(format!("{} {}", command.name, argument));
            }
        }
        candidates.sort();
        Self { candidates }
    }

    /// First candidate starting with the trimmed input, or `""`
    pub fn suggest(&self, input: &str) -> &str {
        let prefix = input.trim();
        if prefix.is_empty() {
            return "";
        }

        // Everything sharing the prefix sorts at or after the prefix itself
        let start = self.candidates.partition_point(|c| c.as_str() < prefix);
        match self.candidates.get(start) {
            Some(candidate) if candidate.starts_with(prefix) => candidate,
            _ => "",
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
