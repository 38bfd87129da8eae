//! Synthetic peer panel: who speaks and how they phrase an opinion.

use crate::core::error::DomainError;
use crate::core::question::Choice;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

/// Placeholder substituted with `(L) text` in every template
pub const CHOICE_PLACEHOLDER: &str = "{choice}";

const DEFAULT_NAMES: [&str; 6] = ["Mary", "John", "George", "Tom", "Tony", "Jack"];

const DEFAULT_TEMPLATES: [&str; 21] = [
    "The best answer is {choice}",
    "I’d like to choose {choice}",
    "I’m going with {choice}",
    "I’d select {choice} as the best answer",
    "My choice would be {choice}",
    "I think {choice} is the most suitable option",
    "I believe {choice} is the right answer",
    "I’m leaning towards {choice} as the best choice",
    "I’d opt for {choice} in this case",
    "I’d say {choice} is the correct response",
    "I’d vote for {choice} as the most appropriate choice",
    "My preference would be {choice}",
    "I’d settle on {choice} as the best answer",
    "I’m inclined to choose {choice}",
    "I’d endorse {choice} as the top pick",
    "I’d consider {choice} as the most accurate answer",
    "I’d side with {choice} as the best response",
    "I’d favor {choice} as the most fitting option",
    "I’d stand by {choice} as the correct answer",
    "I’d affirm {choice} as the best selection",
    "I’d vouch for {choice} as the most precise answer",
];

/// The named peers and the paraphrase templates they draw from.
///
/// Injected into the composer so alternate experiment configurations can
/// swap either list without touching composition logic.
///
/// # Example
///
/// ```
/// use conformity_domain::protocol::PeerPanel;
///
/// let panel = PeerPanel::default();
/// assert_eq!(panel.names().len(), 6);
/// assert_eq!(panel.templates().len(), 21);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerPanel {
    names: Vec<String>,
    templates: Vec<String>,
}

impl Default for PeerPanel {
    fn default() -> Self {
        Self {
            names: DEFAULT_NAMES.iter().map(|s| s.to_string()).collect(),
            templates: DEFAULT_TEMPLATES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PeerPanel {
    /// Build a panel, validating that it can produce opinions
    pub fn new(names: Vec<String>, templates: Vec<String>) -> Result<Self, DomainError> {
        let panel = Self { names, templates };
        panel.validate()?;
        Ok(panel)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.names.is_empty() {
            return Err(DomainError::InvalidPanel("no peer names".to_string()));
        }
        if self.templates.is_empty() {
            return Err(DomainError::InvalidPanel(
                "no opinion templates".to_string(),
            ));
        }
        if let Some(bad) = self
            .templates
            .iter()
            .find(|t| !t.contains(CHOICE_PLACEHOLDER))
        {
            return Err(DomainError::InvalidPanel(format!(
                "template '{}' lacks the {} placeholder",
                bad, CHOICE_PLACEHOLDER
            )));
        }
        Ok(())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn templates(&self) -> &[String] {
        &self.templates
    }

    pub fn size(&self) -> usize {
        self.names.len()
    }

    /// One opinion asserting `choice`, phrased with a uniformly drawn template
    pub fn opinion<R: Rng + ?Sized>(&self, choice: &Choice, rng: &mut R) -> String {
        let template = self
            .templates
            .choose(rng)
            .map(String::as_str)
            .unwrap_or(CHOICE_PLACEHOLDER);
        template.replace(CHOICE_PLACEHOLDER, &choice.cite())
    }

    /// `Name: opinion` lines, one per peer, all asserting `choice`
    pub fn opinions<R: Rng + ?Sized>(&self, choice: &Choice, rng: &mut R) -> String {
        self.names
            .iter()
            .map(|name| format!("{}: {}", name, self.opinion(choice, rng)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
