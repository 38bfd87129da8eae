//! Question items and datasets

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Deref;

/// One answer option of a multiple-choice question (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Single-letter label, e.g. `"A"`
    pub label: String,
    pub text: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }

    /// Render as `(L) text`, the form peers and the subject use to cite a choice
    pub fn cite(&self) -> String {
        format!("({}) {}", self.label, self.text)
    }
}

/// A multiple-choice question loaded from the dataset (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionItem {
    pub id: String,
    pub question: String,
    pub choices: Vec<Choice>,
    /// Label of the correct choice
    #[serde(rename = "answerKey")]
    pub answer_key: String,
}

impl QuestionItem {
    pub fn new(
        id: impl Into<String>,
        question: impl Into<String>,
        choices: Vec<Choice>,
        answer_key: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            choices,
            answer_key: answer_key.into(),
        }
    }

    /// The choice whose label equals the answer key
    pub fn correct_choice(&self) -> Result<&Choice, DomainError> {
        let mut matching = self.choices.iter().filter(|c| c.label == self.answer_key);
        match (matching.next(), matching.next()) {
            (Some(choice), None) => Ok(choice),
            (None, _) => Err(DomainError::ChoiceSelection(format!(
                "item {}: answer key '{}' matches no choice label",
                self.id, self.answer_key
            ))),
            (Some(_), Some(_)) => Err(DomainError::ChoiceSelection(format!(
                "item {}: answer key '{}' matches more than one choice label",
                self.id, self.answer_key
            ))),
        }
    }

    /// All choices other than the correct one, in listed order
    pub fn incorrect_choices(&self) -> Vec<&Choice> {
        self.choices
            .iter()
            .filter(|c| c.label != self.answer_key)
            .collect()
    }

    /// Check the item invariants: unique labels and exactly one correct choice
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut seen = HashSet::new();
        for choice in &self.choices {
            if !seen.insert(choice.label.as_str()) {
                return Err(DomainError::InvalidDataset(format!(
                    "item {}: duplicate choice label '{}'",
                    self.id, choice.label
                )));
            }
        }
        self.correct_choice().map(|_| ())
    }
}

/// A non-empty collection of question items with unique ids
///
/// Read-only once built; experiment runs share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    items: Vec<QuestionItem>,
}

impl Dataset {
    /// Build a dataset, validating every item
    pub fn new(items: Vec<QuestionItem>) -> Result<Self, DomainError> {
        if items.is_empty() {
            return Err(DomainError::InvalidDataset(
                "dataset contains no items".to_string(),
            ));
        }

        let mut ids = HashSet::new();
        for item in &items {
            if !ids.insert(item.id.as_str()) {
                return Err(DomainError::InvalidDataset(format!(
                    "duplicate item id '{}'",
                    item.id
                )));
            }
            item.validate().map_err(|e| match e {
                DomainError::ChoiceSelection(msg) => DomainError::InvalidDataset(msg),
                other => other,
            })?;
        }

        Ok(Self { items })
    }

    pub fn items(&self) -> &[QuestionItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&QuestionItem> {
        self.items.iter().find(|item| item.id == id)
    }
}

impl Deref for Dataset {
    type Target = [QuestionItem];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, answer: &str) -> QuestionItem {
        QuestionItem::new(
            id,
            "Where would you find a seat?",
            vec![
                Choice::new("A", "theatre"),
                Choice::new("B", "ocean"),
                Choice::new("C", "cloud"),
            ],
            answer,
        )
    }

    #[test]
    fn test_correct_choice() {
        let item = item("q1", "A");
        assert_eq!(item.correct_choice().unwrap().text, "theatre");
        assert_eq!(item.incorrect_choices().len(), 2);
    }

    #[test]
    fn test_unknown_answer_key_is_choice_selection_error() {
        let item = item("q1", "Z");
        assert!(matches!(
            item.correct_choice(),
            Err(DomainError::ChoiceSelection(_))
        ));
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let mut item = item("q1", "A");
        item.choices.push(Choice::new("A", "again"));
        assert!(matches!(
            item.validate(),
            Err(DomainError::InvalidDataset(_))
        ));
    }

    #[test]
    fn test_cite() {
        assert_eq!(Choice::new("C", "cloud").cite(), "(C) cloud");
    }

    #[test]
    fn test_dataset_validation() {
        assert!(Dataset::new(vec![]).is_err());
        assert!(Dataset::new(vec![item("q1", "A"), item("q1", "B")]).is_err());
        assert!(Dataset::new(vec![item("q1", "A"), item("q2", "Q")]).is_err());

        let dataset = Dataset::new(vec![item("q1", "A"), item("q2", "B")]).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.get("q2").unwrap().answer_key, "B");
        assert!(dataset.get("q3").is_none());
    }

    #[test]
    fn test_deserialize_answer_key_field() {
        let json = r#"{
            "id": "075e483d21c29a511267ef62bedc0461",
            "question": "The sanctions against the school were a punishing blow?",
            "choices": [
                {"label": "A", "text": "ignore"},
                {"label": "B", "text": "enforce"}
            ],
            "answerKey": "A"
        }"#;
        let item: QuestionItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.answer_key, "A");
        assert_eq!(item.choices.len(), 2);
    }
}
