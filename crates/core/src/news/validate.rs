#![forbid(unsafe_code)]

use super::{NewsDraft, NewsField};

pub const TITLE_MIN_CHARS: usize = 3;
pub const TITLE_MAX_CHARS: usize = 120;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldErrorReason {
    Missing,
    NotAString,
    Empty,
    TooShort { min: usize, actual: usize },
    TooLong { max: usize, actual: usize },
    ContainsMarkup,
}

impl FieldErrorReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::NotAString => "not_a_string",
            Self::Empty => "empty",
            Self::TooShort { .. } => "too_short",
            Self::TooLong { .. } => "too_long",
            Self::ContainsMarkup => "contains_markup",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Missing => "is required".to_string(),
            Self::NotAString => "must be a string".to_string(),
            Self::Empty => "must not be empty".to_string(),
            Self::TooShort { min, actual } => {
                format!("length is too short ({actual} < {min} characters)")
            }
            Self::TooLong { max, actual } => {
                format!("length is too long ({actual} > {max} characters)")
            }
            Self::ContainsMarkup => "must not contain HTML tags".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{field} {}", .reason.message())]
pub struct FieldError {
    pub field: NewsField,
    pub reason: FieldErrorReason,
}

impl FieldError {
    pub fn new(field: NewsField, reason: FieldErrorReason) -> Self {
        Self { field, reason }
    }
}

/// Every field-level problem found in one submission, in field order.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("validation failed: {}", join_messages(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn for_field(&self, field: NewsField) -> impl Iterator<Item = &FieldError> {
        self.0.iter().filter(move |err| err.field == field)
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// True when the value contains something shaped like a tag: a `<` with a `>` after it.
pub fn contains_markup(value: &str) -> bool {
    value
        .find('<')
        .is_some_and(|start| value[start + 1..].contains('>'))
}

impl NewsDraft {
    /// Checks every rule and returns all violations; an empty vector means valid.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        validate_title(self.title.as_deref(), &mut errors);
        validate_author(self.author.as_deref(), &mut errors);
        for field in [NewsField::Description, NewsField::Link, NewsField::ImageUrl] {
            if let Some(value) = self.field(field)
                && contains_markup(value)
            {
                errors.push(FieldError::new(field, FieldErrorReason::ContainsMarkup));
            }
        }
        errors
    }
}

fn validate_title(value: Option<&str>, errors: &mut Vec<FieldError>) {
    let Some(value) = value else {
        errors.push(FieldError::new(NewsField::Title, FieldErrorReason::Missing));
        return;
    };
    let actual = value.trim().chars().count();
    if actual < TITLE_MIN_CHARS {
        errors.push(FieldError::new(
            NewsField::Title,
            FieldErrorReason::TooShort {
                min: TITLE_MIN_CHARS,
                actual,
            },
        ));
    } else if actual > TITLE_MAX_CHARS {
        errors.push(FieldError::new(
            NewsField::Title,
            FieldErrorReason::TooLong {
                max: TITLE_MAX_CHARS,
                actual,
            },
        ));
    }
    if contains_markup(value) {
        errors.push(FieldError::new(
            NewsField::Title,
            FieldErrorReason::ContainsMarkup,
        ));
    }
}

fn validate_author(value: Option<&str>, errors: &mut Vec<FieldError>) {
    let Some(value) = value else {
        errors.push(FieldError::new(NewsField::Author, FieldErrorReason::Missing));
        return;
    };
    if value.trim().is_empty() {
        errors.push(FieldError::new(NewsField::Author, FieldErrorReason::Empty));
    }
    if contains_markup(value) {
        errors.push(FieldError::new(
            NewsField::Author,
            FieldErrorReason::ContainsMarkup,
        ));
    }
}

/// A submission that passed validation. Text fields are trimmed; blank optional fields are
/// dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedNews {
    title: String,
    author: String,
    description: Option<String>,
    link: Option<String>,
    image_ref: Option<String>,
}

impl ValidatedNews {
    pub fn try_from_draft(draft: NewsDraft) -> Result<Self, ValidationErrors> {
        let errors = draft.validate();
        if !errors.is_empty() {
            return Err(ValidationErrors(errors));
        }
        Ok(Self {
            title: trimmed(draft.title).unwrap_or_default(),
            author: trimmed(draft.author).unwrap_or_default(),
            description: trimmed(draft.description),
            link: trimmed(draft.link),
            image_ref: trimmed(draft.image_url),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    pub fn image_ref(&self) -> Option<&str> {
        self.image_ref.as_deref()
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
