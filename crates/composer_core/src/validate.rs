//! Field-level rules for the draft. Each field is checked on its own.

use crate::Field;

/// Longest comment the server accepts.
pub const COMMENT_MAX_CHARS: usize = 369;

/// Length bounds for one field, counted in Unicode scalar values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthRule {
    pub required: bool,
    pub min: usize,
    pub max: usize,
}

impl LengthRule {
    pub const TITLE: LengthRule = LengthRule {
        required: true,
        min: 4,
        max: 30,
    };

    pub const CONTENT: LengthRule = LengthRule {
        required: true,
        min: 4,
        max: 2000,
    };

    pub const COMMENT: LengthRule = LengthRule {
        required: false,
        min: 0,
        max: COMMENT_MAX_CHARS,
    };

    pub fn for_field(field: Field) -> LengthRule {
        match field {
            Field::Title => LengthRule::TITLE,
            Field::Content => LengthRule::CONTENT,
        }
    }

    pub fn check(&self, value: &str) -> Option<FieldError> {
        let len = value.chars().count();
        if len == 0 {
            return self.required.then_some(FieldError::Required);
        }
        if len < self.min {
            Some(FieldError::TooShort { min: self.min })
        } else if len > self.max {
            Some(FieldError::TooLong { max: self.max })
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    Required,
    TooShort { min: usize },
    TooLong { max: usize },
}

impl FieldError {
    /// Inline message shown under the field. The only place field errors
    /// become text.
    pub fn message(&self, field: Field) -> String {
        match (self, field) {
            (FieldError::Required, Field::Title) => "Title of the post is required!".to_string(),
            (FieldError::Required, Field::Content) => {
                "Content of the post is required!".to_string()
            }
            (FieldError::TooShort { min }, _) => format!("Must be {min} characters or more"),
            (FieldError::TooLong { max }, _) => format!("Must be {max} characters or less"),
        }
    }
}

pub fn validate_field(field: Field, value: &str) -> Option<FieldError> {
    LengthRule::for_field(field).check(value)
}

/// Message blocking a comment submission, if any. Empty comments pass here;
/// the server decides what to do with them.
pub fn validate_comment(content: &str) -> Option<String> {
    LengthRule::COMMENT
        .check(content)
        .map(|_| format!("Comment must be less than {COMMENT_MAX_CHARS} characters"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_bounds_are_inclusive() {
        assert_eq!(validate_field(Field::Title, "abc"), Some(FieldError::TooShort { min: 4 }));
        assert_eq!(validate_field(Field::Title, "abcd"), None);
        assert_eq!(validate_field(Field::Title, &"a".repeat(30)), None);
        assert_eq!(
            validate_field(Field::Title, &"a".repeat(31)),
            Some(FieldError::TooLong { max: 30 })
        );
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        // Four characters, twelve bytes.
        assert_eq!(validate_field(Field::Title, "日本語ア"), None);
    }

    #[test]
    fn empty_value_reports_required_with_field_message() {
        let err = validate_field(Field::Content, "").unwrap();
        assert_eq!(err, FieldError::Required);
        assert_eq!(err.message(Field::Content), "Content of the post is required!");
        assert_eq!(
            FieldError::TooLong { max: 2000 }.message(Field::Content),
            "Must be 2000 characters or less"
        );
        assert_eq!(
            FieldError::TooShort { min: 4 }.message(Field::Title),
            "Must be 4 characters or more"
        );
    }

    #[test]
    fn comment_limit_is_369_characters() {
        assert_eq!(validate_comment(""), None);
        assert_eq!(validate_comment(&"é".repeat(369)), None);
        assert_eq!(
            validate_comment(&"a".repeat(370)).as_deref(),
            Some("Comment must be less than 369 characters")
        );
    }
}
