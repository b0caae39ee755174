use thiserror::Error;

pub type MarkupResult<T> = Result<T, MarkupError>;

#[derive(Error, Debug, Clone)]
pub enum MarkupError {
    #[error("Parse error at line {line}, column {column}: {message}")]
    ParseError {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Maximum nesting depth ({max_depth}) exceeded")]
    MaxNestingDepthExceeded { max_depth: usize },

    #[error("Duplicate id '{id}': element ids must be unique within the document")]
    DuplicateId { id: String },

    #[error("Invalid tag name '{tag}': must start with a letter and contain only letters, digits, and dashes")]
    InvalidTagName { tag: String },
}

impl From<roxmltree::Error> for MarkupError {
    fn from(err: roxmltree::Error) -> Self {
        let pos = err.pos();
        MarkupError::ParseError {
            line: pos.row as usize,
            column: pos.col as usize,
            message: err.to_string(),
        }
    }
}
