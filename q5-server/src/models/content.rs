//! Bounded user-authored text

use super::validation::{required_text, ValidationError};
use super::hashtag::extract_hashtags;

macro_rules! bounded_text {
    ($(#[$meta:meta])* $name:ident, $field:literal, $max:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name(String);

        impl $name {
            /// Maximum length in characters
            pub const MAX_LEN: usize = $max;

            /// Trim and validate: non-empty, at most `MAX_LEN` characters.
            pub fn new(s: &str) -> Result<Self, ValidationError> {
                required_text($field, s, Self::MAX_LEN).map(Self)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

bounded_text!(
    /// Member display name
    FullName, "full_name", 120
);
bounded_text!(
    /// Feed post body
    PostBody, "body", 5000
);
bounded_text!(CommentBody, "body", 2000);
bounded_text!(QuestionTitle, "title", 300);
bounded_text!(QuestionBody, "body", 10_000);
bounded_text!(AnswerBody, "body", 10_000);
bounded_text!(
    /// Direct message body
    MessageBody, "body", 4000
);
bounded_text!(OrganizationName, "name", 200);

impl PostBody {
    /// Lowercased `#hashtags` in the body, deduplicated and sorted.
    pub fn hashtags(&self) -> Vec<String> {
        extract_hashtags(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_rejects_blank() {
        assert_eq!(PostBody::new("  hello  ").unwrap().as_str(), "hello");
        assert!(matches!(
            CommentBody::new("\n\t").unwrap_err(),
            ValidationError::Empty { field: "body" }
        ));
    }

    #[test]
    fn max_lengths() {
        assert!(QuestionTitle::new(&"q".repeat(300)).is_ok());
        assert!(matches!(
            QuestionTitle::new(&"q".repeat(301)).unwrap_err(),
            ValidationError::TooLong { field: "title", max: 300 }
        ));

        assert!(MessageBody::new(&"m".repeat(4000)).is_ok());
        assert!(MessageBody::new(&"m".repeat(4001)).is_err());
    }

    #[test]
    fn post_hashtags() {
        let body = PostBody::new("New #Qubit record at #IBM, see #qubit").unwrap();
        assert_eq!(body.hashtags(), vec!["ibm".to_owned(), "qubit".to_owned()]);
    }
}
