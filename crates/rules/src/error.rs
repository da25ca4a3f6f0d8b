use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot parse rule `{rule}`: {reason}")]
    Parse { rule: String, reason: String },
}

impl Error {
    #[must_use]
    pub fn parse(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            rule: rule.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_mentions_rule_and_reason() {
        let err = Error::parse("||example.org^$", "empty modifier list");
        let msg = err.to_string();
        assert!(msg.contains("||example.org^$"));
        assert!(msg.contains("empty modifier list"));
    }
}
