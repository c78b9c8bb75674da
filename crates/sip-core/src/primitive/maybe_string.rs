use std::fmt;

/// A value that is either absent, or present (possibly empty).
///
/// SIP parameter lists distinguish three states for `;foo`: the parameter
/// is not present at all, the parameter is present with no `=` (a
/// singleton flag, value `None`), and the parameter is present with an
/// empty value (`;foo=`, value `Some("")`). Modelling the value as
/// `Option<String>` would conflate the last two; `MaybeString` keeps them
/// distinct end to end.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum MaybeString {
    #[default]
    None,
    Some(String),
}

impl MaybeString {
    pub fn some(s: impl Into<String>) -> Self {
        MaybeString::Some(s.into())
    }

    pub fn is_none(&self) -> bool {
        matches!(self, MaybeString::None)
    }

    pub fn is_some(&self) -> bool {
        matches!(self, MaybeString::Some(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MaybeString::None => None,
            MaybeString::Some(s) => Some(s.as_str()),
        }
    }

    pub fn into_string(self) -> Option<String> {
        match self {
            MaybeString::None => None,
            MaybeString::Some(s) => Some(s),
        }
    }
}

impl fmt::Display for MaybeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaybeString::None => Ok(()),
            MaybeString::Some(s) => write!(f, "{s}"),
        }
    }
}

impl From<Option<String>> for MaybeString {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(s) => MaybeString::Some(s),
            None => MaybeString::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinguishes_absent_empty_and_present() {
        let absent = MaybeString::None;
        let empty = MaybeString::some("");
        let present = MaybeString::some("bar");

        assert_ne!(absent, empty);
        assert_ne!(empty, present);
        assert_eq!(absent.as_str(), None);
        assert_eq!(empty.as_str(), Some(""));
        assert_eq!(present.as_str(), Some("bar"));
    }

    #[test]
    fn display_renders_only_the_value() {
        assert_eq!(MaybeString::None.to_string(), "");
        assert_eq!(MaybeString::some("x").to_string(), "x");
    }
}
