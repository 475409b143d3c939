use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::UnknownVariant;

/// One of the four exam sections. Which of them a mock uses, and in what
/// order, is configured per mock through `MockSection::position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Listening,
    Reading,
    Writing,
    Speaking,
}

impl SectionKind {
    pub const ALL: [SectionKind; 4] = [
        SectionKind::Listening,
        SectionKind::Reading,
        SectionKind::Writing,
        SectionKind::Speaking,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Listening => "listening",
            SectionKind::Reading => "reading",
            SectionKind::Writing => "writing",
            SectionKind::Speaking => "speaking",
        }
    }

    /// Page path the delivery layer serves this section from.
    pub fn page_path(&self) -> String {
        format!("/{}/", self.as_str())
    }
}

impl Default for SectionKind {
    fn default() -> Self {
        SectionKind::Listening
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("section kind", s))
    }
}

impl TryFrom<String> for SectionKind {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_kinds_and_rejects_others() {
        assert_eq!("reading".parse::<SectionKind>().unwrap(), SectionKind::Reading);
        assert_eq!(SectionKind::Speaking.page_path(), "/speaking/");
        assert!("maths".parse::<SectionKind>().is_err());
    }
}
