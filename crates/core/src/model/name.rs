use serde::{Deserialize, Serialize};

use crate::model::ids::NameNumber;

/// One entry of the names catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
    pub number: NameNumber,
    pub arabic: String,
    pub transliteration: String,
    pub meaning: String,
}

impl Name {
    #[must_use]
    pub fn new(
        number: NameNumber,
        arabic: impl Into<String>,
        transliteration: impl Into<String>,
        meaning: impl Into<String>,
    ) -> Self {
        Self {
            number,
            arabic: arabic.into(),
            transliteration: transliteration.into(),
            meaning: meaning.into(),
        }
    }
}
