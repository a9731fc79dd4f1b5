use crate::codec::LedgerRecord;
use serde::{Deserialize, Serialize};

/// `docType` written on every user record.
pub const USER_DOC_TYPE: &str = "marble_user";

/// A participant identity.
///
/// Users are keyed by `id`. Once disabled they disappear from every
/// directory listing and may no longer create or review marbles.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(rename = "docType")]
    pub doc_type: String,
    pub id: String,
    pub username: String,
    pub company: String,
    pub enabled: bool,
}

impl User {
    /// Build a new, enabled user. The username is stored lowercase.
    pub fn new(
        id: impl Into<String>,
        username: impl AsRef<str>,
        company: impl Into<String>,
    ) -> Self {
        Self {
            doc_type: USER_DOC_TYPE.to_string(),
            id: id.into(),
            username: username.as_ref().to_lowercase(),
            company: company.into(),
            enabled: true,
        }
    }
}

impl LedgerRecord for User {
    const DOC_TYPE: &'static str = USER_DOC_TYPE;

    fn record_id(&self) -> &str {
        &self.id
    }

    fn doc_type(&self) -> &str {
        &self.doc_type
    }
}
