use crate::codec::LedgerRecord;
use crate::stage::{ReviewStatus, StageKind, STAGE_COUNT};
use crate::user::User;
use serde::{Deserialize, Serialize};

/// `docType` written on every marble record.
pub const MARBLE_DOC_TYPE: &str = "marble";

/// Denormalized copy of the owning user, kept for display.
///
/// Authority checks always re-resolve the user by `id`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserRelation {
    pub id: String,
    pub username: String,
    pub company: String,
}

impl From<&User> for UserRelation {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            company: user.company.clone(),
        }
    }
}

/// Outcome record of one review stage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckInfo {
    /// User expected (and allowed) to act at this stage.
    #[serde(rename = "userid")]
    pub actor_id: String,
    /// Company of the user who acted, recorded once acted.
    pub company: String,
    /// Transaction time of the action, `YYYY-MM-DD HH:MM:SS`.
    pub date: String,
    #[serde(rename = "review")]
    pub status: ReviewStatus,
    pub comment: String,
}

/// A financing application and its eight review stages.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Marble {
    #[serde(rename = "docType")]
    pub doc_type: String,
    pub id: String,
    pub title: String,
    /// Contract reference number.
    pub contact: String,
    pub balance: i64,
    #[serde(rename = "user")]
    pub owner: UserRelation,
    #[serde(rename = "check")]
    pub steps: [CheckInfo; STAGE_COUNT],
}

impl Marble {
    /// A marble owned by `owner` with every stage still disabled.
    pub fn new(
        id: impl Into<String>,
        contact: impl Into<String>,
        balance: i64,
        title: impl Into<String>,
        owner: &User,
    ) -> Self {
        Self {
            doc_type: MARBLE_DOC_TYPE.to_string(),
            id: id.into(),
            title: title.into(),
            contact: contact.into(),
            balance,
            owner: UserRelation::from(owner),
            steps: Default::default(),
        }
    }

    pub fn stage(&self, stage: StageKind) -> &CheckInfo {
        &self.steps[stage.index()]
    }

    pub fn stage_mut(&mut self, stage: StageKind) -> &mut CheckInfo {
        &mut self.steps[stage.index()]
    }

    /// The first reviewable stage currently waiting for action.
    pub fn waiting_stage(&self) -> Option<StageKind> {
        StageKind::reviewable().find(|stage| self.stage(*stage).status == ReviewStatus::Waiting)
    }

    /// Whether the workflow is still running (the end stage is not resolved).
    pub fn is_active(&self) -> bool {
        !self.stage(StageKind::End).status.is_terminal()
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner.id == user_id
    }

    /// Whether `user_id` is the assigned actor on any of the first `depth` stages.
    pub fn has_reviewer(&self, user_id: &str, depth: usize) -> bool {
        self.steps
            .iter()
            .take(depth)
            .any(|check| check.actor_id == user_id)
    }
}

impl LedgerRecord for Marble {
    const DOC_TYPE: &'static str = MARBLE_DOC_TYPE;

    fn record_id(&self) -> &str {
        &self.id
    }

    fn doc_type(&self) -> &str {
        &self.doc_type
    }
}
