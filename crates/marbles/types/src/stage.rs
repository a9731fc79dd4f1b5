use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of review stages carried by every marble.
pub const STAGE_COUNT: usize = 8;

/// The fixed review stages of a financing application, in order.
///
/// Stages are addressed through this enum rather than bare indices so that
/// moving to the following stage can never step past [`StageKind::End`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Application created; completed automatically by the creator.
    New,
    /// Supplier submits the application.
    SupplierApply,
    /// Core enterprise confirms the underlying trade.
    EnterpriseCheck,
    /// Bank reviews and grants the loan.
    BankCheck,
    /// Supplier confirms receipt of the loan.
    SupplierReceipt,
    /// Core enterprise repays.
    EnterpriseRepayment,
    /// Supplier settles the repayment with the bank.
    SupplierRepayment,
    /// Terminal summary of the whole application.
    End,
}

impl StageKind {
    pub const ALL: [StageKind; STAGE_COUNT] = [
        StageKind::New,
        StageKind::SupplierApply,
        StageKind::EnterpriseCheck,
        StageKind::BankCheck,
        StageKind::SupplierReceipt,
        StageKind::EnterpriseRepayment,
        StageKind::SupplierRepayment,
        StageKind::End,
    ];

    /// Last stage a participant acts on; its success completes the marble.
    pub const FINAL_REVIEW: StageKind = StageKind::SupplierRepayment;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The stage that follows this one, `None` for [`StageKind::End`].
    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    /// Stages a participant may review (everything except `New` and `End`).
    pub fn is_reviewable(self) -> bool {
        !matches!(self, StageKind::New | StageKind::End)
    }

    /// Iterate the reviewable stages in order.
    pub fn reviewable() -> impl Iterator<Item = StageKind> {
        Self::ALL.into_iter().filter(|stage| stage.is_reviewable())
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::SupplierApply => "supplier_apply",
            Self::EnterpriseCheck => "enterprise_check",
            Self::BankCheck => "bank_check",
            Self::SupplierReceipt => "supplier_receipt",
            Self::EnterpriseRepayment => "enterprise_repayment",
            Self::SupplierRepayment => "supplier_repayment",
            Self::End => "end",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Review status of a single stage.
///
/// Persisted as a small integer (`0..=3`) under the `review` field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ReviewStatus {
    /// Not reached yet.
    #[default]
    Disabled = 0,
    /// The current actionable stage.
    Waiting = 1,
    Success = 2,
    Failure = 3,
}

impl ReviewStatus {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Disabled),
            1 => Some(Self::Waiting),
            2 => Some(Self::Success),
            3 => Some(Self::Failure),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Waiting => "waiting",
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl TryFrom<u8> for ReviewStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown review status code {code}"))
    }
}

impl From<ReviewStatus> for u8 {
    fn from(status: ReviewStatus) -> Self {
        status.code()
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_has_no_successor() {
        assert_eq!(StageKind::SupplierRepayment.next(), Some(StageKind::End));
        assert_eq!(StageKind::End.next(), None);
    }

    #[test]
    fn indices_follow_declaration_order() {
        for (index, stage) in StageKind::ALL.iter().enumerate() {
            assert_eq!(stage.index(), index);
            assert_eq!(StageKind::from_index(index), Some(*stage));
        }
        assert_eq!(StageKind::from_index(STAGE_COUNT), None);
    }

    #[test]
    fn only_inner_stages_are_reviewable() {
        let reviewable: Vec<_> = StageKind::reviewable().map(StageKind::index).collect();
        assert_eq!(reviewable, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn review_status_encodes_as_integer() {
        assert_eq!(serde_json::to_string(&ReviewStatus::Failure).unwrap(), "3");
        let parsed: ReviewStatus = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, ReviewStatus::Waiting);
        assert!(serde_json::from_str::<ReviewStatus>("7").is_err());
    }
}
