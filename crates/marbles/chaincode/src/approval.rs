//! Multi-party approval state machine.
//!
//! Each stage moves `Disabled -> Waiting -> {Success, Failure}` and stages
//! are resolved strictly in order. At most one stage is `Waiting` at a time.
//! A success hands the marble to the next stage; success of the final review
//! also resolves `End` to success. A failure at any stage resolves `End` to
//! failure and nothing after it ever becomes actionable.
//!
//! Timestamps come from the transaction, never from the wall clock, so the
//! same invocation replayed against the same state yields the same bytes.

use crate::config::{ActorTable, ChaincodeConfig};
use crate::directory::Directory;
use crate::error::{ChaincodeError, ChaincodeResult};
use crate::store;
use marbles_ledger::LedgerStub;
use marbles_types::{Marble, ReviewStatus, StageKind, User};
use tracing::{debug, info};

/// Format of `CheckInfo::date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Verdict submitted by a reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    /// Decode the wire value: `2` approves, `3` rejects.
    pub fn from_code(code: u8) -> ChaincodeResult<Self> {
        match ReviewStatus::from_code(code) {
            Some(ReviewStatus::Success) => Ok(Self::Approve),
            Some(ReviewStatus::Failure) => Ok(Self::Reject),
            _ => Err(ChaincodeError::State(format!(
                "the marble state is wrong: {code} is not a review verdict"
            ))),
        }
    }

    pub fn status(self) -> ReviewStatus {
        match self {
            Self::Approve => ReviewStatus::Success,
            Self::Reject => ReviewStatus::Failure,
        }
    }
}

/// How the stage under review is located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageSelector {
    /// The caller names the stage index and may name the next reviewer.
    Explicit {
        stage: usize,
        next_reviewer: Option<String>,
    },
    /// The waiting stage is found by scanning; the next reviewer is the first
    /// enabled user of the company that owns the following stage.
    AutoDetect,
}

/// A request to resolve one stage of a marble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRequest {
    pub marble_id: String,
    pub reviewer_id: String,
    pub selector: StageSelector,
    pub decision: ReviewDecision,
    pub comment: String,
}

/// Result of a committed review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewOutcome {
    pub stage: StageKind,
    pub status: ReviewStatus,
    pub marble: Marble,
}

/// Stage sequencing and actor authorization.
#[derive(Debug, Clone, Default)]
pub struct ApprovalMachine {
    actors: ActorTable,
}

impl ApprovalMachine {
    pub fn new(actors: ActorTable) -> Self {
        Self { actors }
    }

    pub fn actors(&self) -> &ActorTable {
        &self.actors
    }

    /// Seed the stages of a freshly created marble: `New` is completed by the
    /// creator and `SupplierApply` waits on the creator.
    pub fn open(&self, marble: &mut Marble, creator: &User, date: &str) {
        let new = marble.stage_mut(StageKind::New);
        new.actor_id = creator.id.clone();
        new.company = creator.company.clone();
        new.status = ReviewStatus::Success;
        new.date = date.to_string();
        new.comment = "new marbles".to_string();

        let apply = marble.stage_mut(StageKind::SupplierApply);
        apply.actor_id = creator.id.clone();
        apply.company = creator.company.clone();
        apply.status = ReviewStatus::Waiting;
    }

    /// Resolve one stage and write the marble back.
    ///
    /// Checks run in order: the reviewer exists and is enabled, the stage is
    /// reviewable, the reviewer is the stage's assigned actor, and the stage
    /// is `Waiting`. Nothing is written when any check fails.
    pub fn review(
        &self,
        stub: &mut dyn LedgerStub,
        config: &ChaincodeConfig,
        request: &ReviewRequest,
    ) -> ChaincodeResult<ReviewOutcome> {
        let reviewer = store::get_user(stub, &request.reviewer_id)?;
        if !reviewer.enabled {
            return Err(ChaincodeError::Authorization(format!(
                "user {} is disabled",
                reviewer.id
            )));
        }

        let (mut marble, stage, next_reviewer) = match &request.selector {
            StageSelector::Explicit {
                stage,
                next_reviewer,
            } => {
                let stage = reviewable_stage(*stage)?;
                let marble = store::get_marble(stub, &request.marble_id)?;
                let next = next_reviewer
                    .clone()
                    .unwrap_or_else(|| reviewer.id.clone());
                (marble, stage, next)
            }
            StageSelector::AutoDetect => {
                let marble = store::get_marble(stub, &request.marble_id)?;
                let stage = marble.waiting_stage().ok_or_else(|| {
                    ChaincodeError::State(format!(
                        "marble {} has no stage awaiting review",
                        marble.id
                    ))
                })?;
                let required = self.actors.company_for(stage);
                if reviewer.company != required {
                    return Err(ChaincodeError::Authorization(format!(
                        "company '{}' may not review stage {stage}, which belongs to '{required}'",
                        reviewer.company
                    )));
                }
                let next = match (request.decision, stage.next()) {
                    (ReviewDecision::Approve, Some(next)) if next != StageKind::End => {
                        let company = self.actors.company_for(next);
                        Directory::new(&*stub, config)
                            .find_user_by_company(company)?
                            .id
                    }
                    _ => reviewer.id.clone(),
                };
                (marble, stage, next)
            }
        };

        let check = marble.stage(stage);
        if check.actor_id != reviewer.id {
            return Err(ChaincodeError::Authorization(format!(
                "user {} has no competence to review stage {stage} of marble {}",
                reviewer.id, marble.id
            )));
        }
        if check.status != ReviewStatus::Waiting {
            return Err(ChaincodeError::State(format!(
                "stage {stage} of marble {} is {}, not waiting",
                marble.id, check.status
            )));
        }

        let date = stub.tx_timestamp().format(DATE_FORMAT).to_string();
        resolve(
            &mut marble,
            stage,
            request.decision,
            &reviewer,
            next_reviewer,
            &request.comment,
            &date,
        );
        store::put_record(stub, &marble)?;

        let status = request.decision.status();
        info!(
            marble_id = %marble.id,
            reviewer = %reviewer.id,
            stage = %stage,
            status = %status,
            end = %marble.stage(StageKind::End).status,
            "stage resolved"
        );
        Ok(ReviewOutcome {
            stage,
            status,
            marble,
        })
    }
}

fn reviewable_stage(index: usize) -> ChaincodeResult<StageKind> {
    StageKind::from_index(index)
        .filter(|stage| stage.is_reviewable())
        .ok_or_else(|| ChaincodeError::State(format!("stage {index} cannot be reviewed")))
}

/// Apply a verified decision to `stage`. `next_reviewer` is assigned to the
/// following stage on approval.
fn resolve(
    marble: &mut Marble,
    stage: StageKind,
    decision: ReviewDecision,
    reviewer: &User,
    next_reviewer: String,
    comment: &str,
    date: &str,
) {
    let check = marble.stage_mut(stage);
    check.company = reviewer.company.clone();
    check.status = decision.status();
    check.date = date.to_string();
    check.comment = comment.to_string();

    match decision {
        ReviewDecision::Approve => match stage.next() {
            Some(StageKind::End) | None => {
                // No actor on a successful End.
                let end = marble.stage_mut(StageKind::End);
                end.company = reviewer.company.clone();
                end.status = ReviewStatus::Success;
                end.date = date.to_string();
                end.comment = "the marble is end success".to_string();
            }
            Some(next) => {
                debug!(stage = %next, reviewer = %next_reviewer, "next stage assigned");
                let following = marble.stage_mut(next);
                following.actor_id = next_reviewer;
                following.status = ReviewStatus::Waiting;
            }
        },
        ReviewDecision::Reject => {
            let end = marble.stage_mut(StageKind::End);
            end.actor_id = reviewer.id.clone();
            end.company = reviewer.company.clone();
            end.status = ReviewStatus::Failure;
            end.date = date.to_string();
            end.comment = format!("the marble is end failure at {stage}: {comment}");
        }
    }
}
