//! Chaincode configuration.

use crate::error::{ChaincodeError, ChaincodeResult};
use marbles_types::{StageKind, STAGE_COUNT};
use serde::{Deserialize, Serialize};

/// Main chaincode configuration. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaincodeConfig {
    /// Upper bound on the length of every invocation argument.
    pub max_argument_len: usize,

    /// Number of leading stages inspected when deciding whether a user is a
    /// reviewer of a marble. `8` inspects every stage.
    pub reviewer_stage_depth: usize,

    /// Key range holding marbles.
    pub marble_range: KeyRange,

    /// Key range holding users.
    pub user_range: KeyRange,

    /// Company required to act at each stage, indexed by stage.
    pub stage_companies: Vec<String>,

    /// Client application version written by `init`.
    pub ui_version: String,
}

impl Default for ChaincodeConfig {
    fn default() -> Self {
        Self {
            max_argument_len: 32,
            reviewer_stage_depth: 4,
            marble_range: KeyRange::new("m0", "m9999999999999999999"),
            user_range: KeyRange::new("o0", "o9999999999999999999"),
            stage_companies: ActorTable::default().companies().to_vec(),
            ui_version: "4.0.1".to_string(),
        }
    }
}

impl ChaincodeConfig {
    pub fn validate(&self) -> ChaincodeResult<()> {
        if self.max_argument_len == 0 {
            return Err(ChaincodeError::Config(
                "max_argument_len must be positive".to_string(),
            ));
        }
        if self.reviewer_stage_depth > STAGE_COUNT {
            return Err(ChaincodeError::Config(format!(
                "reviewer_stage_depth must be <= {STAGE_COUNT}, got {}",
                self.reviewer_stage_depth
            )));
        }
        self.marble_range.validate("marble_range")?;
        self.user_range.validate("user_range")?;
        ActorTable::from_companies(&self.stage_companies)?;
        if self.ui_version.is_empty() {
            return Err(ChaincodeError::Config(
                "ui_version must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn actor_table(&self) -> ChaincodeResult<ActorTable> {
        ActorTable::from_companies(&self.stage_companies)
    }
}

/// Half-open key range `[start, end)` scanned by directory queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRange {
    pub start: String,
    pub end: String,
}

impl KeyRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    fn validate(&self, name: &str) -> ChaincodeResult<()> {
        if !self.start.is_empty() && !self.end.is_empty() && self.start >= self.end {
            return Err(ChaincodeError::Config(format!(
                "{name}: start '{}' must sort before end '{}'",
                self.start, self.end
            )));
        }
        Ok(())
    }
}

/// Company required to act at each stage.
///
/// Built once from configuration and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorTable {
    companies: [String; STAGE_COUNT],
}

impl ActorTable {
    pub const SUPPLIER: &'static str = "supplier";
    pub const CORE_ENTERPRISE: &'static str = "core-enterprise";
    pub const BANK: &'static str = "bank";

    pub fn from_companies(companies: &[String]) -> ChaincodeResult<Self> {
        if companies.len() != STAGE_COUNT {
            return Err(ChaincodeError::Config(format!(
                "stage_companies must name {STAGE_COUNT} companies, got {}",
                companies.len()
            )));
        }
        if let Some(index) = companies.iter().position(|company| company.is_empty()) {
            return Err(ChaincodeError::Config(format!(
                "stage_companies[{index}] must not be empty"
            )));
        }
        Ok(Self {
            companies: std::array::from_fn(|index| companies[index].clone()),
        })
    }

    pub fn company_for(&self, stage: StageKind) -> &str {
        &self.companies[stage.index()]
    }

    pub fn companies(&self) -> &[String] {
        &self.companies
    }
}

impl Default for ActorTable {
    fn default() -> Self {
        let company_for = |stage: StageKind| match stage {
            StageKind::New
            | StageKind::SupplierApply
            | StageKind::SupplierReceipt
            | StageKind::SupplierRepayment => Self::SUPPLIER,
            StageKind::EnterpriseCheck | StageKind::EnterpriseRepayment => Self::CORE_ENTERPRISE,
            StageKind::BankCheck | StageKind::End => Self::BANK,
        };
        Self {
            companies: StageKind::ALL.map(|stage| company_for(stage).to_string()),
        }
    }
}
