//! Invocation dispatch: function name plus string arguments in, payload out.

use crate::approval::{
    ApprovalMachine, ReviewDecision, ReviewOutcome, ReviewRequest, StageSelector,
};
use crate::config::ChaincodeConfig;
use crate::directory::Directory;
use crate::error::{ChaincodeError, ChaincodeResult};
use crate::lifecycle::{self, NewMarble};
use crate::store;
use crate::validation::{expect_count, parse_number, validate_arguments};
use marbles_ledger::LedgerStub;
use marbles_types::{LedgerRecord, ReviewStatus, StageKind};
use serde::Serialize;
use tracing::{instrument, warn};

/// Invocable functions, in dispatch order.
pub const FUNCTIONS: &[&str] = &[
    "init",
    "read",
    "write",
    "delete_marble",
    "init_marble",
    "init_owner",
    "disable_owner",
    "read_everything",
    "read_allmarble",
    "read_allstate",
    "getHistory",
    "getMarblesByRange",
    "tx_marble",
    "review_marble",
];

/// The marbles chaincode.
///
/// Holds only immutable configuration; all state lives in the ledger reached
/// through the stub passed to each call.
#[derive(Debug, Clone, Default)]
pub struct Chaincode {
    config: ChaincodeConfig,
    machine: ApprovalMachine,
}

impl Chaincode {
    pub fn new(config: ChaincodeConfig) -> ChaincodeResult<Self> {
        config.validate()?;
        let machine = ApprovalMachine::new(config.actor_table()?);
        Ok(Self { config, machine })
    }

    pub fn config(&self) -> &ChaincodeConfig {
        &self.config
    }

    pub fn machine(&self) -> &ApprovalMachine {
        &self.machine
    }

    pub fn directory<'a>(&'a self, stub: &'a dyn LedgerStub) -> Directory<'a> {
        Directory::new(stub, &self.config)
    }

    /// Instantiate/upgrade entry point. Arguments are not length-checked.
    #[instrument(skip(self, stub, args), fields(tx_id = %stub.tx_id()))]
    pub fn init(&self, stub: &mut dyn LedgerStub, args: &[String]) -> ChaincodeResult<Vec<u8>> {
        lifecycle::init(stub, &self.config, args)?;
        Ok(Vec::new())
    }

    /// Run `function` with `args`. On error nothing the call wrote should be
    /// committed by the host.
    #[instrument(skip(self, stub, args), fields(tx_id = %stub.tx_id(), args = args.len()))]
    pub fn invoke(
        &self,
        stub: &mut dyn LedgerStub,
        function: &str,
        args: &[String],
    ) -> ChaincodeResult<Vec<u8>> {
        let result = self.dispatch(stub, function, args);
        if let Err(err) = &result {
            warn!(function, error = %err, "invocation rejected");
        }
        result
    }

    fn dispatch(
        &self,
        stub: &mut dyn LedgerStub,
        function: &str,
        args: &[String],
    ) -> ChaincodeResult<Vec<u8>> {
        match function {
            "init" => self.init(stub, args),
            "read" => {
                self.arguments(args, &[1])?;
                lifecycle::generic_read(stub, &args[0])
            }
            "write" => {
                self.arguments(args, &[2])?;
                lifecycle::generic_write(stub, &args[0], &args[1])?;
                Ok(Vec::new())
            }
            "delete_marble" => {
                self.arguments(args, &[2])?;
                lifecycle::delete_marble(stub, &args[0], &args[1])?;
                Ok(Vec::new())
            }
            "init_marble" => {
                self.arguments(args, &[6])?;
                let request = NewMarble {
                    id: args[0].clone(),
                    contact: args[1].clone(),
                    balance: parse_number(args, 2)?,
                    title: args[3].clone(),
                    owner_id: args[4].clone(),
                    authorizing_company: args[5].clone(),
                };
                let (_, bytes) = lifecycle::create_marble(stub, &self.machine, &request)?;
                Ok(bytes)
            }
            "init_owner" => {
                self.arguments(args, &[3])?;
                lifecycle::create_user(stub, &args[0], &args[1], &args[2])?;
                Ok(Vec::new())
            }
            "disable_owner" => {
                self.arguments(args, &[2])?;
                lifecycle::disable_user(stub, &args[0], &args[1])?;
                Ok(Vec::new())
            }
            "read_everything" => {
                self.arguments(args, &[0, 1])?;
                let company = args.first().map(String::as_str);
                respond(&self.directory(stub).everything(company)?)
            }
            "read_allmarble" => {
                self.arguments(args, &[1, 3])?;
                self.marbles_for(stub, args)
            }
            "read_allstate" => {
                self.arguments(args, &[3])?;
                self.marbles_for(stub, args)
            }
            "getHistory" => {
                self.arguments(args, &[1])?;
                respond(&self.directory(stub).history(&args[0])?)
            }
            "getMarblesByRange" => {
                self.arguments(args, &[2])?;
                respond(&self.directory(stub).range(&args[0], &args[1])?)
            }
            "tx_marble" => {
                self.arguments(args, &[5, 6])?;
                let (next_reviewer, comment) = match args.len() {
                    6 => (Some(args[4].clone()), &args[5]),
                    _ => (None, &args[4]),
                };
                let request = ReviewRequest {
                    marble_id: args[0].clone(),
                    reviewer_id: args[1].clone(),
                    selector: StageSelector::Explicit {
                        stage: stage_index(args, 2)?,
                        next_reviewer,
                    },
                    decision: decision(args, 3)?,
                    comment: comment.clone(),
                };
                Ok(self.review(stub, &request)?.marble.encode()?)
            }
            "review_marble" => {
                self.arguments(args, &[4])?;
                let request = ReviewRequest {
                    marble_id: args[0].clone(),
                    reviewer_id: args[1].clone(),
                    selector: StageSelector::AutoDetect,
                    decision: decision(args, 2)?,
                    comment: args[3].clone(),
                };
                Ok(self.review(stub, &request)?.marble.encode()?)
            }
            other => Err(ChaincodeError::UnknownFunction(other.to_string())),
        }
    }

    /// Resolve one stage of a marble.
    pub fn review(
        &self,
        stub: &mut dyn LedgerStub,
        request: &ReviewRequest,
    ) -> ChaincodeResult<ReviewOutcome> {
        self.machine.review(stub, &self.config, request)
    }

    /// `userId [, stage, status]`: marbles relevant to an enabled user,
    /// optionally narrowed to one stage status.
    fn marbles_for(&self, stub: &dyn LedgerStub, args: &[String]) -> ChaincodeResult<Vec<u8>> {
        let user = store::get_user(stub, &args[0])?;
        if !user.enabled {
            return Err(ChaincodeError::Authorization(format!(
                "user {} is disabled",
                user.id
            )));
        }
        let directory = self.directory(stub);
        let marbles = if args.len() == 3 {
            let stage = StageKind::from_index(stage_index(args, 1)?).ok_or_else(|| {
                ChaincodeError::State(format!("stage {} does not exist", args[1]))
            })?;
            directory.marbles_by_stage_status(&user.id, stage, status(args, 2)?)?
        } else {
            directory.marbles_relevant_to(&user.id)?
        };
        respond(&marbles)
    }

    fn arguments(&self, args: &[String], counts: &[usize]) -> ChaincodeResult<()> {
        expect_count(args, counts)?;
        validate_arguments(args, self.config.max_argument_len)?;
        Ok(())
    }
}

fn respond<T: Serialize + ?Sized>(value: &T) -> ChaincodeResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn stage_index(args: &[String], index: usize) -> ChaincodeResult<usize> {
    let value: i64 = parse_number(args, index)?;
    usize::try_from(value)
        .map_err(|_| ChaincodeError::State(format!("stage {value} does not exist")))
}

fn code(args: &[String], index: usize) -> ChaincodeResult<u8> {
    let value: i64 = parse_number(args, index)?;
    u8::try_from(value)
        .map_err(|_| ChaincodeError::State(format!("the marble state is wrong: {value}")))
}

fn decision(args: &[String], index: usize) -> ChaincodeResult<ReviewDecision> {
    ReviewDecision::from_code(code(args, index)?)
}

fn status(args: &[String], index: usize) -> ChaincodeResult<ReviewStatus> {
    let value = code(args, index)?;
    ReviewStatus::from_code(value)
        .ok_or_else(|| ChaincodeError::State(format!("the marble state is wrong: {value}")))
}
