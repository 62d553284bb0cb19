// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to communicate with the solver process")]
    Solver(#[from] std::io::Error),
    #[error("unexpected solver response: {0}")]
    MalformedResponse(String),
    #[error("interpolation produced no new predicates for the spurious trace")]
    RefinementFailed,
    #[error("refinement made no progress on the same abstract trace twice")]
    Stalled,
    #[error("solver returned unknown for: {0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
