//! State module for tracking verification progress and link health
//!
//! # Components
//!
//! - `VerificationState`: states of the ownership verification state machine
//! - `LinkStatus`: health of a backlink or internal link in the final report

mod link_status;
mod verification_state;

// Re-export main types
pub use link_status::LinkStatus;
pub use verification_state::VerificationState;
