//! Built-in passes.
//!
//! - [`RemoveGotosPass`]: collapses chains of unconditional jumps by merging blocks
//! - [`CfgCheckPass`]: verifies the control flow graph of every body

mod cfgcheck;
mod removegotos;

pub use cfgcheck::{
    verify, CfgCheckPass, CfgStats, METRIC_BLOCKS, METRIC_CFG_ERRORS, METRIC_EDGES,
    METRIC_UNREACHABLE_BLOCKS,
};
pub use removegotos::{RemoveGotosPass, METRIC_GOTO_REMOVED};
