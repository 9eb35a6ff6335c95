//! Control flow graph consistency check.
//!
//! Builds the graph of every method body and verifies the structural properties the
//! transforms rely on: predecessor lists mirror successor lists, the entry block starts
//! at the first entry, block ranges tile the stream in order and every branch target
//! resolves to a block.

use std::ops::Add;

use log::{info, warn};

use crate::{
    analysis::ControlFlowGraph,
    compiler::{fold_method_bodies, Config, MethodContext, MethodPass, Metrics, Pass, PassConfig},
    ir::{InstructionStream, MethodBody},
    metadata::Scope,
    Error, Result,
};

/// Counter: blocks over all checked bodies
pub const METRIC_BLOCKS: &str = "num_blocks";
/// Counter: edges over all checked bodies
pub const METRIC_EDGES: &str = "num_edges";
/// Counter: blocks not reachable from their method entry
pub const METRIC_UNREACHABLE_BLOCKS: &str = "num_unreachable_blocks";
/// Counter: inconsistencies found, including graphs that failed to build
pub const METRIC_CFG_ERRORS: &str = "num_cfg_errors";

/// Per-method results of [`CfgCheckPass`], summed over a scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CfgStats {
    /// Number of blocks
    pub blocks: usize,
    /// Number of edges
    pub edges: usize,
    /// Blocks not reachable from the entry
    pub unreachable_blocks: usize,
    /// Inconsistencies found
    pub errors: usize,
}

impl Add for CfgStats {
    type Output = CfgStats;

    fn add(self, other: CfgStats) -> CfgStats {
        CfgStats {
            blocks: self.blocks + other.blocks,
            edges: self.edges + other.edges,
            unreachable_blocks: self.unreachable_blocks + other.unreachable_blocks,
            errors: self.errors + other.errors,
        }
    }
}

/// Verifies the control flow graph of every method body.
///
/// Options:
///
/// - `fail_on_error` (bool, default `true`): abort with [`Error::GraphError`] on the
///   first inconsistency. When `false`, inconsistencies are logged and counted. A pass
///   config without the key keeps the value set through [`CfgCheckPass::with_fail_on_error`].
#[derive(Debug, Clone, Copy)]
pub struct CfgCheckPass {
    fail_on_error: bool,
}

impl Default for CfgCheckPass {
    fn default() -> Self {
        CfgCheckPass {
            fail_on_error: true,
        }
    }
}

impl CfgCheckPass {
    /// Creates the pass with `fail_on_error` set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether the first inconsistency aborts the pass.
    #[must_use]
    pub fn with_fail_on_error(mut self, fail_on_error: bool) -> Self {
        self.fail_on_error = fail_on_error;
        self
    }

    /// Builds and checks the graph of one body.
    ///
    /// # Errors
    ///
    /// With `fail_on_error` set, returns [`Error::GraphError`] for the first
    /// inconsistency or a graph that cannot be built.
    pub fn check_method(&self, method: MethodContext<'_>, body: &mut MethodBody) -> Result<CfgStats> {
        let (stream, cfg) = match body.stream_and_cfg() {
            Ok(pair) => pair,
            Err(Error::GraphError(message)) if !self.fail_on_error => {
                warn!("{method}: {message}");
                return Ok(CfgStats {
                    errors: 1,
                    ..CfgStats::default()
                });
            }
            Err(error) => return Err(error),
        };

        let problems = verify(stream, cfg)?;
        if let Some(first) = problems.first() {
            if self.fail_on_error {
                return Err(Error::GraphError(format!("{method}: {first}")));
            }
            for problem in &problems {
                warn!("{method}: {problem}");
            }
        }

        Ok(CfgStats {
            blocks: cfg.block_count(),
            edges: cfg.edge_count(),
            unreachable_blocks: cfg.unreachable_blocks().len(),
            errors: problems.len(),
        })
    }
}

/// Lists the inconsistencies between `cfg` and the stream it was built from.
///
/// # Errors
///
/// Returns [`Error::StaleGraph`] if `stream` was edited after the build.
pub fn verify(stream: &InstructionStream, cfg: &ControlFlowGraph) -> Result<Vec<String>> {
    cfg.check_fresh(stream)?;
    let mut problems = Vec::new();

    let mut forward = Vec::with_capacity(cfg.edge_count());
    let mut backward = Vec::with_capacity(cfg.edge_count());
    for block in cfg.blocks() {
        forward.extend(cfg.successors(block.id).map(|to| (block.id, to)));
        backward.extend(cfg.predecessors(block.id).map(|from| (from, block.id)));
    }
    forward.sort_unstable();
    backward.sort_unstable();
    if forward != backward {
        problems.push(format!(
            "predecessor lists do not mirror successor lists ({} successor and {} predecessor links)",
            forward.len(),
            backward.len()
        ));
    }

    let entry_first = cfg.entry().and_then(|node| cfg.block(node)).map(|b| b.first);
    if entry_first != stream.first() {
        problems.push("entry block does not start at the first entry".to_string());
    }

    let mut expected = stream.first();
    let mut tiled = true;
    for block in cfg.blocks() {
        if expected != Some(block.first) || stream.iter_range(block.first, block.last).is_err() {
            problems.push(format!("block {} does not continue the previous block", block.id));
            tiled = false;
            break;
        }
        match stream.next(block.last) {
            Ok(next) => expected = next,
            Err(_) => {
                problems.push(format!("block {} ends outside the stream", block.id));
                tiled = false;
                break;
            }
        }
    }
    if tiled && expected.is_some() {
        problems.push("blocks do not cover the end of the stream".to_string());
    }

    for (id, entry) in stream.iter() {
        let Some(instruction) = entry.as_instruction() else {
            continue;
        };
        for label in instruction.targets() {
            if cfg.block_of_label(label).is_none() {
                problems.push(format!("{instruction} at {id} targets unresolved label {label}"));
            }
        }
    }

    Ok(problems)
}

impl MethodPass for CfgCheckPass {
    fn run_on_method(&self, method: MethodContext<'_>, body: &mut MethodBody) -> Result<usize> {
        Ok(self.check_method(method, body)?.errors)
    }
}

impl Pass for CfgCheckPass {
    fn name(&self) -> &'static str {
        "CfgCheckPass"
    }

    fn description(&self) -> &'static str {
        "Verifies the control flow graph of every method body"
    }

    fn configure(&mut self, config: &PassConfig) -> Result<()> {
        self.fail_on_error = config.get_bool("fail_on_error", self.fail_on_error);
        Ok(())
    }

    fn run_pass(&self, scope: &mut Scope, config: &Config, metrics: &Metrics) -> Result<()> {
        let stats = fold_method_bodies(scope, config.parallel, |method, body| {
            self.check_method(method, body)
        })?;

        let count = |value: usize| i64::try_from(value).unwrap_or(i64::MAX);
        metrics.incr_metric(METRIC_BLOCKS, count(stats.blocks));
        metrics.incr_metric(METRIC_EDGES, count(stats.edges));
        metrics.incr_metric(METRIC_UNREACHABLE_BLOCKS, count(stats.unreachable_blocks));
        metrics.incr_metric(METRIC_CFG_ERRORS, count(stats.errors));

        if stats.errors > 0 {
            warn!("Found {} control flow graph inconsistencies", stats.errors);
        } else {
            info!("Checked {} blocks and {} edges", stats.blocks, stats.edges);
        }
        Ok(())
    }
}
