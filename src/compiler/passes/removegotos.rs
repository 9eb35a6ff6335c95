//! Goto chain removal by block merging.
//!
//! This pass finds a block that ends in an unconditional jump to a block nobody else
//! reaches, and moves the jumped-to block's entries in place of the jump. Repeated to a
//! fixed point, every chain of such jumps collapses into straight-line code.
//!
//! # Example
//!
//! Before:
//! ```text
//! B0: iload_0; goto L1
//! B1: L2: return
//! B2: L1: iinc 0 1; goto L2
//! ```
//!
//! After:
//! ```text
//! B0: iload_0; iinc 0 1; return
//! ```
//!
//! # Algorithm
//!
//! 1. Build the control flow graph of the current stream
//! 2. Take the first block, in stream order, that forms a mergeable pair with its
//!    successor
//! 3. Remove the successor's entries, dropping the target marker of the jump's label
//! 4. Insert them after the jump and erase the jump
//! 5. Repeat until no pair is left
//!
//! Every round removes one jump and adds none, so the number of rounds is bounded by
//! the instruction count.

use log::{debug, info, trace};

use crate::{
    analysis::{BasicBlock, ControlFlowGraph},
    compiler::{walk_method_bodies, Config, MethodContext, MethodPass, Metrics, Pass},
    ir::{Entry, EntryId, InstructionStream, Label, MethodBody},
    metadata::{MethodDef, Scope},
    utils::graph::NodeId,
    Error::{GraphError, MissingBody},
    Result,
};

/// Counter of removed jumps.
pub const METRIC_GOTO_REMOVED: &str = "num_goto_removed";

/// Merges goto-linked blocks.
///
/// A block `current` and its successor `next` are merged when
///
/// - `current` ends in `goto` or `goto_w` and has exactly one successor, `next`;
/// - `next` is not `current` and has exactly one predecessor;
/// - `next` ends in its own jump, or has no successors and does not fall off its end;
/// - `next` is neither the entry block nor an exception handler, holds no try or catch
///   markers and is protected by exactly the same regions as `current`.
///
/// Exception edges count as successors, so a jump inside a protected region is never
/// merged.
#[derive(Debug, Default, Clone, Copy)]
pub struct RemoveGotosPass;

struct MergePlan {
    current: NodeId,
    next: NodeId,
    jump: EntryId,
    label: Label,
    entries: Vec<EntryId>,
}

impl RemoveGotosPass {
    /// Creates the pass.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Runs the transform on a single method.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MissingBody`] if the method has no code, and any error of
    /// [`MethodPass::run_on_method`].
    pub fn optimize_method(&self, method: &mut MethodDef) -> Result<usize> {
        let MethodDef {
            ref owner,
            ref name,
            ref descriptor,
            access,
            ref mut body,
        } = *method;
        let context = MethodContext {
            owner,
            name,
            descriptor,
            access,
        };

        let body = body
            .as_mut()
            .ok_or_else(|| MissingBody(context.to_string()))?;
        self.run_on_method(context, body)
    }

    fn find_merge(cfg: &ControlFlowGraph) -> Option<(NodeId, NodeId)> {
        cfg.blocks().find_map(|current| {
            if !current.ends_in_goto || cfg.out_degree(current.id) != 1 {
                return None;
            }
            let next = cfg.successors(current.id).next()?;
            if next == current.id {
                return None;
            }
            Self::is_mergeable(cfg, current, cfg.block(next)?).then_some((current.id, next))
        })
    }

    fn is_mergeable(cfg: &ControlFlowGraph, current: &BasicBlock, next: &BasicBlock) -> bool {
        if cfg.in_degree(next.id) != 1 {
            return false;
        }
        if !next.ends_in_goto && (cfg.out_degree(next.id) != 0 || next.falls_through()) {
            return false;
        }

        cfg.entry() != Some(next.id)
            && !next.is_handler()
            && !next.has_exception_markers
            && next.try_regions == current.try_regions
    }

    fn plan(
        stream: &InstructionStream,
        cfg: &ControlFlowGraph,
        current: NodeId,
        next: NodeId,
    ) -> Result<MergePlan> {
        let block = cfg
            .block(current)
            .ok_or_else(|| GraphError(format!("no block {current}")))?;
        let jump = block.last;
        let label = stream
            .get(jump)?
            .as_instruction()
            .and_then(|instruction| instruction.targets().first().copied())
            .ok_or_else(|| GraphError(format!("block {current} does not end in a jump")))?;

        Ok(MergePlan {
            current,
            next,
            jump,
            label,
            entries: cfg.block_entries(stream, next)?,
        })
    }

    fn merge(stream: &mut InstructionStream, plan: MergePlan) -> Result<()> {
        let mut moved = Vec::with_capacity(plan.entries.len());
        for position in plan.entries {
            let (entry, _) = stream.remove(position)?;
            // Only the erased jump referenced this label
            if !matches!(entry, Entry::Target(label) if label == plan.label) {
                moved.push(entry);
            }
        }

        let mut at = plan.jump;
        for entry in moved {
            at = stream.insert_after(at, entry)?;
        }
        stream.erase(plan.jump)?;
        Ok(())
    }
}

impl MethodPass for RemoveGotosPass {
    fn run_on_method(&self, method: MethodContext<'_>, body: &mut MethodBody) -> Result<usize> {
        let initial = body.stream().count_instructions();
        let limit = initial + 1;
        let mut removed = 0;

        loop {
            let plan = {
                let (stream, cfg) = body.stream_and_cfg()?;
                match Self::find_merge(cfg) {
                    Some((current, next)) => Self::plan(stream, cfg, current, next)?,
                    None => break,
                }
            };

            if removed >= limit {
                return Err(GraphError(format!(
                    "{method}: goto removal did not converge after {limit} merges"
                )));
            }

            trace!("{}: merging {} into {}", method, plan.next, plan.current);
            Self::merge(body.stream_mut(), plan)?;
            removed += 1;
        }

        debug!(
            "{}: {} -> {} instructions, {} gotos removed",
            method,
            initial,
            body.stream().count_instructions(),
            removed
        );
        Ok(removed)
    }
}

impl Pass for RemoveGotosPass {
    fn name(&self) -> &'static str {
        "RemoveGotosPass"
    }

    fn description(&self) -> &'static str {
        "Merges blocks linked by unconditional jumps"
    }

    fn run_pass(&self, scope: &mut Scope, config: &Config, metrics: &Metrics) -> Result<()> {
        let removed = walk_method_bodies(scope, config.parallel, |method, body| {
            self.run_on_method(method, body)
        })?;

        let total = metrics.incr_metric(
            METRIC_GOTO_REMOVED,
            i64::try_from(removed).unwrap_or(i64::MAX),
        );
        info!("Removed {} gotos", total);
        Ok(())
    }
}
