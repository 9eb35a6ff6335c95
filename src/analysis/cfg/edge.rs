//! Control flow edge types.

use crate::{ir::RegionId, utils::graph::NodeId};

/// How control reaches the target of an edge.
///
/// When an instruction reaches the same block in more than one way, only the first
/// kind is kept: explicit targets in operand order, then fallthrough, then exceptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CfgEdgeKind {
    /// Target of `goto` or `goto_w`
    Goto,
    /// Taken side of a conditional branch
    Branch,
    /// Lexically next block
    Fallthrough,
    /// Switch case, `None` for the default target
    Switch {
        /// The matched case value
        case_value: Option<i32>,
    },
    /// Target of `jsr` or `jsr_w`
    Subroutine,
    /// Handler of a protected region covering the source block
    Exception {
        /// The protected region
        region: RegionId,
        /// Constant pool index of the caught class, `None` for catch-all
        catch_type: Option<u16>,
    },
}

impl CfgEdgeKind {
    /// Returns `true` for exception edges.
    #[must_use]
    pub const fn is_exceptional(&self) -> bool {
        matches!(self, CfgEdgeKind::Exception { .. })
    }

    /// Short label used in DOT output.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            CfgEdgeKind::Goto | CfgEdgeKind::Fallthrough => String::new(),
            CfgEdgeKind::Branch => "branch".to_string(),
            CfgEdgeKind::Switch { case_value } => {
                case_value.map_or("default".to_string(), |v| format!("case {v}"))
            }
            CfgEdgeKind::Subroutine => "jsr".to_string(),
            CfgEdgeKind::Exception { region, .. } => format!("catch {region}"),
        }
    }
}

/// An edge of the control flow graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfgEdge {
    target: NodeId,
    kind: CfgEdgeKind,
}

impl CfgEdge {
    /// Creates an edge to `target`.
    #[must_use]
    pub const fn new(target: NodeId, kind: CfgEdgeKind) -> Self {
        Self { target, kind }
    }

    /// The target block.
    #[must_use]
    pub const fn target(&self) -> NodeId {
        self.target
    }

    /// How control reaches the target.
    #[must_use]
    pub const fn kind(&self) -> &CfgEdgeKind {
        &self.kind
    }
}
