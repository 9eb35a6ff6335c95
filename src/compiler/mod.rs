//! Pass infrastructure and bytecode transformations.
//!
//! This module sits on top of [`crate::ir`] and [`crate::analysis`]: passes receive a
//! loaded [`crate::metadata::Scope`], transform the instruction streams of its method
//! bodies and report counters.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        Pass Pipeline                             │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │  Config                      Global and per-pass options         │
//! │    ├─ parallel                (fan out over classes on rayon)    │
//! │    └─ PassConfig              (typed key/value options)          │
//! │                                                                  │
//! │  PassManager                 Ordered execution                   │
//! │    ├─ configure()             every pass, before the first run   │
//! │    ├─ run_pass()              one pass at a time, in order       │
//! │    └─ PassReport              metrics and timing per pass        │
//! │                                                                  │
//! │  Pass / MethodPass           Scope-level and per-body interfaces │
//! │  walk_method_bodies()        Sequential or parallel body walk    │
//! │  Metrics                     Concurrent named counters           │
//! │                                                                  │
//! │  Passes                                                          │
//! │    ├─ RemoveGotosPass         goto chain removal                 │
//! │    └─ CfgCheckPass            graph consistency check            │
//! │                                                                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Examples
//!
//! ```rust
//! use jarscope::compiler::{Config, PassConfig, PassManager, RemoveGotosPass, CfgCheckPass};
//! use jarscope::metadata::Scope;
//!
//! let config = Config::default()
//!     .with_parallel(false)
//!     .with_pass_config("CfgCheckPass", PassConfig::new().with("fail_on_error", false));
//!
//! let mut manager = PassManager::new(config)
//!     .with_pass(RemoveGotosPass::new())
//!     .with_pass(CfgCheckPass::new());
//! let report = manager.run(&mut Scope::new())?;
//! assert_eq!(report.runs.len(), 2);
//! # Ok::<(), jarscope::Error>(())
//! ```

mod config;
mod manager;
mod metrics;
mod pass;
mod passes;

pub use config::{Config, ConfigValue, PassConfig};
pub use manager::{PassManager, PassReport, PassRun};
pub use metrics::Metrics;
pub use pass::{fold_method_bodies, walk_method_bodies, MethodContext, MethodPass, Pass};
pub use passes::{
    verify, CfgCheckPass, CfgStats, RemoveGotosPass, METRIC_BLOCKS, METRIC_CFG_ERRORS,
    METRIC_EDGES, METRIC_GOTO_REMOVED, METRIC_UNREACHABLE_BLOCKS,
};
