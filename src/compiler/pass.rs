//! Pass traits and the method walker.

use std::{fmt, ops::Add};

use rayon::prelude::*;

use crate::{
    compiler::{Config, Metrics, PassConfig},
    ir::MethodBody,
    metadata::{ClassDef, MethodAccess, MethodDef, Scope},
    Result,
};

/// A transformation or analysis over a whole [`Scope`].
///
/// All passes must be thread-safe (Send + Sync) so a pass can fan out over methods on
/// the rayon pool.
pub trait Pass: Send + Sync {
    /// Unique name, used for logging and for looking up the pass options.
    fn name(&self) -> &'static str;

    /// Short summary logged when the manager starts the pass.
    fn description(&self) -> &'static str {
        "(no description)"
    }

    /// Applies the options of this pass before it runs.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are unusable.
    fn configure(&mut self, _config: &PassConfig) -> Result<()> {
        Ok(())
    }

    /// Runs the pass over every class of `scope`, recording counters in `metrics`.
    ///
    /// # Errors
    ///
    /// Returns the first error of any method. Methods already transformed keep their
    /// changes.
    fn run_pass(&self, scope: &mut Scope, config: &Config, metrics: &Metrics) -> Result<()>;
}

/// A transform applied to one method body at a time.
pub trait MethodPass: Send + Sync {
    /// Transforms `body` and returns the number of changes made.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is inconsistent.
    fn run_on_method(&self, method: MethodContext<'_>, body: &mut MethodBody) -> Result<usize>;
}

/// Read-only view of the method whose body is being transformed.
#[derive(Debug, Clone, Copy)]
pub struct MethodContext<'a> {
    /// Internal name of the declaring class
    pub owner: &'a str,
    /// Simple method name
    pub name: &'a str,
    /// Method descriptor
    pub descriptor: &'a str,
    /// Access flags
    pub access: MethodAccess,
}

impl<'a> MethodContext<'a> {
    /// Builds the view of `method`.
    #[must_use]
    pub fn of(method: &'a MethodDef) -> Self {
        MethodContext {
            owner: &method.owner,
            name: &method.name,
            descriptor: &method.descriptor,
            access: method.access,
        }
    }
}

impl fmt::Display for MethodContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.owner, self.name, self.descriptor)
    }
}

/// Calls `f` on every method body of `scope` and sums the returned counts.
///
/// Methods without a body are skipped. With `parallel` set, classes are processed on
/// the rayon pool and the per-class sums are reduced after the walk; the total is the
/// same either way. The first error aborts the walk.
///
/// # Errors
///
/// Returns the first error produced by `f`.
pub fn walk_method_bodies<F>(scope: &mut Scope, parallel: bool, f: F) -> Result<usize>
where
    F: Fn(MethodContext<'_>, &mut MethodBody) -> Result<usize> + Send + Sync,
{
    fold_method_bodies(scope, parallel, f)
}

/// Like [`walk_method_bodies`], for passes that report more than one count.
///
/// Per-method results are combined with `+`, starting from `T::default()`.
///
/// # Errors
///
/// Returns the first error produced by `f`.
pub fn fold_method_bodies<T, F>(scope: &mut Scope, parallel: bool, f: F) -> Result<T>
where
    T: Default + Add<Output = T> + Send,
    F: Fn(MethodContext<'_>, &mut MethodBody) -> Result<T> + Send + Sync,
{
    let walk_class = |class: &mut ClassDef| -> Result<T> {
        let mut total = T::default();
        for method in &mut class.methods {
            let MethodDef {
                ref owner,
                ref name,
                ref descriptor,
                access,
                ref mut body,
            } = *method;
            let Some(body) = body.as_mut() else {
                continue;
            };

            let context = MethodContext {
                owner,
                name,
                descriptor,
                access,
            };
            total = total + f(context, body)?;
        }
        Ok(total)
    };

    if parallel {
        scope
            .classes_mut()
            .par_iter_mut()
            .map(walk_class)
            .try_reduce(T::default, |a, b| Ok(a + b))
    } else {
        let mut total = T::default();
        for class in scope.classes_mut() {
            total = total + walk_class(class)?;
        }
        Ok(total)
    }
}
