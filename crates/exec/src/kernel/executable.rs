use std::collections::HashMap;
use std::sync::Arc;

use parskel_core::{Array, ExecError, ExecResult, KernelError};

/// Well-known entry-point names the skeletons call.
pub mod names {
    /// Fill an output with the fold seed (elementwise calling shape).
    pub const GENERATE: &str = "generate";
    /// Single-pass full fold writing the scalar directly.
    pub const FOLD_ALL_SEQUENTIAL: &str = "fold_all_seq";
    /// Phase 1 of a parallel full fold: one partial per stripe.
    pub const FOLD_ALL_PARTIAL: &str = "fold_all_partial";
    /// Phase 2 of a parallel full fold: combine the partials.
    pub const FOLD_ALL_COMBINE: &str = "fold_all_combine";
    /// Fold the innermost dimension, one output per outer index.
    pub const FOLD_ROWS: &str = "fold_rows";
}

/// Per-skeleton arguments passed between the chunk bounds and the environment.
///
/// Output slices are chunk-relative: `out[0]` is the element for the chunk's
/// start index. The scalar outputs of `FoldAll` and `FoldCombine` are the
/// exception and always hold exactly one element.
pub enum Payload<'a, T> {
    /// Map, generate, transform, backpermute and stencils.
    Elementwise {
        operands: &'a [&'a Array<T>],
        out: &'a mut [T],
    },
    /// Sequential full fold of input indices `[start, end)`.
    FoldAll { out: &'a mut [T] },
    /// Fold stripes `[start, end)` of width `stripe`, one partial each.
    FoldPartial { stripe: usize, partials: &'a mut [T] },
    /// Combine partials `[start, end)` into the scalar.
    FoldCombine { partials: &'a [T], out: &'a mut [T] },
    /// Fold rows `[start, end)`, each `inner` elements long.
    FoldRows { inner: usize, out: &'a mut [T] },
}

impl<T> Payload<'_, T> {
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Elementwise { .. } => "elementwise",
            Payload::FoldAll { .. } => "fold_all",
            Payload::FoldPartial { .. } => "fold_partial",
            Payload::FoldCombine { .. } => "fold_combine",
            Payload::FoldRows { .. } => "fold_rows",
        }
    }
}

/// A native entry point: `(start, end, payload, environment)`.
pub type EntryFn<T, E> =
    dyn Fn(usize, usize, Payload<'_, T>, &E) -> Result<(), KernelError> + Send + Sync;

/// Named entry points produced by the kernel compiler for one array
/// expression. Immutable once built and shared by every dispatch that runs it.
pub struct KernelExecutable<T, E> {
    entries: HashMap<String, Arc<EntryFn<T, E>>>,
    default: String,
}

impl<T, E> KernelExecutable<T, E> {
    /// An executable whose default entry is `entry`.
    pub fn new<F>(name: impl Into<String>, entry: F) -> Self
    where
        F: Fn(usize, usize, Payload<'_, T>, &E) -> Result<(), KernelError> + Send + Sync + 'static,
    {
        let name = name.into();
        let mut entries: HashMap<String, Arc<EntryFn<T, E>>> = HashMap::new();
        entries.insert(name.clone(), Arc::new(entry));
        Self {
            entries,
            default: name,
        }
    }

    /// Add (or replace) a named entry.
    pub fn with_entry<F>(mut self, name: impl Into<String>, entry: F) -> Self
    where
        F: Fn(usize, usize, Payload<'_, T>, &E) -> Result<(), KernelError> + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), Arc::new(entry));
        self
    }

    pub fn default_name(&self) -> &str {
        &self.default
    }

    pub fn entry(&self, name: &str) -> ExecResult<&EntryFn<T, E>> {
        self.entries
            .get(name)
            .map(|e| e.as_ref())
            .ok_or_else(|| ExecError::MissingEntryPoint(name.to_string()))
    }

    pub fn default_entry(&self) -> &EntryFn<T, E> {
        // `new` always registers the default, and entries are never removed.
        self.entries[&self.default].as_ref()
    }

    pub fn has_entry(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
