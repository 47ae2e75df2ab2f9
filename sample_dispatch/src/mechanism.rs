//! The dispatch mechanisms under comparison.
//!
//! [`SampleGenerator`](crate::SampleGenerator) is the type-erased mechanism; this module holds the
//! three baselines it is measured against and the [`Mechanism`] identifier used in reports.

use crate::{NextSample, Sample};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one of the four dispatch mechanisms.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Mechanism {
    /// `&mut dyn NextSample` reassigned between instances.
    VirtualDispatch,
    /// Plain `fn() -> Sample` reassigned between free functions.
    FunctionPointer,
    /// [`Wrapper`] instantiated once per concrete type.
    GenericWrapper,
    /// [`SampleGenerator`](crate::SampleGenerator) rebound between instances.
    TypeErasure,
}

impl Mechanism {
    /// All mechanisms in the order they are benchmarked.
    pub const ALL: [Mechanism; 4] = [
        Mechanism::VirtualDispatch,
        Mechanism::FunctionPointer,
        Mechanism::GenericWrapper,
        Mechanism::TypeErasure,
    ];

    /// Human readable label.
    pub const fn label(&self) -> &'static str {
        match self {
            Mechanism::VirtualDispatch => "virtual dispatch",
            Mechanism::FunctionPointer => "function pointer",
            Mechanism::GenericWrapper => "generic wrapper",
            Mechanism::TypeErasure => "type erasure",
        }
    }

    /// Machine name, matching the serialized form.
    pub const fn name(&self) -> &'static str {
        match self {
            Mechanism::VirtualDispatch => "virtual_dispatch",
            Mechanism::FunctionPointer => "function_pointer",
            Mechanism::GenericWrapper => "generic_wrapper",
            Mechanism::TypeErasure => "type_erasure",
        }
    }

    /// 1-based position in [`Mechanism::ALL`].
    pub const fn ordinal(&self) -> usize {
        *self as usize + 1
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Stateless sample source for the function pointer mechanism.
pub type SampleFn = fn() -> Sample;

/// Statically dispatched wrapper around a single concrete generator.
///
/// A `Wrapper<T>` can never be pointed at a `U`; switching the concrete type means building a new
/// wrapper.
///
/// ```
/// use sample_dispatch::{Constant, Wrapper};
///
/// let mut constant = Constant::new(0.5);
/// let mut wrapper = Wrapper::new(&mut constant);
/// assert_eq!(0.5, wrapper.call());
/// ```
#[derive(Debug)]
pub struct Wrapper<'a, T> {
    inner: &'a mut T,
}

impl<'a, T: NextSample> Wrapper<'a, T> {
    pub fn new(inner: &'a mut T) -> Self {
        Self { inner }
    }

    #[inline]
    pub fn call(&mut self) -> Sample {
        self.inner.next_sample()
    }
}
