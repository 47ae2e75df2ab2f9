//! Type-erased handle to a sample generator.
//!
//! A [`SampleGenerator`] is a pair of an opaque data pointer and a free function that knows the
//! concrete type behind that pointer. The only way to obtain one is [`SampleGenerator::bind`], which
//! fills both fields from the same type parameter, so the two can never describe different types.
//!
//! ```
//! use sample_dispatch::{NextSample, SampleGenerator, SawtoothOscillator, SquareOscillator};
//!
//! let mut saw = SawtoothOscillator::new(440.0, 48_000.0).unwrap();
//! let mut square = SquareOscillator::new(220.0, 48_000.0).unwrap();
//!
//! let mut generator = SampleGenerator::bind(&mut saw);
//! assert_eq!(-1.0, generator.invoke());
//!
//! // same handle, different concrete type
//! generator.rebind(&mut square);
//! assert_eq!(1.0, generator.invoke());
//! ```

use crate::{NextSample, Sample};
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

/// Dispatch function taking the erased instance pointer.
type DispatchFn = unsafe fn(NonNull<()>) -> Sample;

/// Non-owning, rebindable handle to any [`NextSample`] implementation.
///
/// The lifetime `'a` ties the handle to the mutable borrow of the bound instance, so a handle can
/// neither outlive its instance nor coexist with another access to it.
pub struct SampleGenerator<'a> {
    data: NonNull<()>,
    call: DispatchFn,
    /// Type the handle was last bound to. `type_name` output is descriptive only and not
    /// guaranteed unique, so this is a diagnostic label rather than a type identity.
    #[cfg(debug_assertions)]
    bound_type: &'static str,
    _marker: PhantomData<&'a mut ()>,
}

impl<'a> SampleGenerator<'a> {
    /// Binds a new handle to `generator`. The dispatch function is selected at compile time from
    /// `T`.
    #[inline]
    pub fn bind<T: NextSample>(generator: &'a mut T) -> Self {
        Self {
            data: NonNull::from(generator).cast(),
            call: call_next_sample::<T>,
            #[cfg(debug_assertions)]
            bound_type: std::any::type_name::<T>(),
            _marker: PhantomData,
        }
    }

    /// Points this handle at another generator, possibly of a different concrete type. Both the
    /// data pointer and the dispatch function are replaced in a single assignment.
    #[inline]
    pub fn rebind<T: NextSample>(&mut self, generator: &'a mut T) {
        *self = Self::bind(generator);
    }

    /// Produces the next sample of the bound generator.
    #[inline]
    pub fn invoke(&mut self) -> Sample {
        // SAFETY: `data` and `call` were created together in `bind` from the same `T`, and the
        // exclusive borrow captured by `'a` is still live while `self` is
        unsafe { (self.call)(self.data) }
    }

    /// Name of the concrete type recorded by the last [`bind`](Self::bind) or
    /// [`rebind`](Self::rebind). Only available in debug builds.
    #[cfg(debug_assertions)]
    pub fn bound_type(&self) -> &'static str {
        self.bound_type
    }

    /// Returns `true` if the last binding was made with `T`, compared by type name. Only available
    /// in debug builds.
    #[cfg(debug_assertions)]
    pub fn is_bound_to<T: NextSample>(&self) -> bool {
        self.bound_type == std::any::type_name::<T>()
    }
}

impl<'a, T: NextSample> From<&'a mut T> for SampleGenerator<'a> {
    fn from(generator: &'a mut T) -> Self {
        Self::bind(generator)
    }
}

impl NextSample for SampleGenerator<'_> {
    #[inline]
    fn next_sample(&mut self) -> Sample {
        self.invoke()
    }
}

impl fmt::Debug for SampleGenerator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("SampleGenerator");
        debug.field("data", &self.data);
        #[cfg(debug_assertions)]
        debug.field("bound_type", &self.bound_type);
        debug.finish_non_exhaustive()
    }
}

/// # Safety
///
/// `ptr` must have been derived from a live `&mut T` that is not aliased for the duration of the
/// call.
#[inline]
unsafe fn call_next_sample<T: NextSample>(ptr: NonNull<()>) -> Sample {
    let generator = unsafe { ptr.cast::<T>().as_mut() };
    generator.next_sample()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Constant, SawtoothOscillator, SquareOscillator};

    /// Counts its own invocations so the side effect can be observed after the handle is gone.
    #[derive(Default)]
    struct Tally {
        calls: u32,
    }

    impl NextSample for Tally {
        fn next_sample(&mut self) -> Sample {
            self.calls += 1;
            self.calls as Sample
        }
    }

    #[test]
    fn should_match_direct_calls() {
        let mut saw = SawtoothOscillator::new(440.0, 48_000.0).unwrap();
        let mut reference = saw.clone();
        {
            let mut generator = SampleGenerator::bind(&mut saw);
            for _ in 0..1_000 {
                assert_eq!(reference.next_sample(), generator.invoke());
            }
        }
        assert_eq!(reference, saw);
    }

    #[test]
    fn should_apply_side_effect_to_bound_instance() {
        let mut tally = Tally::default();
        let mut generator = SampleGenerator::bind(&mut tally);
        assert_eq!(1.0, generator.invoke());
        assert_eq!(2.0, generator.invoke());
        assert_eq!(3.0, generator.invoke());
        drop(generator);
        assert_eq!(3, tally.calls);
    }

    #[test]
    fn should_dispatch_to_latest_binding() {
        let mut first = Tally::default();
        let mut second = Constant::new(-0.75);
        let mut generator = SampleGenerator::bind(&mut first);
        for _ in 0..10 {
            generator.invoke();
        }
        generator.rebind(&mut second);
        for _ in 0..10 {
            assert_eq!(-0.75, generator.invoke());
        }
        drop(generator);
        assert_eq!(10, first.calls);
    }

    #[test]
    fn should_rebind_by_assignment() {
        let mut saw = SawtoothOscillator::new(12_000.0, 48_000.0).unwrap();
        let mut square = SquareOscillator::new(12_000.0, 48_000.0).unwrap();
        let mut generator: SampleGenerator = (&mut saw).into();
        assert_eq!(-1.0, generator.invoke());
        generator = SampleGenerator::bind(&mut square);
        assert_eq!(1.0, generator.invoke());
    }

    #[test]
    fn should_be_idempotent_for_pure_generator() {
        let mut constant = Constant::new(0.125);
        let mut generator = SampleGenerator::bind(&mut constant);
        let first = generator.invoke();
        assert!((0..1_000).all(|_| generator.invoke() == first));
    }

    #[test]
    fn should_work_as_next_sample() {
        fn drain(source: &mut impl NextSample, n: usize) -> Vec<Sample> {
            (0..n).map(|_| source.next_sample()).collect()
        }

        let mut square = SquareOscillator::new(12_000.0, 48_000.0).unwrap();
        let mut generator = SampleGenerator::bind(&mut square);
        assert_eq!(vec![1.0, 1.0, -1.0, -1.0], drain(&mut generator, 4));
    }

    #[cfg(debug_assertions)]
    #[test]
    fn should_tag_bound_type() {
        let mut saw = SawtoothOscillator::new(440.0, 48_000.0).unwrap();
        let mut square = SquareOscillator::new(220.0, 48_000.0).unwrap();
        let mut generator = SampleGenerator::bind(&mut saw);
        assert!(generator.is_bound_to::<SawtoothOscillator>());
        assert!(!generator.is_bound_to::<SquareOscillator>());
        assert_eq!(std::any::type_name::<SawtoothOscillator>(), generator.bound_type());

        generator.rebind(&mut square);
        assert!(generator.is_bound_to::<SquareOscillator>());
        assert!(!generator.is_bound_to::<SawtoothOscillator>());
        assert!(format!("{generator:?}").contains("SquareOscillator"));
    }

    #[cfg(debug_assertions)]
    #[test]
    fn should_record_type_of_each_binding() {
        let mut tally = Tally::default();
        let mut constant = Constant::new(0.25);
        let mut generator: SampleGenerator = (&mut tally).into();
        assert_eq!(std::any::type_name::<Tally>(), generator.bound_type());

        // a fresh binding replaces the tag along with the dispatch function
        generator = SampleGenerator::bind(&mut constant);
        assert!(generator.is_bound_to::<Constant>());
        assert!(!generator.is_bound_to::<Tally>());
        assert_eq!(0.25, generator.invoke());
    }
}
