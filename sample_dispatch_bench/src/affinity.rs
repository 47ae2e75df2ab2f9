use crate::config::BenchConfig;
use crate::Error;
use core_affinity::CoreId;
use log::{info, warn};

/// Where to pin the benchmark thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    NoOp,
    CpuId(CoreId),
    CpuIndex(usize),
}

impl TryFrom<&BenchConfig> for Affinity {
    type Error = Error;

    fn try_from(config: &BenchConfig) -> Result<Self, Self::Error> {
        match (config.affinity_cpu_id, config.affinity_cpu_index) {
            (Some(_), Some(_)) => Err(Error::invalid_config("cannot specify both cpu id and cpu index")),
            (Some(cpu_id), None) => Ok(Affinity::CpuId(CoreId { id: cpu_id })),
            (None, Some(cpu_index)) => Ok(Affinity::CpuIndex(cpu_index)),
            (None, None) => Ok(Affinity::NoOp),
        }
    }
}

impl Affinity {
    /// Pins the calling thread and returns whether it is now pinned. Failing to pin is logged and
    /// the benchmark carries on unpinned.
    pub fn pin_current_thread_to_core(&self) -> bool {
        if *self == Affinity::NoOp {
            return false;
        }
        match core_affinity::get_core_ids() {
            Some(core_ids) => self.pin_with(&core_ids, core_affinity::set_for_current),
            None => {
                warn!("unable to find any cores on which the benchmark thread is allowed to run");
                false
            }
        }
    }

    fn pin_with(&self, core_ids: &[CoreId], set_for_current: impl FnOnce(CoreId) -> bool) -> bool {
        let Some(core_id) = self.select(core_ids) else {
            warn!("{self:?} is not present in the available cpu set");
            return false;
        };
        if set_for_current(core_id) {
            info!("successfully pinned benchmark thread to core {}", core_id.id);
            true
        } else {
            warn!("failed to pin benchmark thread to core {}", core_id.id);
            false
        }
    }

    /// Core to pin to, out of the cores the thread is allowed to run on.
    fn select(&self, core_ids: &[CoreId]) -> Option<CoreId> {
        match *self {
            Affinity::NoOp => None,
            Affinity::CpuId(core_id) => core_ids.contains(&core_id).then_some(core_id),
            Affinity::CpuIndex(cpu_index) => core_ids.get(cpu_index).copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cores(ids: &[usize]) -> Vec<CoreId> {
        ids.iter().map(|&id| CoreId { id }).collect()
    }

    #[test]
    fn should_resolve_affinity_from_config() {
        let mut config = BenchConfig::default();
        assert_eq!(Affinity::NoOp, Affinity::try_from(&config).unwrap());

        config.affinity_cpu_index = Some(1);
        assert_eq!(Affinity::CpuIndex(1), Affinity::try_from(&config).unwrap());

        config.affinity_cpu_id = Some(3);
        assert!(matches!(Affinity::try_from(&config), Err(Error::InvalidConfig(_))));

        config.affinity_cpu_index = None;
        assert_eq!(Affinity::CpuId(CoreId { id: 3 }), Affinity::try_from(&config).unwrap());
    }

    #[test]
    fn should_select_core_by_id_or_index() {
        let core_ids = cores(&[2, 4, 6]);
        assert_eq!(Some(CoreId { id: 4 }), Affinity::CpuId(CoreId { id: 4 }).select(&core_ids));
        assert_eq!(None, Affinity::CpuId(CoreId { id: 5 }).select(&core_ids));
        assert_eq!(Some(CoreId { id: 6 }), Affinity::CpuIndex(2).select(&core_ids));
        assert_eq!(None, Affinity::CpuIndex(3).select(&core_ids));
        assert_eq!(None, Affinity::NoOp.select(&core_ids));
    }

    #[test]
    fn should_report_pinning_outcome() {
        let core_ids = cores(&[0, 1]);

        let mut pinned_to = None;
        assert!(Affinity::CpuIndex(1).pin_with(&core_ids, |core_id| {
            pinned_to = Some(core_id);
            true
        }));
        assert_eq!(Some(CoreId { id: 1 }), pinned_to);

        // the os refused the request
        assert!(!Affinity::CpuIndex(1).pin_with(&core_ids, |_| false));
    }

    #[test]
    fn should_not_pin_to_missing_core() {
        let core_ids = cores(&[0, 1]);
        let mut attempted = false;
        let pinned = Affinity::CpuId(CoreId { id: 7 }).pin_with(&core_ids, |_| {
            attempted = true;
            true
        });
        assert!(!pinned);
        assert!(!attempted);
    }

    #[test]
    fn should_ignore_missing_core() {
        // must not panic even if the index is out of range
        assert!(!Affinity::CpuIndex(usize::MAX).pin_current_thread_to_core());
        assert!(!Affinity::NoOp.pin_current_thread_to_core());
    }
}
