//! Minimum-support filtering of branch annotations.
//!
//! Filtering hides values, it never deletes them: a hidden annotation keeps
//! its number but is skipped by the writer.

use crate::error::{MapperError, Result};
use crate::tree::{Support, SupportTree};

pub const BP_RANGE: (f64, f64) = (0.0, 100.0);
pub const PP_RANGE: (f64, f64) = (0.0, 1.0);

/// Lower bounds (inclusive) below which a support value is hidden.
/// `None` disables the corresponding filter.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Thresholds {
    min_bp: Option<f64>,
    min_pp: Option<f64>,
}

impl Thresholds {
    /// # Errors
    /// [`MapperError::ThresholdOutOfRange`] if `min_bp` is outside [0, 100] or
    /// `min_pp` outside [0, 1]. NaN is out of every range.
    pub fn new(min_bp: Option<f64>, min_pp: Option<f64>) -> Result<Self> {
        check_range("min_bp", min_bp, BP_RANGE)?;
        check_range("min_pp", min_pp, PP_RANGE)?;
        Ok(Thresholds { min_bp, min_pp })
    }

    pub fn none() -> Self {
        Thresholds::default()
    }

    pub fn min_bp(&self) -> Option<f64> {
        self.min_bp
    }

    pub fn min_pp(&self) -> Option<f64> {
        self.min_pp
    }

    pub fn is_active(&self) -> bool {
        self.min_bp.is_some() || self.min_pp.is_some()
    }
}

fn check_range(name: &'static str, value: Option<f64>, (min, max): (f64, f64)) -> Result<()> {
    match value {
        Some(v) if !(min..=max).contains(&v) => Err(MapperError::ThresholdOutOfRange {
            name,
            value: v,
            min,
            max,
        }),
        _ => Ok(()),
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FilterReport {
    pub hidden_bp: usize,
    pub hidden_pp: usize,
}

/// Hide BP values below `min_bp` and PP values below `min_pp` on every branch.
///
/// Each threshold only touches its own metric. Running the pass again with the
/// same thresholds hides nothing new.
pub fn filter(tree: &mut SupportTree, thresholds: &Thresholds) -> FilterReport {
    let mut report = FilterReport::default();
    for node in tree.nodes_mut() {
        if hide_below(node.support.as_mut(), thresholds.min_bp) {
            report.hidden_bp += 1;
        }
        if hide_below(node.posterior.as_mut(), thresholds.min_pp) {
            report.hidden_pp += 1;
        }
    }
    report
}

/// Returns true if the value was visible and is now hidden.
fn hide_below(support: Option<&mut Support>, min: Option<f64>) -> bool {
    match (support, min) {
        (Some(support), Some(min)) if support.shown && support.value < min => {
            support.shown = false;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::abcd;

    fn visible(tree: &SupportTree) -> Vec<(Option<f64>, Option<f64>)> {
        tree.nodes()
            .map(|n| {
                (
                    n.support.and_then(|s| s.visible()),
                    n.posterior.and_then(|s| s.visible()),
                )
            })
            .collect()
    }

    fn annotated() -> SupportTree {
        let mut t = abcd();
        t.get_mut(1).posterior = Some(Support::new(0.98));
        t.get_mut(4).posterior = Some(Support::new(0.5));
        t
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        assert!(Thresholds::new(Some(101.0), None).is_err());
        assert!(Thresholds::new(Some(-1.0), None).is_err());
        assert!(Thresholds::new(None, Some(1.01)).is_err());
        assert!(Thresholds::new(None, Some(f64::NAN)).is_err());
        assert!(Thresholds::new(Some(0.0), Some(1.0)).is_ok());
        assert!(Thresholds::new(Some(100.0), Some(0.0)).is_ok());
    }

    #[test]
    fn boundary_is_inclusive() {
        let mut t = annotated();
        let report = filter(&mut t, &Thresholds::new(Some(95.0), Some(0.98)).unwrap());
        assert_eq!(t.get(1).support.unwrap().visible(), Some(95.0));
        assert_eq!(t.get(1).posterior.unwrap().visible(), Some(0.98));
        assert_eq!(report, FilterReport { hidden_bp: 1, hidden_pp: 1 });

        let mut t = annotated();
        filter(&mut t, &Thresholds::new(Some(96.0), Some(0.99)).unwrap());
        assert_eq!(t.get(1).support.unwrap().visible(), None);
        assert_eq!(t.get(1).posterior.unwrap().visible(), None);
    }

    #[test]
    fn thresholds_are_independent() {
        let mut t = annotated();
        filter(&mut t, &Thresholds::new(None, Some(0.99)).unwrap());
        assert_eq!(t.get(1).support.unwrap().visible(), Some(95.0));
        assert_eq!(t.get(1).posterior.unwrap().visible(), None);
        // value kept, only hidden
        assert_eq!(t.get(1).posterior.unwrap().value, 0.98);
    }

    #[test]
    fn absent_values_stay_absent() {
        let mut t = annotated();
        filter(&mut t, &Thresholds::new(Some(0.0), Some(0.0)).unwrap());
        // leaves never had support
        assert_eq!(t.get(2).support, None);
        assert_eq!(t.get(2).posterior, None);
    }

    #[test]
    fn filtering_twice_changes_nothing() {
        let thresholds = Thresholds::new(Some(90.0), Some(0.9)).unwrap();
        let mut t = annotated();
        filter(&mut t, &thresholds);
        let once = visible(&t);
        let second = filter(&mut t, &thresholds);
        assert_eq!(visible(&t), once);
        assert_eq!(second, FilterReport::default());
    }

    #[test]
    fn no_thresholds_hide_nothing() {
        let mut t = annotated();
        let before = visible(&t);
        assert_eq!(filter(&mut t, &Thresholds::none()), FilterReport::default());
        assert_eq!(visible(&t), before);
        assert!(!Thresholds::none().is_active());
    }
}
