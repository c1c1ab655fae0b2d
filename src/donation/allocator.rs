//! Greedy nearest-first surplus allocation.
//!
//! Centers are visited in ascending distance and each receives as much as its
//! capacity allows until the surplus is used up. This is a first-fit policy,
//! not a minimum-cost assignment: a far center is only used once every nearer
//! one is full.
//!
//! Sorting is stable, so centers at equal distance keep the order they were
//! supplied in. NaN distances sort after every real distance.

use super::EligibleCenter;
use serde::Serialize;

/// Quantity sent to one center.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    pub center: EligibleCenter,
    pub quantity: u64,
}

/// Shortfall conditions worth surfacing to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanWarning {
    /// No center accepts the item; nothing could be sent
    NoEligibleCenters { leftover: u64 },
    /// Every eligible center is full and surplus remains
    PartialAllocation { leftover: u64 },
}

impl PlanWarning {
    pub fn leftover(&self) -> u64 {
        match self {
            Self::NoEligibleCenters { leftover } | Self::PartialAllocation { leftover } => {
                *leftover
            }
        }
    }
}

impl std::fmt::Display for PlanWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoEligibleCenters { leftover } => {
                write!(f, "no donation centers accept this item ({leftover} unallocated)")
            }
            Self::PartialAllocation { leftover } => {
                write!(f, "{leftover} still remaining to be allocated")
            }
        }
    }
}

/// Outcome of allocating one item's surplus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationPlan {
    pub predicted_quantity: u64,
    /// Nearest first
    pub allocations: Vec<Allocation>,
    /// Surplus no center could take
    pub leftover: u64,
    /// How many centers were eligible before allocation
    pub eligible_centers: usize,
}

impl AllocationPlan {
    pub fn total_sent(&self) -> u64 {
        self.allocations.iter().map(|a| a.quantity).sum()
    }

    pub fn warning(&self) -> Option<PlanWarning> {
        if self.eligible_centers == 0 {
            Some(PlanWarning::NoEligibleCenters {
                leftover: self.leftover,
            })
        } else if self.leftover > 0 {
            Some(PlanWarning::PartialAllocation {
                leftover: self.leftover,
            })
        } else {
            None
        }
    }

    pub fn is_fully_allocated(&self) -> bool {
        self.leftover == 0
    }
}

/// Assign `predicted_quantity` to `eligible` centers, nearest first.
pub fn allocate(predicted_quantity: u64, eligible: &[EligibleCenter]) -> AllocationPlan {
    let mut ordered: Vec<&EligibleCenter> = eligible.iter().collect();
    ordered.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    let mut remaining = predicted_quantity;
    let mut allocations = Vec::new();

    for center in ordered {
        if remaining == 0 {
            break;
        }
        let to_send = remaining.min(center.capacity);
        if to_send > 0 {
            allocations.push(Allocation {
                center: center.clone(),
                quantity: to_send,
            });
        }
        remaining -= to_send;
    }

    AllocationPlan {
        predicted_quantity,
        allocations,
        leftover: remaining,
        eligible_centers: eligible.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn center(name: &str, distance_km: f64, capacity: u64) -> EligibleCenter {
        EligibleCenter::new(name, capacity, distance_km, "000")
    }

    fn sent(plan: &AllocationPlan) -> Vec<(&str, u64)> {
        plan.allocations
            .iter()
            .map(|a| (a.center.name.as_str(), a.quantity))
            .collect()
    }

    fn check_invariants(plan: &AllocationPlan) {
        assert_eq!(plan.total_sent() + plan.leftover, plan.predicted_quantity);
        for a in &plan.allocations {
            assert!(a.quantity <= a.center.capacity);
            assert!(a.quantity > 0);
        }
        for pair in plan.allocations.windows(2) {
            assert!(pair[0].center.distance_km <= pair[1].center.distance_km);
        }
    }

    #[test]
    fn test_spills_to_second_center() {
        let plan = allocate(100, &[center("A", 1.0, 40), center("B", 3.0, 80)]);
        assert_eq!(sent(&plan), vec![("A", 40), ("B", 60)]);
        assert_eq!(plan.leftover, 0);
        assert_eq!(plan.warning(), None);
        check_invariants(&plan);
    }

    #[test]
    fn test_partial_allocation() {
        let plan = allocate(100, &[center("A", 1.0, 30)]);
        assert_eq!(sent(&plan), vec![("A", 30)]);
        assert_eq!(plan.leftover, 70);
        assert_eq!(plan.warning(), Some(PlanWarning::PartialAllocation { leftover: 70 }));
        check_invariants(&plan);
    }

    #[test]
    fn test_no_eligible_centers() {
        let plan = allocate(50, &[]);
        assert!(plan.allocations.is_empty());
        assert_eq!(plan.leftover, 50);
        assert_eq!(plan.warning(), Some(PlanWarning::NoEligibleCenters { leftover: 50 }));
    }

    #[test]
    fn test_sorts_by_distance_before_allocating() {
        let plan = allocate(
            90,
            &[center("Far", 9.0, 100), center("Near", 0.5, 50), center("Mid", 2.0, 30)],
        );
        assert_eq!(sent(&plan), vec![("Near", 50), ("Mid", 30), ("Far", 10)]);
        check_invariants(&plan);
    }

    #[test]
    fn test_stops_once_satisfied() {
        let plan = allocate(20, &[center("A", 1.0, 50), center("B", 2.0, 50)]);
        assert_eq!(sent(&plan), vec![("A", 20)]);
        assert!(plan.is_fully_allocated());
    }

    #[test]
    fn test_ties_keep_input_order() {
        let plan = allocate(
            30,
            &[center("First", 2.0, 10), center("Second", 2.0, 10), center("Third", 2.0, 10)],
        );
        assert_eq!(sent(&plan), vec![("First", 10), ("Second", 10), ("Third", 10)]);
    }

    #[test]
    fn test_zero_capacity_centers_are_skipped() {
        let plan = allocate(10, &[center("Full", 1.0, 0), center("Open", 2.0, 25)]);
        assert_eq!(sent(&plan), vec![("Open", 10)]);
        assert_eq!(plan.warning(), None);
    }

    #[test]
    fn test_zero_prediction_sends_nothing() {
        let plan = allocate(0, &[center("A", 1.0, 10)]);
        assert!(plan.allocations.is_empty());
        assert_eq!(plan.leftover, 0);
        assert_eq!(plan.warning(), None);
    }

    #[test]
    fn test_nan_distance_sorts_last() {
        let plan = allocate(15, &[center("Unknown", f64::NAN, 10), center("Known", 4.0, 10)]);
        assert_eq!(sent(&plan), vec![("Known", 10), ("Unknown", 5)]);
    }

    #[test]
    fn test_invariants_over_many_inputs() {
        // Deterministic pseudo-random sweep over capacities/distances
        let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
        let mut next = move |bound: u64| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state % bound
        };

        for _ in 0..200 {
            let n = next(6) as usize;
            let centers: Vec<EligibleCenter> = (0..n)
                .map(|i| center(&format!("C{i}"), next(50) as f64 / 4.0, next(120)))
                .collect();
            let qty = next(400);
            let plan = allocate(qty, &centers);
            check_invariants(&plan);
            let capacity: u64 = centers.iter().map(|c| c.capacity).sum();
            assert_eq!(plan.total_sent(), qty.min(capacity));
        }
    }

    #[test]
    fn test_warning_display() {
        assert_eq!(
            PlanWarning::PartialAllocation { leftover: 70 }.to_string(),
            "70 still remaining to be allocated"
        );
        assert_eq!(PlanWarning::NoEligibleCenters { leftover: 5 }.leftover(), 5);
    }
}
