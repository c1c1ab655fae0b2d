//! Donation Planning
//!
//! Turns a predicted surplus into a delivery plan across donation centers.
//!
//! ## Architecture
//! - `directory`: Center and distance tables, joined per restaurant
//! - `matching`: Which centers accept which food items
//! - `allocator`: Greedy nearest-first assignment under capacity limits

pub mod allocator;
pub mod directory;
pub mod matching;

pub use allocator::{allocate, Allocation, AllocationPlan, PlanWarning};
pub use directory::{CenterDirectory, DirectoryError, DistanceRecord, DonationCenter};
pub use matching::{AcceptanceMatcher, ItemFilter, WordBoundaryMatcher};

use serde::Serialize;

/// A center that accepts the requested item, seen from one restaurant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EligibleCenter {
    pub name: String,
    /// Remaining capacity for this request
    pub capacity: u64,
    pub distance_km: f64,
    pub contact: String,
}

impl EligibleCenter {
    pub fn new(name: &str, capacity: u64, distance_km: f64, contact: &str) -> Self {
        Self {
            name: name.to_string(),
            capacity,
            distance_km,
            contact: contact.to_string(),
        }
    }
}
