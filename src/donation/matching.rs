//! Center acceptance matching.
//!
//! Centers describe what they take as free text ("Rice, Dal, Chapati"). The
//! planner only needs a yes/no per (center, item), so the policy sits behind
//! [`AcceptanceMatcher`] and can be swapped without touching allocation.

use super::DonationCenter;
use regex::RegexBuilder;

/// Per-item acceptance test, prepared once and applied to every center.
pub type ItemFilter<'a> = Box<dyn Fn(&DonationCenter) -> bool + 'a>;

/// Decides whether a center takes a given food item.
pub trait AcceptanceMatcher: Send + Sync {
    /// Build the test for `item`.
    fn for_item<'a>(&'a self, item: &str) -> ItemFilter<'a>;

    fn accepts(&self, center: &DonationCenter, item: &str) -> bool {
        self.for_item(item)(center)
    }
}

/// Case-insensitive whole-word match of the item name in the center's
/// accepted-foods text. "Rice" matches "rice, dal" but not "Ricepaper".
#[derive(Debug, Clone, Copy, Default)]
pub struct WordBoundaryMatcher;

impl AcceptanceMatcher for WordBoundaryMatcher {
    fn for_item<'a>(&'a self, item: &str) -> ItemFilter<'a> {
        let item = item.trim();
        if item.is_empty() {
            return Box::new(|_: &DonationCenter| false);
        }
        let pattern = format!(r"\b{}\b", regex::escape(item));
        match RegexBuilder::new(&pattern).case_insensitive(true).build() {
            Ok(re) => Box::new(move |center: &DonationCenter| re.is_match(&center.accepted_foods)),
            Err(e) => {
                tracing::warn!(item = %item, error = %e, "Could not build acceptance pattern");
                Box::new(|_: &DonationCenter| false)
            }
        }
    }
}
