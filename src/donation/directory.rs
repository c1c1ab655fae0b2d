//! Donation center directory.
//!
//! Two tables loaded once at startup:
//! - centers: `CenterName,AcceptedFoods,Contact,Capacity_kg`
//! - distances: `Restaurant,CenterName,Distance_km`
//!
//! For a (restaurant, item) request the directory keeps the centers whose
//! accepted foods match the item and joins them with that restaurant's
//! distance rows on center name.

use super::matching::AcceptanceMatcher;
use super::EligibleCenter;
use crate::tabular::{CsvError, CsvRow, CsvTable};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub const CENTER_NAME_COLUMN: &str = "CenterName";
pub const ACCEPTED_FOODS_COLUMN: &str = "AcceptedFoods";
pub const CONTACT_COLUMN: &str = "Contact";
pub const CAPACITY_COLUMN: &str = "Capacity_kg";
pub const RESTAURANT_COLUMN: &str = "Restaurant";
pub const DISTANCE_COLUMN: &str = "Distance_km";

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error(transparent)]
    Csv(#[from] CsvError),

    #[error("Line {line}: empty {column}")]
    BlankName { line: usize, column: &'static str },

    #[error("Line {line}: invalid capacity '{value}' for center '{center}'")]
    InvalidCapacity {
        line: usize,
        center: String,
        value: String,
    },

    #[error("Line {line}: invalid distance '{value}'")]
    InvalidDistance { line: usize, value: String },

    #[error("Line {line}: distance from '{restaurant}' to '{center}' is listed more than once")]
    DuplicateDistance {
        line: usize,
        restaurant: String,
        center: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonationCenter {
    pub name: String,
    /// Free-text list of accepted food items
    pub accepted_foods: String,
    pub contact: String,
    pub capacity: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceRecord {
    pub restaurant: String,
    pub center: String,
    pub distance_km: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CenterDirectory {
    centers: Vec<DonationCenter>,
    distances: Vec<DistanceRecord>,
}

impl CenterDirectory {
    pub fn new(centers: Vec<DonationCenter>, distances: Vec<DistanceRecord>) -> Self {
        Self { centers, distances }
    }

    pub fn load(centers_path: &Path, distances_path: &Path) -> Result<Self, DirectoryError> {
        let directory = Self::from_tables(
            &CsvTable::read(centers_path)?,
            &CsvTable::read(distances_path)?,
        )?;
        info!(
            centers = directory.centers.len(),
            distances = directory.distances.len(),
            restaurants = directory.restaurants().len(),
            "Loaded donation center directory"
        );
        Ok(directory)
    }

    pub fn from_tables(centers: &CsvTable, distances: &CsvTable) -> Result<Self, DirectoryError> {
        Ok(Self {
            centers: parse_centers(centers)?,
            distances: parse_distances(distances)?,
        })
    }

    pub fn centers(&self) -> &[DonationCenter] {
        &self.centers
    }

    /// Restaurants in order of first appearance in the distance table.
    pub fn restaurants(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.distances
            .iter()
            .map(|d| d.restaurant.as_str())
            .filter(|r| seen.insert(*r))
            .collect()
    }

    pub fn has_restaurant(&self, restaurant: &str) -> bool {
        self.distances.iter().any(|d| d.restaurant == restaurant)
    }

    /// Centers accepting `item`, joined with `restaurant`'s distances.
    ///
    /// Output follows centers-table order; the allocator does the distance
    /// sort. Each center appears at most once.
    pub fn eligible_centers(
        &self,
        restaurant: &str,
        item: &str,
        matcher: &dyn AcceptanceMatcher,
    ) -> Vec<EligibleCenter> {
        let accepts = matcher.for_item(item);
        let mut eligible = Vec::new();
        for center in self.centers.iter().filter(|&c| accepts(c)) {
            for record in self
                .distances
                .iter()
                .filter(|d| d.restaurant == restaurant && d.center == center.name)
            {
                eligible.push(EligibleCenter::new(
                    &center.name,
                    center.capacity,
                    record.distance_km,
                    &center.contact,
                ));
            }
        }
        eligible
    }
}

fn required_name(row: &CsvRow, idx: usize, column: &'static str) -> Result<String, DirectoryError> {
    let value = row.get(idx);
    if value.is_empty() {
        return Err(DirectoryError::BlankName {
            line: row.line,
            column,
        });
    }
    Ok(value.to_string())
}

fn parse_non_negative(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

fn parse_centers(table: &CsvTable) -> Result<Vec<DonationCenter>, DirectoryError> {
    let name_idx = table.require_column(CENTER_NAME_COLUMN)?;
    let foods_idx = table.require_column(ACCEPTED_FOODS_COLUMN)?;
    let contact_idx = table.require_column(CONTACT_COLUMN)?;
    let capacity_idx = table.require_column(CAPACITY_COLUMN)?;

    table
        .rows
        .iter()
        .map(|row| {
            let name = required_name(row, name_idx, CENTER_NAME_COLUMN)?;
            let raw_capacity = row.get(capacity_idx);
            // Fractional capacities truncate toward zero
            let capacity = parse_non_negative(raw_capacity)
                .map(|c| c.trunc() as u64)
                .ok_or_else(|| DirectoryError::InvalidCapacity {
                    line: row.line,
                    center: name.clone(),
                    value: raw_capacity.to_string(),
                })?;
            Ok(DonationCenter {
                name,
                accepted_foods: row.get(foods_idx).to_string(),
                contact: row.get(contact_idx).to_string(),
                capacity,
            })
        })
        .collect()
}

fn parse_distances(table: &CsvTable) -> Result<Vec<DistanceRecord>, DirectoryError> {
    let restaurant_idx = table.require_column(RESTAURANT_COLUMN)?;
    let center_idx = table.require_column(CENTER_NAME_COLUMN)?;
    let distance_idx = table.require_column(DISTANCE_COLUMN)?;

    // One row per (restaurant, center); a repeat would let a center be
    // allocated its capacity twice
    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let restaurant = required_name(row, restaurant_idx, RESTAURANT_COLUMN)?;
        let center = required_name(row, center_idx, CENTER_NAME_COLUMN)?;
        let raw = row.get(distance_idx);
        let distance_km =
            parse_non_negative(raw).ok_or_else(|| DirectoryError::InvalidDistance {
                line: row.line,
                value: raw.to_string(),
            })?;

        if !seen.insert((restaurant.clone(), center.clone())) {
            return Err(DirectoryError::DuplicateDistance {
                line: row.line,
                restaurant,
                center,
            });
        }
        records.push(DistanceRecord {
            restaurant,
            center,
            distance_km,
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::donation::{ItemFilter, WordBoundaryMatcher};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const CENTERS: &str = "\
CenterName,AcceptedFoods,Contact,Capacity_kg
Annapurna Trust,\"Rice, Dal, Chapati\",98450 11223,120
Seva Kitchen,\"Chapati, Curd\",98450 44556,40.9
Hope Shelter,Salad,98450 77889,15
";

    const DISTANCES: &str = "\
Restaurant,CenterName,Distance_km
Spice Garden,Annapurna Trust,3.2
Spice Garden,Seva Kitchen,1.1
Spice Garden,Hope Shelter,0.4
Curry House,Seva Kitchen,5.0
";

    fn directory() -> CenterDirectory {
        CenterDirectory::from_tables(
            &CsvTable::parse(CENTERS).unwrap(),
            &CsvTable::parse(DISTANCES).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_parses_centers() {
        let dir = directory();
        assert_eq!(dir.centers().len(), 3);
        assert_eq!(dir.centers()[0].accepted_foods, "Rice, Dal, Chapati");
        // 40.9 truncates
        assert_eq!(dir.centers()[1].capacity, 40);
    }

    #[test]
    fn test_restaurants_first_seen_order() {
        assert_eq!(directory().restaurants(), vec!["Spice Garden", "Curry House"]);
    }

    #[test]
    fn test_eligible_centers_filtered_and_joined() {
        let dir = directory();
        let eligible = dir.eligible_centers("Spice Garden", "chapati", &WordBoundaryMatcher);
        let names: Vec<_> = eligible.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Annapurna Trust", "Seva Kitchen"]);
        assert_eq!(eligible[1].distance_km, 1.1);
        assert_eq!(eligible[1].contact, "98450 44556");
    }

    #[test]
    fn test_eligible_centers_other_restaurant() {
        let dir = directory();
        let eligible = dir.eligible_centers("Curry House", "Rice", &WordBoundaryMatcher);
        assert!(eligible.is_empty(), "Annapurna has no distance row for Curry House");
    }

    #[test]
    fn test_unknown_restaurant_has_no_centers() {
        let dir = directory();
        assert!(!dir.has_restaurant("Nowhere Diner"));
        assert!(dir.eligible_centers("Nowhere Diner", "Rice", &WordBoundaryMatcher).is_empty());
    }

    #[test]
    fn test_invalid_capacity() {
        let centers =
            CsvTable::parse("CenterName,AcceptedFoods,Contact,Capacity_kg\nA,Rice,1,-5\n").unwrap();
        let distances = CsvTable::parse(DISTANCES).unwrap();
        let err = CenterDirectory::from_tables(&centers, &distances).unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidCapacity { line: 2, .. }));
    }

    #[test]
    fn test_invalid_distance() {
        let centers = CsvTable::parse(CENTERS).unwrap();
        let distances = CsvTable::parse("Restaurant,CenterName,Distance_km\nR,A,far\n").unwrap();
        let err = CenterDirectory::from_tables(&centers, &distances).unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidDistance { line: 2, .. }));
    }

    #[test]
    fn test_acceptance_test_built_once_per_item() {
        struct Counting(AtomicUsize, WordBoundaryMatcher);

        impl AcceptanceMatcher for Counting {
            fn for_item<'a>(&'a self, item: &str) -> ItemFilter<'a> {
                self.0.fetch_add(1, Ordering::SeqCst);
                self.1.for_item(item)
            }
        }

        let matcher = Counting(AtomicUsize::new(0), WordBoundaryMatcher);
        let eligible = directory().eligible_centers("Spice Garden", "Chapati", &matcher);
        assert_eq!(eligible.len(), 2);
        assert_eq!(matcher.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_duplicate_distance_rejected() {
        let centers = CsvTable::parse(CENTERS).unwrap();
        let distances = CsvTable::parse(
            "Restaurant,CenterName,Distance_km\n\
             Spice Garden,Seva Kitchen,1.0\n\
             Spice Garden,Seva Kitchen,2.0\n",
        )
        .unwrap();
        match CenterDirectory::from_tables(&centers, &distances) {
            Err(DirectoryError::DuplicateDistance {
                line,
                restaurant,
                center,
            }) => {
                assert_eq!(line, 3);
                assert_eq!(restaurant, "Spice Garden");
                assert_eq!(center, "Seva Kitchen");
            }
            other => panic!("expected duplicate distance error, got {other:?}"),
        }
    }

    #[test]
    fn test_same_center_for_different_restaurants_is_fine() {
        let dir = directory();
        let spice = dir.eligible_centers("Spice Garden", "Curd", &WordBoundaryMatcher);
        let curry = dir.eligible_centers("Curry House", "Curd", &WordBoundaryMatcher);
        assert_eq!(spice.len(), 1);
        assert_eq!(curry.len(), 1);
        assert_eq!(curry[0].distance_km, 5.0);
    }

    #[test]
    fn test_missing_column() {
        let centers = CsvTable::parse("CenterName,Contact,Capacity_kg\n").unwrap();
        let distances = CsvTable::parse(DISTANCES).unwrap();
        let err = CenterDirectory::from_tables(&centers, &distances).unwrap_err();
        assert!(matches!(
            err,
            DirectoryError::Csv(CsvError::MissingColumn(c)) if c == ACCEPTED_FOODS_COLUMN
        ));
    }

    #[test]
    fn test_blank_center_name() {
        let centers =
            CsvTable::parse("CenterName,AcceptedFoods,Contact,Capacity_kg\n ,Rice,1,5\n").unwrap();
        let distances = CsvTable::parse(DISTANCES).unwrap();
        assert!(matches!(
            CenterDirectory::from_tables(&centers, &distances),
            Err(DirectoryError::BlankName { line: 2, .. })
        ));
    }
}
