use serde::{Deserialize, Serialize};

use super::normalize_apartment_id;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Floor {
    pub name: String,
    pub flats: Vec<String>,
}

/// Floors and flats residents can pick from.
///
/// An empty layout accepts any apartment id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingLayout {
    #[serde(default)]
    pub floors: Vec<Floor>,
}

impl Default for BuildingLayout {
    fn default() -> Self {
        let floor = |name: &str, flats: &[&str]| Floor {
            name: name.to_string(),
            flats: flats.iter().map(|f| f.to_string()).collect(),
        };
        Self {
            floors: vec![
                floor("Ground", &["G1", "G2", "G3", "G4", "G5"]),
                floor("1st", &["101", "102", "103", "104", "105"]),
                floor("2nd", &["201", "202", "203", "204", "205"]),
                floor("3rd", &["301", "302", "303", "304", "305"]),
                floor("4th", &["401", "402", "403", "404", "405"]),
            ],
        }
    }
}

impl BuildingLayout {
    pub fn is_empty(&self) -> bool {
        self.floors.iter().all(|f| f.flats.is_empty())
    }

    pub fn flats(&self) -> impl Iterator<Item = &str> {
        self.floors.iter().flat_map(|f| f.flats.iter().map(String::as_str))
    }

    pub fn floor_of(&self, apartment_id: &str) -> Option<&Floor> {
        let key = normalize_apartment_id(apartment_id);
        self.floors
            .iter()
            .find(|f| f.flats.iter().any(|flat| normalize_apartment_id(flat) == key))
    }

    pub fn contains(&self, apartment_id: &str) -> bool {
        self.is_empty() || self.floor_of(apartment_id).is_some()
    }
}
