use serde::Serialize;

use crate::domain::{normalize_apartment_id, BillCategory, BuildingLayout, PaymentRecord};

/// Find the record for an apartment, matching on the canonical key.
///
/// Returns the position in store order along with the record.
pub fn find_by_apartment<'a>(records: &'a [PaymentRecord], apartment_id: &str) -> Option<(usize, &'a PaymentRecord)> {
    let key = normalize_apartment_id(apartment_id);
    records.iter().enumerate().find(|(_, r)| r.key() == key)
}

/// Records whose flag for `category` is not "Yes", in store order.
pub fn unpaid_residents(records: &[PaymentRecord], category: BillCategory) -> Vec<&PaymentRecord> {
    records.iter().filter(|r| !r.status(category).is_paid()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnpaidFlat {
    pub apartment_id: String,
    pub floor: Option<String>,
    pub resident_name: String,
    /// False when the flat has never submitted anything.
    pub has_record: bool,
}

/// Unpaid view over the whole building.
///
/// Unpaid records come first in store order, followed by flats of the layout
/// that have no record at all.
pub fn unpaid_flats(layout: &BuildingLayout, records: &[PaymentRecord], category: BillCategory) -> Vec<UnpaidFlat> {
    let mut out: Vec<UnpaidFlat> = unpaid_residents(records, category)
        .into_iter()
        .map(|r| UnpaidFlat {
            apartment_id: r.key(),
            floor: layout.floor_of(&r.apartment_id).map(|f| f.name.clone()),
            resident_name: r.resident_name.clone(),
            has_record: true,
        })
        .collect();

    for floor in &layout.floors {
        for flat in &floor.flats {
            if find_by_apartment(records, flat).is_none() {
                out.push(UnpaidFlat {
                    apartment_id: normalize_apartment_id(flat),
                    floor: Some(floor.name.clone()),
                    resident_name: String::new(),
                    has_record: false,
                });
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BillStatus, Floor};
    use time::macros::date;

    fn record(apartment: &str, maintenance_paid: bool) -> PaymentRecord {
        PaymentRecord {
            apartment_id: apartment.to_string(),
            resident_name: format!("resident {apartment}"),
            maintenance: if maintenance_paid {
                BillStatus::paid_on(date!(2024 - 03 - 05))
            } else {
                BillStatus::unpaid()
            },
            water: BillStatus::unpaid(),
        }
    }

    #[test]
    fn find_by_apartment_is_case_and_whitespace_insensitive() {
        let records = vec![record("101", true), record("g1", false)];
        for spelling in ["g1", " G1 ", "G1"] {
            let (idx, found) = find_by_apartment(&records, spelling).expect("record should be found");
            assert_eq!(idx, 1);
            assert_eq!(found.apartment_id, "g1");
        }
        assert!(find_by_apartment(&records, "G2").is_none());
    }

    #[test]
    fn unpaid_residents_keeps_store_order() {
        let records = vec![record("301", false), record("101", true), record("G2", false)];
        let unpaid: Vec<&str> = unpaid_residents(&records, BillCategory::Maintenance)
            .iter()
            .map(|r| r.apartment_id.as_str())
            .collect();
        assert_eq!(unpaid, vec!["301", "G2"]);

        let unpaid_water = unpaid_residents(&records, BillCategory::Water);
        assert_eq!(unpaid_water.len(), 3);
    }

    #[test]
    fn unpaid_flats_lists_flats_without_records() {
        let layout = BuildingLayout {
            floors: vec![Floor {
                name: "Ground".to_string(),
                flats: vec!["G1".to_string(), "G2".to_string(), "G3".to_string()],
            }],
        };
        let records = vec![record("g2", false), record("G1", true)];

        let unpaid = unpaid_flats(&layout, &records, BillCategory::Maintenance);
        let ids: Vec<(&str, bool)> = unpaid.iter().map(|u| (u.apartment_id.as_str(), u.has_record)).collect();
        assert_eq!(ids, vec![("G2", true), ("G3", false)]);
        assert_eq!(unpaid[0].floor.as_deref(), Some("Ground"));
    }
}
