use time::Date;

use crate::domain::{
    normalize_apartment_id, BillCategory, BillStatus, BillingPeriod, PaidFlag, PaymentEvent, PaymentRecord,
    PAID_STATUS,
};

/// Fold an event log into one record per flat, in order of first appearance.
///
/// For each flat and category the latest parseable payment date wins. If none
/// of a category's events carries a readable date, the most recent raw text is
/// kept so callers can apply their own malformed-date policy. Events with an
/// unknown payment type or a non-"Paid" status are ignored.
pub fn records_from_events(events: &[PaymentEvent]) -> Vec<PaymentRecord> {
    fold(events, None)
        .into_iter()
        .map(|(apartment_id, slots)| {
            let mut record = PaymentRecord {
                apartment_id,
                ..PaymentRecord::default()
            };
            for category in BillCategory::ALL {
                let slot = &slots[category_slot(category)];
                *record.status_mut(category) = match (slot.latest, &slot.malformed) {
                    (Some(day), _) => BillStatus::paid_on(day),
                    (None, Some(raw)) => malformed_status(raw),
                    (None, None) => BillStatus::default(),
                };
            }
            record
        })
        .collect()
}

/// Fold an event log into the records a submission in `period` is checked
/// against.
///
/// Events dated after `period` are ignored. Per flat and category:
/// - a readable date inside `period` marks the bill paid on that date;
/// - otherwise any unreadable date is surfaced as the raw text, so a
///   fail-closed policy can refuse to guess;
/// - otherwise the latest earlier date is kept.
pub fn records_for_period(events: &[PaymentEvent], period: BillingPeriod) -> Vec<PaymentRecord> {
    fold(events, Some(period))
        .into_iter()
        .map(|(apartment_id, slots)| {
            let mut record = PaymentRecord {
                apartment_id,
                ..PaymentRecord::default()
            };
            for category in BillCategory::ALL {
                let slot = &slots[category_slot(category)];
                let in_period = slot.latest.filter(|day| period.contains(*day));
                *record.status_mut(category) = match (in_period, &slot.malformed, slot.latest) {
                    (Some(day), _, _) => BillStatus::paid_on(day),
                    (None, Some(raw), _) => malformed_status(raw),
                    (None, None, Some(day)) => BillStatus::paid_on(day),
                    (None, None, None) => BillStatus::default(),
                };
            }
            record
        })
        .collect()
}

#[derive(Debug, Default)]
struct Slot {
    latest: Option<Date>,
    malformed: Option<String>,
}

fn fold(events: &[PaymentEvent], through: Option<BillingPeriod>) -> Vec<(String, [Slot; 2])> {
    let mut flats: Vec<(String, [Slot; 2])> = Vec::new();

    for ev in events {
        let Some(category) = ev.category() else { continue };
        if !ev.is_paid() {
            continue;
        }
        let day = ev.payment_day();
        if let (Some(day), Some(through)) = (day, through) {
            if BillingPeriod::of(day) > through {
                continue;
            }
        }

        let key = normalize_apartment_id(&ev.flat_number);
        if key.is_empty() {
            continue;
        }
        let idx = match flats.iter().position(|(id, _)| *id == key) {
            Some(idx) => idx,
            None => {
                flats.push((key, Default::default()));
                flats.len() - 1
            }
        };

        let slot = &mut flats[idx].1[category_slot(category)];
        match day {
            Some(day) => {
                if slot.latest.map_or(true, |current| day > current) {
                    slot.latest = Some(day);
                }
            }
            None => slot.malformed = Some(ev.payment_date.trim().to_string()),
        }
    }

    flats
}

fn malformed_status(raw: &str) -> BillStatus {
    BillStatus {
        paid: PaidFlag::Yes,
        paid_date: raw.to_string(),
    }
}


/// History view of a row-model store: one event per paid category.
pub fn events_from_records(records: &[PaymentRecord]) -> Vec<PaymentEvent> {
    let mut events = Vec::new();
    for record in records {
        for category in BillCategory::ALL {
            let status = record.status(category);
            if !status.is_paid() {
                continue;
            }
            let event = match status.parsed_date() {
                Some(day) => PaymentEvent::paid(&record.apartment_id, category, day),
                None => PaymentEvent {
                    flat_number: record.key(),
                    payment_type: category.event_label().to_string(),
                    status: PAID_STATUS.to_string(),
                    month: String::new(),
                    payment_date: status.paid_date.clone(),
                },
            };
            events.push(event);
        }
    }
    events
}

fn category_slot(category: BillCategory) -> usize {
    match category {
        BillCategory::Maintenance => 0,
        BillCategory::Water => 1,
    }
}
