mod bill;
mod building;
mod error;
mod payment_event;
mod payment_record;
mod period;

pub use bill::{BillCategory, BillStatus, PaidFlag};
pub use building::{BuildingLayout, Floor};
pub use error::DomainError;
pub use payment_event::{PaymentEvent, PAID_STATUS};
pub use payment_record::{normalize_apartment_id, PaymentRecord};
pub use period::{format_iso_date, parse_iso_date, BillingPeriod};
