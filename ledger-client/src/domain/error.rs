#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown bill category '{0}'")]
    UnknownBillCategory(String),
    #[error("apartment id must not be empty")]
    EmptyApartmentId,
}
