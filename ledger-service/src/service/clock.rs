use time::{Date, OffsetDateTime, UtcOffset};

/// Source of "today" for submissions.
#[derive(Debug, Clone, Copy)]
pub enum Clock {
    System(UtcOffset),
    Fixed(Date),
}

impl Clock {
    pub fn system(offset: UtcOffset) -> Self {
        Self::System(offset)
    }

    pub fn today(&self) -> Date {
        match self {
            Self::System(offset) => OffsetDateTime::now_utc().to_offset(*offset).date(),
            Self::Fixed(date) => *date,
        }
    }
}
