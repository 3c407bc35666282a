use std::str::FromStr;

use hwbot_provider::WorkItem;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VerdictError {
    #[error("unexpected homework status: {0}")]
    UnexpectedStatus(String),

    #[error("homework is missing expected field: {0}")]
    MissingField(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStatus {
    Approved,
    Reviewing,
    Rejected,
}

impl ReviewStatus {
    pub const ALL: [ReviewStatus; 3] = [Self::Approved, Self::Reviewing, Self::Rejected];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Reviewing => "reviewing",
            Self::Rejected => "rejected",
        }
    }

    pub fn verdict(&self) -> &'static str {
        match self {
            Self::Approved => "Work reviewed: the reviewer liked everything. Hooray!",
            Self::Reviewing => "Work taken for review by the reviewer.",
            Self::Rejected => "Work reviewed: the reviewer has remarks.",
        }
    }
}

impl FromStr for ReviewStatus {
    type Err = VerdictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| VerdictError::UnexpectedStatus(s.to_string()))
    }
}

/// Builds the notification text for a work item.
///
/// The status is checked before the name.
pub fn translate(item: &WorkItem) -> Result<String, VerdictError> {
    let status: ReviewStatus = item
        .status
        .as_deref()
        .ok_or(VerdictError::MissingField("status"))?
        .parse()?;

    let name = item
        .homework_name
        .as_deref()
        .ok_or(VerdictError::MissingField("homework_name"))?;

    Ok(format!(
        "Status changed for submission \"{}\". {}",
        name,
        status.verdict()
    ))
}
