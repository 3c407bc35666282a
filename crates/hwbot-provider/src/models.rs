use serde::Deserialize;

/// One submission's review record as returned in `homeworks`.
///
/// `status` and `homework_name` stay optional here; whether they are usable
/// is decided when the record is turned into a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WorkItem {
    pub id: Option<u64>,
    pub status: Option<String>,
    pub homework_name: Option<String>,
    pub lesson_name: Option<String>,
    pub reviewer_comment: Option<String>,
    pub date_updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Latest {
    Item(WorkItem),
    NoNewStatus,
}
