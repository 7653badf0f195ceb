use serde::{Deserialize, Serialize};

/// Identifier fields as the backend sends them.
///
/// Documents carry `_id`; some serializers add a virtual `id` as well, so
/// both are accepted and `_id` wins.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct WireId {
    #[serde(rename = "_id", default)]
    mongo_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

impl WireId {
    pub(crate) fn resolve(self) -> String {
        self.mongo_id.or(self.id).unwrap_or_default()
    }
}

/// Reference to a user: a populated document or a bare id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "UserRefRecord")]
pub struct UserRef {
    pub id: String,
}

impl UserRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UserRefRecord {
    Bare(String),
    Document(WireId),
}

impl From<UserRefRecord> for UserRef {
    fn from(record: UserRefRecord) -> Self {
        let id = match record {
            UserRefRecord::Bare(id) => id,
            UserRefRecord::Document(ids) => ids.resolve(),
        };
        Self { id }
    }
}
