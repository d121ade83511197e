// ABOUTME: ITSM tables and the change/incident record shape.
// ABOUTME: Fields accept plain strings or display-value objects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Fields requested on every table call.
pub const RECORD_FIELDS: &str = "sys_id,type,impact,urgency,priority,description,number,short_description,state,approval,sys_created_by,sys_created_on,sys_updated_on,sys_updated_by";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    ChangeRequest,
    ChangeTask,
    Incident,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::ChangeRequest => "change_request",
            Table::ChangeTask => "change_task",
            Table::Incident => "incident",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown table '{0}': expected change_request, change_task, or incident")]
pub struct UnknownTable(String);

impl FromStr for Table {
    type Err = UnknownTable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "change_request" => Ok(Table::ChangeRequest),
            "change_task" => Ok(Table::ChangeTask),
            "incident" => Ok(Table::Incident),
            other => Err(UnknownTable(other.to_string())),
        }
    }
}

/// Change entities that carry an approval decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    ChangeRequest,
    ChangeTask,
}

impl ChangeKind {
    pub fn table(&self) -> Table {
        match self {
            ChangeKind::ChangeRequest => Table::ChangeRequest,
            ChangeKind::ChangeTask => Table::ChangeTask,
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table().as_str())
    }
}

impl FromStr for ChangeKind {
    type Err = UnknownTable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<Table>()? {
            Table::ChangeRequest => Ok(ChangeKind::ChangeRequest),
            Table::ChangeTask => Ok(ChangeKind::ChangeTask),
            Table::Incident => Err(UnknownTable(s.to_string())),
        }
    }
}

/// A change request, change task, or incident.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "sys_id", default, deserialize_with = "display_value")]
    pub id: String,
    #[serde(default, deserialize_with = "display_value")]
    pub number: String,
    #[serde(rename = "short_description", default, deserialize_with = "display_value")]
    pub title: String,
    #[serde(default, deserialize_with = "display_value")]
    pub description: String,
    #[serde(default, deserialize_with = "display_value")]
    pub state: String,
    #[serde(rename = "type", default, deserialize_with = "display_value")]
    pub kind: String,
    #[serde(default, deserialize_with = "display_value")]
    pub impact: String,
    #[serde(default, deserialize_with = "display_value")]
    pub urgency: String,
    #[serde(default, deserialize_with = "display_value")]
    pub priority: String,
    #[serde(default, deserialize_with = "display_value")]
    pub approval: String,
    #[serde(rename = "sys_created_by", default, deserialize_with = "display_value")]
    pub created_by: String,
    #[serde(rename = "sys_created_on", default, deserialize_with = "display_value")]
    pub created_on: String,
    #[serde(rename = "sys_updated_by", default, deserialize_with = "display_value")]
    pub updated_by: String,
    #[serde(rename = "sys_updated_on", default, deserialize_with = "display_value")]
    pub updated_on: String,
}

impl Record {
    /// Browser link to this record on the instance at `base`.
    pub fn link(&self, base: &str, table: Table) -> String {
        format!(
            "{}/nav_to.do?uri={}.do?sys_id={}",
            base.trim_end_matches('/'),
            table,
            self.id
        )
    }
}

/// `{"result": ...}`
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub result: T,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldValue {
    Text(String),
    Display { display_value: Option<String> },
    Other(serde_json::Value),
}

/// Accept `"x"`, `null`, or `{"display_value": "x", "link": ...}`.
fn display_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value: Option<FieldValue> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(FieldValue::Text(text)) => text,
        Some(FieldValue::Display { display_value }) => display_value.unwrap_or_default(),
        Some(FieldValue::Other(other)) => match other {
            serde_json::Value::Null => String::new(),
            value => value.to_string(),
        },
        None => String::new(),
    })
}

/// Body for creating a change request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewChangeRequest {
    pub short_description: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub priority: String,
    pub risk: String,
    pub impact: String,
}

/// Body for creating a change task under a change request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewChangeTask {
    pub short_description: String,
    pub description: String,
    /// sys_id of the parent change request.
    pub parent: String,
    pub change_request: String,
    pub urgency: String,
    pub priority: String,
}
