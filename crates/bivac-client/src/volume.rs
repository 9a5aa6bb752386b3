//! Volume records as returned by `GET /volumes`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One managed volume.
///
/// Only `ID` is required; it is checked when the record is decoded. Every
/// other field the manager sends is kept verbatim and serialized back out
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeRecord {
    #[serde(rename = "ID")]
    id: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

/// Backup state fields of a [`VolumeRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupStatus<'a> {
    pub last_backup_date: Option<&'a str>,
    pub last_backup_status: Option<&'a str>,
}

impl VolumeRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    /// Add a passthrough field. `ID` is reserved and ignored here.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != "ID" {
            self.fields.insert(key, value.into());
        }
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.str_field("Name")
    }

    pub fn hostname(&self) -> Option<&str> {
        self.str_field("Hostname")
    }

    pub fn mountpoint(&self) -> Option<&str> {
        self.str_field("Mountpoint")
    }

    pub fn status(&self) -> BackupStatus<'_> {
        BackupStatus {
            last_backup_date: self.str_field("LastBackupDate"),
            last_backup_status: self.str_field("LastBackupStatus"),
        }
    }

    /// Per-step output of the last backup, keyed by step name.
    pub fn logs(&self) -> Vec<(&str, &str)> {
        self.fields
            .get("Logs")
            .and_then(Value::as_object)
            .map(|logs| {
                logs.iter()
                    .filter_map(|(step, output)| Some((step.as_str(), output.as_str()?)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_manager_volume() {
        let record: VolumeRecord = serde_json::from_value(json!({
            "ID": "3d9e8a",
            "Name": "pgdata",
            "Hostname": "node-1",
            "Mountpoint": "/var/lib/docker/volumes/pgdata/_data",
            "ReadOnly": false,
            "LastBackupDate": "2024-03-01 02:00:00",
            "LastBackupStatus": "Success",
            "Logs": { "testInit": "ok", "backup": "snapshot 1a2b saved" }
        }))
        .unwrap();

        assert_eq!(record.id(), "3d9e8a");
        assert_eq!(record.name(), Some("pgdata"));
        assert_eq!(record.hostname(), Some("node-1"));
        assert_eq!(
            record.status(),
            BackupStatus {
                last_backup_date: Some("2024-03-01 02:00:00"),
                last_backup_status: Some("Success"),
            }
        );
        assert_eq!(record.get("ReadOnly"), Some(&json!(false)));
        assert_eq!(record.logs().len(), 2);
    }

    #[test]
    fn missing_id_is_rejected() {
        let err = serde_json::from_value::<VolumeRecord>(json!({ "Name": "orphan" })).unwrap_err();
        assert!(err.to_string().contains("ID"));
    }

    #[test]
    fn non_string_id_is_rejected() {
        assert!(serde_json::from_value::<VolumeRecord>(json!({ "ID": 42 })).is_err());
    }

    #[test]
    fn unknown_fields_round_trip() {
        let raw = json!({ "ID": "a", "Labels": { "bivac.ignore": "false" }, "Driver": "local" });
        let record: VolumeRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&record).unwrap(), raw);
    }

    #[test]
    fn with_field_does_not_shadow_id() {
        let record = VolumeRecord::new("a").with_field("ID", "b").with_field("Name", "data");
        assert_eq!(record.id(), "a");
        assert_eq!(record.name(), Some("data"));
        assert!(record.get("ID").is_none());
    }
}
