use std::borrow::Cow;

use anyhow::Result;
use bivac_client::VolumeRecord;
#[cfg(feature = "colored-output")]
use colored::*;
use serde_json::Value;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::OutputFormat;

pub struct OutputManager {
    format: OutputFormat,
    colored: bool,
}

#[derive(Tabled)]
struct VolumeRow<'a> {
    #[tabled(rename = "ID")]
    id: &'a str,
    #[tabled(rename = "Name")]
    name: &'a str,
    #[tabled(rename = "Hostname")]
    hostname: &'a str,
    #[tabled(rename = "Mountpoint")]
    mountpoint: &'a str,
    #[tabled(rename = "LastBackupDate")]
    last_backup_date: &'a str,
    #[tabled(rename = "LastBackupStatus")]
    last_backup_status: Cow<'a, str>,
}

#[derive(Tabled)]
struct LogRow<'a> {
    step: &'a str,
    output: &'a str,
}

impl OutputManager {
    pub fn new(format: OutputFormat, colored: bool) -> Self {
        Self { format, colored }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn json(&self, value: &Value) -> Result<String> {
        let rendered = match self.format {
            OutputFormat::JsonCompact => serde_json::to_string(value)?,
            _ => serde_json::to_string_pretty(value)?,
        };
        Ok(rendered)
    }

    pub fn volumes<'a>(&self, volumes: impl IntoIterator<Item = &'a VolumeRecord>) -> Result<String> {
        let volumes: Vec<&VolumeRecord> = volumes.into_iter().collect();

        if self.format.is_json() {
            return self.json(&serde_json::to_value(&volumes)?);
        }

        if volumes.is_empty() {
            return Ok("No volumes".to_string());
        }

        let rows = volumes.iter().map(|volume| {
            let status = volume.status();
            VolumeRow {
                id: volume.id(),
                name: volume.name().unwrap_or(""),
                hostname: volume.hostname().unwrap_or(""),
                mountpoint: volume.mountpoint().unwrap_or(""),
                last_backup_date: status.last_backup_date.unwrap_or(""),
                last_backup_status: self.status_cell(status.last_backup_status.unwrap_or("")),
            }
        });

        Ok(Table::new(rows).with(Style::modern()).to_string())
    }

    pub fn volume_detail(&self, volume: &VolumeRecord) -> Result<String> {
        if self.format.is_json() {
            return self.json(&serde_json::to_value(volume)?);
        }

        let status = volume.status();
        let mut output = String::new();
        for (label, value) in [
            ("ID", Some(volume.id())),
            ("Name", volume.name()),
            ("Hostname", volume.hostname()),
            ("Mountpoint", volume.mountpoint()),
            ("Backup date", status.last_backup_date),
        ] {
            output.push_str(&format!("{}: {}\n", self.label(label), value.unwrap_or("")));
        }
        output.push_str(&format!(
            "{}: {}\n",
            self.label("Backup status"),
            self.status_cell(status.last_backup_status.unwrap_or(""))
        ));

        let logs = volume.logs();
        if !logs.is_empty() {
            output.push_str(&format!("{}:\n", self.label("Logs")));
            let rows = logs
                .into_iter()
                .map(|(step, text)| LogRow { step, output: text });
            output.push_str(&Table::new(rows).with(Style::modern()).to_string());
            output.push('\n');
        }

        Ok(output)
    }

    /// Short confirmation line, or the raw result as JSON.
    pub fn message(&self, message: &str, result: &Value) -> Result<String> {
        if self.format.is_json() {
            return self.json(result);
        }
        Ok(self.success(message))
    }

    pub fn success(&self, message: &str) -> String {
        #[cfg(feature = "colored-output")]
        if self.colored {
            return format!("{} {}", "✓".green().bold(), message);
        }
        format!("✓ {message}")
    }

    fn label(&self, text: &str) -> String {
        #[cfg(feature = "colored-output")]
        if self.colored {
            return text.yellow().to_string();
        }
        text.to_string()
    }

    fn status_cell<'a>(&self, status: &'a str) -> Cow<'a, str> {
        #[cfg(feature = "colored-output")]
        if self.colored {
            return match status {
                "Success" => Cow::Owned(status.green().to_string()),
                "Failed" => Cow::Owned(status.red().to_string()),
                _ => Cow::Borrowed(status),
            };
        }
        Cow::Borrowed(status)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn volume() -> VolumeRecord {
        serde_json::from_value(json!({
            "ID": "pgdata",
            "Name": "pgdata",
            "Hostname": "node-1",
            "LastBackupStatus": "Success",
            "Logs": { "backup": "snapshot saved" }
        }))
        .unwrap()
    }

    #[test]
    fn table_lists_every_column() {
        let output = OutputManager::new(OutputFormat::Pretty, false);
        let volume = volume();
        let table = output.volumes([&volume]).unwrap();

        for header in ["ID", "Name", "Hostname", "Mountpoint", "LastBackupDate", "LastBackupStatus"] {
            assert!(table.contains(header), "missing column {header}");
        }
        assert!(table.contains("node-1"));
    }

    #[test]
    fn detail_includes_logs() {
        let output = OutputManager::new(OutputFormat::Pretty, false);
        let detail = output.volume_detail(&volume()).unwrap();
        assert!(detail.contains("Backup status: Success"));
        assert!(detail.contains("snapshot saved"));
    }

    #[test]
    fn json_output_keeps_raw_fields() {
        let output = OutputManager::new(OutputFormat::JsonCompact, false);
        let volume = volume();
        let rendered = output.volumes([&volume]).unwrap();
        let parsed: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed[0]["ID"], "pgdata");
        assert_eq!(parsed[0]["Logs"]["backup"], "snapshot saved");
    }

    #[test]
    fn empty_volume_list() {
        let output = OutputManager::new(OutputFormat::Pretty, false);
        let none: Vec<VolumeRecord> = Vec::new();
        assert_eq!(output.volumes(none.iter()).unwrap(), "No volumes");
    }
}
