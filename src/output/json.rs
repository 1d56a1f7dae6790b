use serde::Serialize;
use serde_json::json;

use super::OrderRow;
use crate::config::ResolvedConfig;
use crate::order::{Folded, RANK_TABLE_VERSION};

pub fn emit_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
    if pretty {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(serde_json::to_string(value)?)
    }
}

pub fn emit_json_value(value: &serde_json::Value, pretty: bool) -> anyhow::Result<String> {
    emit_json(value, pretty)
}

pub fn error_json(message: &str, kind: &str) -> serde_json::Value {
    json!({
        "error": {
            "message": message,
            "kind": kind,
        }
    })
}

pub fn order_to_json(rows: &[OrderRow], folded: &[Folded]) -> serde_json::Value {
    json!({
        "count": rows.len(),
        "rankTableVersion": RANK_TABLE_VERSION,
        "order": rows,
        "folded": folded,
    })
}

pub fn config_to_json(resolved: &ResolvedConfig) -> serde_json::Value {
    let scripting = &resolved.settings.scripting;
    json!({
        "configPath": resolved.config_path.as_ref().map(|p| p.display().to_string()),
        "profileName": resolved.profile_name,
        "connection": {
            "server": resolved.connection.server,
            "port": resolved.connection.port,
            "database": resolved.connection.database,
            "user": resolved.connection.user,
            "password": resolved.connection.password.as_ref().map(|_| "********"),
            "encrypt": resolved.connection.encrypt,
            "trustCert": resolved.connection.trust_cert,
            "timeoutMs": resolved.connection.timeout_ms,
        },
        "settings": {
            "output": {
                "defaultFormat": resolved.settings.output.default_format.as_str(),
                "json": {
                    "pretty": resolved.settings.output.json_pretty,
                },
            },
            "scripting": {
                "includeDdl": scripting.include_ddl,
                "includeData": scripting.include_data,
                "includeAssociations": scripting.include_associations,
                "includeOwner": scripting.include_owner,
                "includePermissions": scripting.include_permissions,
                "behavior": scripting.behavior.label(),
                "designMode": scripting.design_mode,
                "includeFilestream": scripting.include_filestream,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConnectionSettings, SettingsResolved};
    use crate::model::Urn;
    use crate::order::FoldReason;

    #[test]
    fn emits_error_json() {
        let value = error_json("boom", "Internal");
        assert_eq!(value["error"]["message"], "boom");
        assert_eq!(value["error"]["kind"], "Internal");
    }

    #[test]
    fn config_json_includes_defaults_and_masks_password() {
        let resolved = ResolvedConfig {
            config_path: None,
            profile_name: "default".to_string(),
            connection: ConnectionSettings {
                password: Some("secret".to_string()),
                ..ConnectionSettings::default()
            },
            settings: SettingsResolved::default(),
        };
        let value = config_to_json(&resolved);
        assert_eq!(value["profileName"], "default");
        assert_eq!(value["settings"]["output"]["defaultFormat"], "pretty");
        assert_eq!(value["settings"]["scripting"]["behavior"], "create");
        assert_eq!(value["connection"]["password"], "********");
    }

    #[test]
    fn order_json_serializes_urns_as_strings() {
        let table = Urn::root("Server", "srv").child("Database", "db").child("Table", "t");
        let rows = [OrderRow {
            position: 1,
            kind: "Table".to_string(),
            phase: None,
            urn: table.to_string(),
        }];
        let folded = [Folded {
            owner: table.clone(),
            member: table.child("Index", "pk"),
            reason: FoldReason::KeyIndex,
        }];
        let value = order_to_json(&rows, &folded);
        assert_eq!(value["count"], 1);
        assert_eq!(value["rankTableVersion"], RANK_TABLE_VERSION);
        assert_eq!(value["order"][0]["kind"], "Table");
        assert!(value["order"][0]["phase"].is_null());
        assert_eq!(value["folded"][0]["reason"], "keyIndex");
        assert_eq!(value["folded"][0]["owner"], table.to_string());
    }
}
