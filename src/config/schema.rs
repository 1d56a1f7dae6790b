use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::ScriptBehavior;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    pub default_profile: Option<String>,
    pub settings: Option<Settings>,
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub output: Option<OutputSettings>,
    pub scripting: Option<ScriptingSettings>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OutputSettings {
    pub default_format: Option<OutputFormat>,
    pub json: Option<JsonSettings>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct JsonSettings {
    pub pretty: Option<bool>,
}

/// Defaults for `order` flags; every field is optional.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScriptingSettings {
    pub include_ddl: Option<bool>,
    pub include_data: Option<bool>,
    pub include_associations: Option<bool>,
    pub include_owner: Option<bool>,
    pub include_permissions: Option<bool>,
    pub behavior: Option<BehaviorSetting>,
    pub design_mode: Option<bool>,
    pub include_filestream: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub server: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password_env: Option<String>,
    pub password: Option<String>,
    pub encrypt: Option<bool>,
    pub trust_cert: Option<bool>,
    pub timeout: Option<u64>,
    pub settings: Option<Settings>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Pretty,
    Markdown,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Pretty => "pretty",
            OutputFormat::Markdown => "markdown",
            OutputFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BehaviorSetting {
    Create,
    Alter,
    Drop,
    CreateDrop,
}

impl BehaviorSetting {
    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorSetting::Create => "create",
            BehaviorSetting::Alter => "alter",
            BehaviorSetting::Drop => "drop",
            BehaviorSetting::CreateDrop => "create-drop",
        }
    }

    pub fn to_behavior(self) -> ScriptBehavior {
        match self {
            BehaviorSetting::Create => ScriptBehavior::CREATE,
            BehaviorSetting::Alter => ScriptBehavior::ALTER,
            BehaviorSetting::Drop => ScriptBehavior::DROP,
            BehaviorSetting::CreateDrop => ScriptBehavior::CREATE | ScriptBehavior::DROP,
        }
    }
}
