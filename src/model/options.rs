use std::str::FromStr;

use anyhow::Result;
use bitflags::bitflags;

use crate::error::AppError;

bitflags! {
    /// Which statements the script will contain. `CREATE | DROP` scripts a
    /// drop followed by a re-create.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ScriptBehavior: u8 {
        const CREATE = 0b001;
        const DROP = 0b010;
        const ALTER = 0b100;
    }
}

impl ScriptBehavior {
    pub fn is_drop_only(self) -> bool {
        self == ScriptBehavior::DROP
    }

    pub fn label(self) -> &'static str {
        if self == ScriptBehavior::CREATE {
            "create"
        } else if self == ScriptBehavior::ALTER {
            "alter"
        } else if self == ScriptBehavior::DROP {
            "drop"
        } else if self == ScriptBehavior::CREATE | ScriptBehavior::DROP {
            "create-drop"
        } else {
            "custom"
        }
    }
}

impl FromStr for ScriptBehavior {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(ScriptBehavior::CREATE),
            "alter" => Ok(ScriptBehavior::ALTER),
            "drop" => Ok(ScriptBehavior::DROP),
            "create-drop" | "drop-create" | "createdrop" | "dropcreate" => {
                Ok(ScriptBehavior::CREATE | ScriptBehavior::DROP)
            }
            other => Err(AppError::config(format!(
                "Unknown script behavior '{}' (expected create, alter, drop or create-drop)",
                other
            ))
            .into()),
        }
    }
}

/// What the ordered script should contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptingOptions {
    pub include_ddl: bool,
    pub include_data: bool,
    pub include_associations: bool,
    pub include_owner: bool,
    pub include_permissions: bool,
    pub behavior: ScriptBehavior,
    /// Design-mode scripting embeds constraints of a lone table in the table.
    pub design_mode: bool,
    pub include_filestream: bool,
}

impl Default for ScriptingOptions {
    fn default() -> Self {
        Self {
            include_ddl: true,
            include_data: false,
            include_associations: false,
            include_owner: false,
            include_permissions: false,
            behavior: ScriptBehavior::CREATE,
            design_mode: false,
            include_filestream: false,
        }
    }
}

impl ScriptingOptions {
    pub fn validate(&self) -> Result<()> {
        if !self.include_ddl && !self.include_data {
            return Err(AppError::config(
                "Nothing to script: enable schema (DDL) or data scripting",
            )
            .into());
        }
        if self.behavior.is_empty() {
            return Err(AppError::config("Script behavior must not be empty").into());
        }
        Ok(())
    }

    pub fn is_drop(&self) -> bool {
        self.behavior.is_drop_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, classify_error};

    #[test]
    fn parses_behaviors() {
        assert_eq!("create".parse::<ScriptBehavior>().unwrap(), ScriptBehavior::CREATE);
        assert_eq!("DROP".parse::<ScriptBehavior>().unwrap(), ScriptBehavior::DROP);
        let both = "create-drop".parse::<ScriptBehavior>().unwrap();
        assert!(both.contains(ScriptBehavior::CREATE));
        assert!(both.contains(ScriptBehavior::DROP));
        assert!(!both.is_drop_only());
        assert_eq!(both.label(), "create-drop");
        assert!("upsert".parse::<ScriptBehavior>().is_err());
    }

    #[test]
    fn rejects_empty_selection() {
        let options = ScriptingOptions {
            include_ddl: false,
            include_data: false,
            ..ScriptingOptions::default()
        };
        let err = options.validate().unwrap_err();
        assert_eq!(classify_error(&err), ErrorKind::Config);
        assert!(ScriptingOptions::default().validate().is_ok());
    }
}
