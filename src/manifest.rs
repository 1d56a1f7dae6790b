use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::Result;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::AppError;
use crate::model::{EntityMetadata, EntityRepository, InCreationRegistry, Urn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ManifestFile {
    #[serde(default)]
    objects: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ManifestEntry {
    urn: String,
    #[serde(default)]
    creating: bool,
    #[serde(default)]
    metadata: EntityMetadata,
}

/// Objects to order, with the metadata the orderer needs about each.
///
/// ```yaml
/// objects:
///   - urn: "Server[@Name='srv']/Database[@Name='sales']/Table[@Name='orders' and @Schema='dbo']"
///     metadata:
///       id: 581577110
///   - urn: "Server[@Name='srv']/Database[@Name='sales']/View[@Name='recent' and @Schema='dbo']"
///     creating: true
/// ```
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    objects: IndexMap<Urn, EntityMetadata>,
    creating: HashSet<Urn>,
}

impl Manifest {
    /// Loads a manifest, picking the format from the file extension.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|err| {
            AppError::config(format!(
                "Failed to read manifest {}: {}",
                path.display(),
                err
            ))
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            Some("json") => Self::from_json_str(&content),
            _ => Err(AppError::config(format!(
                "Unsupported manifest extension: {} (expected .yaml, .yml or .json)",
                path.display()
            ))
            .into()),
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: ManifestFile = serde_yaml::from_str(content)
            .map_err(|err| AppError::config(format!("Invalid YAML manifest: {}", err)))?;
        Self::from_file(file)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: ManifestFile = serde_json::from_str(content)
            .map_err(|err| AppError::config(format!("Invalid JSON manifest: {}", err)))?;
        Self::from_file(file)
    }

    fn from_file(file: ManifestFile) -> Result<Self> {
        let mut manifest = Manifest::default();
        for (index, entry) in file.objects.into_iter().enumerate() {
            let urn = Urn::parse(&entry.urn).map_err(|err| {
                AppError::config(format!("Manifest entry {} ({}): {}", index + 1, entry.urn, err))
            })?;
            if manifest.objects.contains_key(&urn) {
                return Err(AppError::config(format!(
                    "Manifest entry {} repeats {}",
                    index + 1,
                    urn
                ))
                .into());
            }
            if entry.creating {
                manifest.creating.insert(urn.clone());
            }
            manifest.objects.insert(urn, entry.metadata);
        }
        Ok(manifest)
    }

    /// Every object in file order.
    pub fn urns(&self) -> Vec<Urn> {
        self.objects.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl EntityRepository for Manifest {
    fn resolve(&self, urn: &Urn) -> Option<&EntityMetadata> {
        self.objects.get(urn)
    }
}

impl InCreationRegistry for Manifest {
    fn contains(&self, urn: &Urn) -> bool {
        self.creating.contains(urn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, classify_error};

    const SAMPLE: &str = r#"
objects:
  - urn: "Server[@Name='srv']/Database[@Name='db']/Table[@Name='orders' and @Schema='dbo']"
    metadata:
      id: 10
      foreignKeys:
        - urn: "Server[@Name='srv']/Database[@Name='db']/Table[@Name='orders' and @Schema='dbo']/ForeignKey[@Name='fk_customer']"
  - urn: "Server[@Name='srv']/Database[@Name='db']/View[@Name='recent' and @Schema='dbo']"
    creating: true
"#;

    #[test]
    fn loads_yaml_objects_in_order() {
        let manifest = Manifest::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(manifest.len(), 2);
        let urns = manifest.urns();
        assert_eq!(urns[0].name(), Some("orders"));
        assert_eq!(manifest.resolve(&urns[0]).unwrap().id, Some(10));
        assert_eq!(manifest.resolve(&urns[0]).unwrap().foreign_keys.len(), 1);
        assert!(!manifest.contains(&urns[0]));
        assert!(manifest.contains(&urns[1]));
    }

    #[test]
    fn lookup_ignores_attribute_order() {
        let manifest = Manifest::from_yaml_str(SAMPLE).unwrap();
        let urn = Urn::parse(
            "Server[@Name='srv']/Database[@Name='db']/Table[@Schema='dbo' and @Name='orders']",
        )
        .unwrap();
        assert!(manifest.resolve(&urn).is_some());
    }

    #[test]
    fn loads_json() {
        let json = r#"{"objects":[{"urn":"Server[@Name='srv']/Login[@Name='app']","metadata":{"loginType":"sqlLogin"}}]}"#;
        let manifest = Manifest::from_json_str(json).unwrap();
        assert_eq!(manifest.len(), 1);
    }

    #[test]
    fn rejects_unknown_fields() {
        let yaml = "objects:\n  - urn: \"Server[@Name='srv']\"\n    colour: blue\n";
        let err = Manifest::from_yaml_str(yaml).unwrap_err();
        assert_eq!(classify_error(&err), ErrorKind::Config);
    }

    #[test]
    fn bad_urn_names_the_entry() {
        let yaml = "objects:\n  - urn: \"Server[@Name='srv']\"\n  - urn: \"Table[@Name=\"\n";
        let err = Manifest::from_yaml_str(yaml).unwrap_err();
        assert_eq!(classify_error(&err), ErrorKind::Config);
        assert!(err.to_string().contains("Manifest entry 2"));
    }

    #[test]
    fn rejects_repeated_urns() {
        let yaml = "objects:\n  - urn: \"Server[@Name='srv']\"\n  - urn: \"Server[@Name='srv']\"\n";
        let err = Manifest::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("repeats"));
    }
}
