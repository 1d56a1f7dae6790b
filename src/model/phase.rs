use std::fmt;

/// Literal segment used to mark a derived phase Urn: `<urn>/<Phase>/Special`.
pub const SPECIAL_SEGMENT: &str = "Special";

/// A derived scripting step attached to an identifier.
///
/// The downstream script assembler reads the tag to pick which text builder
/// runs for that position in the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PhaseTag {
    Data,
    Object,
    Associations,
    Ownership,
    Permission,
    DatabaseReadOnly,
    ServerDdlTriggerEnable,
    ServerDdlTriggerDisable,
    DatabaseDdlTriggerEnable,
    DatabaseDdlTriggerDisable,
    UnresolvedEntity,
}

impl PhaseTag {
    pub const ALL: [PhaseTag; 11] = [
        PhaseTag::Data,
        PhaseTag::Object,
        PhaseTag::Associations,
        PhaseTag::Ownership,
        PhaseTag::Permission,
        PhaseTag::DatabaseReadOnly,
        PhaseTag::ServerDdlTriggerEnable,
        PhaseTag::ServerDdlTriggerDisable,
        PhaseTag::DatabaseDdlTriggerEnable,
        PhaseTag::DatabaseDdlTriggerDisable,
        PhaseTag::UnresolvedEntity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PhaseTag::Data => "Data",
            PhaseTag::Object => "Object",
            PhaseTag::Associations => "Associations",
            PhaseTag::Ownership => "Ownership",
            PhaseTag::Permission => "Permission",
            PhaseTag::DatabaseReadOnly => "databasereadonly",
            PhaseTag::ServerDdlTriggerEnable => "ddltriggerserverenable",
            PhaseTag::ServerDdlTriggerDisable => "ddltriggerserverdisable",
            PhaseTag::DatabaseDdlTriggerEnable => "ddltriggerdatabaseenable",
            PhaseTag::DatabaseDdlTriggerDisable => "ddltriggerdatabasedisable",
            PhaseTag::UnresolvedEntity => "UnresolvedEntity",
        }
    }

    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(segment))
    }
}

impl fmt::Display for PhaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
