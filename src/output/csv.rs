use std::path::Path;

use anyhow::{Context, Result};

use super::OrderRow;

pub fn write_order(path: &Path, rows: &[OrderRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    writer.write_record(["position", "kind", "phase", "urn"])?;
    for row in rows {
        writer.write_record([
            row.position.to_string().as_str(),
            row.kind.as_str(),
            row.phase.as_deref().unwrap_or(""),
            row.urn.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("order.csv");
        let rows = [OrderRow {
            position: 1,
            kind: "Table".to_string(),
            phase: Some("Data".to_string()),
            urn: "Server[@Name='srv']/Table[@Name='t']/Data/Special".to_string(),
        }];
        write_order(&path, &rows).expect("write csv");
        let content = fs::read_to_string(&path).expect("read csv");
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("position,kind,phase,urn"));
        assert_eq!(
            lines.next(),
            Some("1,Table,Data,Server[@Name='srv']/Table[@Name='t']/Data/Special")
        );
    }
}
