//! Plain-text trajectory export
//!
//! Two `#` header lines followed by one `x,y,pen` line per waypoint, with
//! coordinates in millimeters to two decimals and `pen` as `1` (down) or `0`
//! (up). The file is written for firmware upload and never read back.

use crate::error::PlannerResult;
use scaradraw_core::Waypoint;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Header lines written before the waypoints
pub const EXPORT_HEADER: [&str; 2] = [
    "# Robot SCARA drawing path",
    "# Format: x,y,pen_state (1=down, 0=up)",
];

/// Format a single waypoint line, without the terminator
pub fn format_waypoint(waypoint: &Waypoint) -> String {
    format!(
        "{:.2},{:.2},{}",
        waypoint.position.x,
        waypoint.position.y,
        waypoint.pen.as_flag()
    )
}

/// Write the header and all waypoints to `writer`
pub fn write_trajectory<W: Write>(writer: &mut W, waypoints: &[Waypoint]) -> std::io::Result<()> {
    for line in EXPORT_HEADER {
        writeln!(writer, "{}", line)?;
    }
    for waypoint in waypoints {
        writeln!(writer, "{}", format_waypoint(waypoint))?;
    }
    writer.flush()
}

/// Write the trajectory to a file, replacing any existing content
pub fn export_trajectory(path: impl AsRef<Path>, waypoints: &[Waypoint]) -> PlannerResult<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write_trajectory(&mut writer, waypoints)?;
    tracing::info!("Exported {} waypoints to {}", waypoints.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_format() {
        let waypoints = [Waypoint::up(-10.0, 75.126), Waypoint::down(0.0, 75.0)];
        let mut out = Vec::new();
        write_trajectory(&mut out, &waypoints).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "# Robot SCARA drawing path\n\
             # Format: x,y,pen_state (1=down, 0=up)\n\
             -10.00,75.13,0\n\
             0.00,75.00,1\n"
        );
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("path.txt");
        export_trajectory(&path, &[Waypoint::down(1.0, 2.0)]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert_eq!(text.lines().last(), Some("1.00,2.00,1"));
    }
}
