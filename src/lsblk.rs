use std::collections::HashMap;

use tracing::warn;

use crate::cmd::{CommandRunner, CommandSpec};

// ── Data types ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disk {
    pub path: String,  // /dev/sda
    pub size: String,  // 20G
    pub model: String, // SAMSUNG SSD 870
}

impl Disk {
    /// One-line label shown in the arrow-key selector.
    pub fn display(&self) -> String {
        format!("{:<14}  {:>8}   {}", self.path, self.size, self.model)
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Returns all block devices of type `disk` visible to the system.
/// Falls back to an empty list if `lsblk` is unavailable.
pub fn list_disks(runner: &dyn CommandRunner) -> Vec<Disk> {
    let spec = CommandSpec::new("lsblk").args([
        "--pairs",
        "--output",
        "NAME,SIZE,TYPE,MODEL",
        "--nodeps",
    ]);
    match runner.run(&spec) {
        Ok(out) => parse_disks(&out.stdout),
        Err(e) => {
            warn!(error = %e, "lsblk failed; falling back to manual disk entry");
            vec![]
        }
    }
}

pub fn parse_disks(output: &str) -> Vec<Disk> {
    output
        .lines()
        .filter_map(|line| {
            let m = parse_pairs(line);
            if m.get("TYPE").map(String::as_str) != Some("disk") {
                return None;
            }
            let name = m.get("NAME").filter(|n| !n.is_empty())?;
            Some(Disk {
                path: format!("/dev/{}", name),
                size: m.get("SIZE").cloned().unwrap_or_default(),
                model: match m.get("MODEL") {
                    Some(s) if !s.is_empty() => s.clone(),
                    _ => "—".to_string(),
                },
            })
        })
        .collect()
}

// ── lsblk --pairs parser ──────────────────────────────────────────────────────
//
// Each line looks like:   NAME="sda" SIZE="20G" TYPE="disk" MODEL="SAMSUNG SSD 870"
// Values may contain spaces but never a double quote.

fn parse_pairs(line: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    let mut rest = line.trim_start();

    while let Some((key, tail)) = rest.split_once("=\"") {
        let Some((value, tail)) = tail.split_once('"') else { break };
        let key = key.trim();
        if !key.is_empty() && !key.contains(char::is_whitespace) {
            map.insert(key.to_string(), value.to_string());
        }
        rest = tail.trim_start();
    }

    map
}
