use asadm_engine::size::byte_size;
use asadm_engine::summary::{IndexType, NamespaceSummary};
use asadm_engine::{LicenseUsage, StorageUsage, Summary};
use owo_colors::OwoColorize;
use std::fmt;

const LINE_WIDTH: usize = 72;
const KEY_WIDTH: usize = 22;

/// Text layout of a cluster summary.
pub struct SummaryView<'a> {
    pub summary: &'a Summary,
    pub enable_color: bool,
}

fn storage_line(usage: &StorageUsage) -> String {
    format!(
        "Total {}, {:.2}% used ({}), {:.2}% available ({})",
        byte_size(usage.total),
        usage.used_pct,
        byte_size(usage.used),
        usage.avail_pct,
        byte_size(usage.avail)
    )
}

fn license_line(usage: &LicenseUsage) -> String {
    let mut line = format!("Latest {}", byte_size(usage.latest));
    if let Some(time) = &usage.latest_time {
        line.push_str(&format!(" on {}", time.to_rfc3339()));
    }
    if let (Some(min), Some(max), Some(avg)) = (usage.min, usage.max, usage.avg) {
        line.push_str(&format!(
            ", min {}, max {}, avg {}",
            byte_size(min),
            byte_size(max),
            byte_size(avg)
        ));
    }
    line
}

fn join<T: fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl<'a> SummaryView<'a> {
    fn heading(&self, f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
        let title = format!(" {} ", title);
        let pad = LINE_WIDTH.saturating_sub(title.len());
        let line = format!("{}{}{}", "~".repeat(pad / 2), title, "~".repeat(pad - pad / 2));
        if self.enable_color {
            writeln!(f, "{}", line.bold())
        } else {
            writeln!(f, "{}", line)
        }
    }

    fn entries(&self, f: &mut fmt::Formatter<'_>, indent: &str, entries: &[(&str, String)]) -> fmt::Result {
        for (i, (key, value)) in entries.iter().enumerate() {
            let key = format!("{:<KEY_WIDTH$}", key);
            if self.enable_color {
                writeln!(f, "{}{:>2}. {}: {}", indent, i + 1, key.bold(), value)?;
            } else {
                writeln!(f, "{}{:>2}. {}: {}", indent, i + 1, key, value)?;
            }
        }
        Ok(())
    }

    fn namespace_entries(ns: &NamespaceSummary) -> Vec<(&'static str, String)> {
        let mut entries = Vec::new();

        if ns.devices_total > 0 {
            entries.push((
                "Devices",
                format!(
                    "Total {}, per-node {}{}",
                    ns.devices_total,
                    ns.devices_per_node,
                    if ns.device_count_same_across_nodes { "" } else { " (number differs across nodes)" }
                ),
            ));
        }
        entries.push(("Memory", storage_line(&ns.memory)));
        if let Some(device) = &ns.device {
            entries.push(("Device", storage_line(device)));
        }
        if let Some(pmem) = &ns.pmem {
            entries.push(("Pmem", storage_line(pmem)));
        }
        match ns.index_type {
            IndexType::Pmem => {
                if let Some(index) = &ns.pmem_index {
                    entries.push(("Pmem Index", storage_line(index)));
                }
            }
            IndexType::Flash => {
                if let Some(index) = &ns.flash_index {
                    entries.push(("Flash Index", storage_line(index)));
                }
            }
            IndexType::Shmem => {}
        }
        entries.push(("License Usage", license_line(&ns.license_data)));
        entries.push(("Replication Factor", join(&ns.repl_factor)));
        entries.push(("Rack-aware", if ns.rack_aware { "True" } else { "False" }.to_string()));
        if let Some(ratio) = ns.compression_ratio {
            entries.push(("Compression Ratio", format!("{:.3}", ratio)));
        }
        if let Some(pct) = ns.cache_read_pct {
            entries.push(("Cache Read%", format!("{} %", pct)));
        }
        entries.push(("Master Objects", ns.master_objects.to_string()));
        if ns.migrations_in_progress {
            entries.push(("Migrations", "in progress".to_string()));
        }
        entries
    }
}

impl<'a> fmt::Display for SummaryView<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cluster = &self.summary.cluster;

        self.heading(f, "Cluster")?;

        let mut entries = Vec::new();
        if !cluster.cluster_name.is_empty() {
            entries.push(("Cluster Name", join(&cluster.cluster_name)));
        }
        entries.push(("Server Version", join(&cluster.server_version)));
        entries.push(("OS Version", join(&cluster.os_version)));
        entries.push(("Cluster Size", join(&cluster.cluster_size)));
        entries.push((
            "Devices",
            format!(
                "Total {}, per-node {}{}",
                cluster.device_count,
                cluster.device_count_per_node,
                if cluster.device_count_same_across_nodes { "" } else { " (number differs across nodes)" }
            ),
        ));
        entries.push(("Memory", storage_line(&cluster.memory)));
        if let Some(device) = &cluster.device {
            entries.push(("Device", storage_line(device)));
        }
        if let Some(pmem) = &cluster.pmem {
            entries.push(("Pmem", storage_line(pmem)));
        }
        if let Some(index) = &cluster.pmem_index {
            entries.push(("Pmem Index", storage_line(index)));
        }
        if let Some(index) = &cluster.flash_index {
            entries.push(("Flash Index", storage_line(index)));
        }
        entries.push(("License Usage", license_line(&cluster.license_data)));
        entries.push((
            "Active Namespaces",
            format!("{} of {}", cluster.active_ns, cluster.ns_count),
        ));
        entries.push(("Active Features", join(&cluster.active_features)));
        if cluster.migrations_in_progress {
            entries.push(("Migrations", "in progress".to_string()));
        }
        self.entries(f, " ", &entries)?;

        if self.summary.namespaces.is_empty() {
            return Ok(());
        }

        writeln!(f)?;
        self.heading(f, "Namespaces")?;
        for (name, ns) in &self.summary.namespaces {
            if self.enable_color {
                writeln!(f, "{}", name.bold())?;
            } else {
                writeln!(f, "{}", name)?;
            }
            self.entries(f, "   ", &Self::namespace_entries(ns))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_line() {
        let usage = StorageUsage {
            total: 1024,
            used: 256,
            used_pct: 25.0,
            avail: 768,
            avail_pct: 75.0,
        };
        assert_eq!(
            storage_line(&usage),
            "Total 1 KB, 25.00% used (256 B), 75.00% available (768 B)"
        );
    }

    #[test]
    fn test_license_line_with_aggregates() {
        let usage = LicenseUsage {
            latest: 2048,
            latest_time: None,
            min: Some(1024),
            max: Some(4096),
            avg: Some(2048),
        };
        assert_eq!(license_line(&usage), "Latest 2 KB, min 1 KB, max 4 KB, avg 2 KB");
        assert_eq!(license_line(&LicenseUsage::latest_only(650)), "Latest 650 B");
    }

    #[test]
    fn test_summary_view_lists_namespaces() {
        let mut summary = Summary::new(["test".to_string()]);
        summary.cluster.server_version = vec!["E-6.2.0.3".to_string()];
        summary.cluster.active_features = vec!["KVS".to_string(), "Scan".to_string()];

        let out = SummaryView {
            summary: &summary,
            enable_color: false,
        }
        .to_string();

        assert!(out.contains(" 1. Server Version        : E-6.2.0.3"));
        assert!(out.contains("Active Features       : KVS, Scan"));
        assert!(out.contains("\ntest\n"));
    }
}
