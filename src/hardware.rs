use std::fmt;

use sysinfo::System;

/// What the host offers for a CPU search.
#[derive(Debug, Clone)]
pub struct HardwareInfo {
    pub cpu: String,
    pub physical_cores: usize,
    pub logical_cores: usize,
    pub memory_bytes: u64,
}

impl HardwareInfo {
    pub fn detect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        let cpu = sys
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .filter(|brand| !brand.is_empty())
            .unwrap_or_else(|| "Unknown CPU".to_string());

        Self {
            cpu,
            physical_cores: num_cpus::get_physical(),
            logical_cores: num_cpus::get(),
            memory_bytes: sys.total_memory(),
        }
    }

    pub fn memory_gb(&self) -> f64 {
        self.memory_bytes as f64 / 1_073_741_824.0
    }
}

impl fmt::Display for HardwareInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Hardware:")?;
        writeln!(f, "  CPU:      {}", self.cpu)?;
        writeln!(
            f,
            "  Cores:    {} physical ({} logical)",
            self.physical_cores, self.logical_cores
        )?;
        write!(f, "  Memory:   {:.1}GB", self.memory_gb())
    }
}

/// Print host hardware to stdout
pub fn display_hardware_info() {
    println!("{}", HardwareInfo::detect());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_layout() {
        let info = HardwareInfo {
            cpu: "Test CPU".into(),
            physical_cores: 4,
            logical_cores: 8,
            memory_bytes: 16 * 1_073_741_824,
        };
        assert_eq!(
            info.to_string(),
            "Hardware:\n  CPU:      Test CPU\n  Cores:    4 physical (8 logical)\n  Memory:   16.0GB"
        );
    }

    #[test]
    fn test_detect_reports_cores() {
        let info = HardwareInfo::detect();
        assert!(info.logical_cores >= 1);
        assert!(info.physical_cores >= 1);
    }
}
