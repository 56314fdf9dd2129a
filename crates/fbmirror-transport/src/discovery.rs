//! Heuristic discovery of the display device among the host's serial ports.
//!
//! A port is a candidate when its description names a common USB-UART
//! bridge vendor, or when its address follows the host's naming convention
//! for USB serial devices. The first candidate in enumeration order wins.

use tracing::{debug, trace};

use crate::serial::SystemPorts;
use crate::traits::PortEnumerator;

/// Case-insensitive vendor/chip keywords matched against port descriptions.
pub const CHIP_KEYWORDS: &[&str] = &[
    "cp210",
    "ch340",
    "ftdi",
    "usb serial",
    "uart",
    "slab",
    "silicon labs",
    "wch",
    "prolific",
];

/// Address patterns per OS family, keyed by `std::env::consts::OS`.
/// Any OS not listed uses the fallback entry.
const PLATFORM_PATTERNS: &[(&str, &[&str])] = &[
    ("windows", &["com"]),
    (
        "macos",
        &["tty.usb", "tty.wch", "tty.slab", "cu.usb", "cu.wch", "cu.slab"],
    ),
];

const FALLBACK_PATTERNS: &[&str] = &["ttyusb", "ttyacm", "ttyama"];

/// A serial port as seen by discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Platform port address, e.g. `/dev/ttyUSB0` or `COM3`.
    pub address: String,
    /// Human-readable description.
    pub description: String,
}

impl DeviceDescriptor {
    pub fn new(address: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            description: description.into(),
        }
    }
}

/// Why a port was (or was not) considered a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchReason {
    /// Description contains the given chip keyword.
    Keyword(&'static str),
    /// Address contains the given platform naming pattern.
    Pattern(&'static str),
    /// Not a candidate.
    None,
}

impl MatchReason {
    pub fn is_match(self) -> bool {
        !matches!(self, MatchReason::None)
    }
}

impl std::fmt::Display for MatchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchReason::Keyword(k) => write!(f, "keyword \"{k}\""),
            MatchReason::Pattern(p) => write!(f, "pattern \"{p}\""),
            MatchReason::None => f.write_str("-"),
        }
    }
}

/// Address naming patterns for one OS family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformPatterns {
    patterns: &'static [&'static str],
}

impl PlatformPatterns {
    /// Patterns for the OS this binary was built for.
    pub fn current() -> Self {
        Self::for_os(std::env::consts::OS)
    }

    /// Patterns for an OS identifier as reported by `std::env::consts::OS`.
    pub fn for_os(os: &str) -> Self {
        let patterns = PLATFORM_PATTERNS
            .iter()
            .find(|(name, _)| *name == os)
            .map(|(_, patterns)| *patterns)
            .unwrap_or(FALLBACK_PATTERNS);
        Self { patterns }
    }

    pub fn patterns(&self) -> &'static [&'static str] {
        self.patterns
    }
}

/// Finds the display device using a port enumerator.
#[derive(Debug, Clone)]
pub struct PortDiscovery<E> {
    enumerator: E,
    platform: PlatformPatterns,
}

impl PortDiscovery<SystemPorts> {
    /// Discovery over the host's real serial ports.
    pub fn system() -> Self {
        Self::new(SystemPorts)
    }
}

impl<E: PortEnumerator> PortDiscovery<E> {
    /// Discovery using the current platform's naming patterns.
    pub fn new(enumerator: E) -> Self {
        Self::with_platform(enumerator, PlatformPatterns::current())
    }

    /// Discovery using an explicit platform pattern set.
    pub fn with_platform(enumerator: E, platform: PlatformPatterns) -> Self {
        Self {
            enumerator,
            platform,
        }
    }

    /// First port that looks like the display device, if any.
    ///
    /// Enumeration failures count as "nothing found".
    pub fn find_device(&self) -> Option<DeviceDescriptor> {
        let found = self
            .enumerate()
            .into_iter()
            .find(|port| self.classify(port).is_match());
        match &found {
            Some(port) => debug!(address = %port.address, description = %port.description, "found candidate device"),
            None => trace!("no candidate device"),
        }
        found
    }

    /// Every visible port with the reason it matched.
    pub fn candidates(&self) -> Vec<(DeviceDescriptor, MatchReason)> {
        self.enumerate()
            .into_iter()
            .map(|port| {
                let reason = self.classify(&port);
                (port, reason)
            })
            .collect()
    }

    /// Classify a single port. Keywords are checked before patterns.
    pub fn classify(&self, port: &DeviceDescriptor) -> MatchReason {
        let description = port.description.to_lowercase();
        if let Some(keyword) = CHIP_KEYWORDS.iter().find(|k| description.contains(*k)) {
            return MatchReason::Keyword(*keyword);
        }

        let address = port.address.to_lowercase();
        if let Some(pattern) = self
            .platform
            .patterns()
            .iter()
            .find(|p| address.contains(*p))
        {
            return MatchReason::Pattern(*pattern);
        }

        MatchReason::None
    }

    fn enumerate(&self) -> Vec<DeviceDescriptor> {
        match self.enumerator.ports() {
            Ok(ports) => ports,
            Err(err) => {
                debug!(error = %err, "port enumeration failed");
                Vec::new()
            }
        }
    }
}

/// Find the display device among the host's real serial ports.
pub fn find_device() -> Option<DeviceDescriptor> {
    PortDiscovery::system().find_device()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, TransportError};

    struct FixedPorts(Vec<DeviceDescriptor>);

    impl PortEnumerator for FixedPorts {
        fn ports(&self) -> Result<Vec<DeviceDescriptor>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenEnumerator;

    impl PortEnumerator for BrokenEnumerator {
        fn ports(&self) -> Result<Vec<DeviceDescriptor>> {
            Err(TransportError::Enumerate("no backend".to_string()))
        }
    }

    fn linux(ports: Vec<DeviceDescriptor>) -> PortDiscovery<FixedPorts> {
        PortDiscovery::with_platform(FixedPorts(ports), PlatformPatterns::for_os("linux"))
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let discovery = linux(vec![
            DeviceDescriptor::new("/dev/ttyS0", "n/a"),
            DeviceDescriptor::new("/dev/serial-x", "Silicon Labs CP2102 USB to UART Bridge"),
        ]);
        let found = discovery.find_device().expect("device should be found");
        assert_eq!(found.address, "/dev/serial-x");
    }

    #[test]
    fn address_pattern_match() {
        let discovery = linux(vec![
            DeviceDescriptor::new("/dev/ttyS0", "n/a"),
            DeviceDescriptor::new("/dev/ttyACM0", "n/a"),
        ]);
        assert_eq!(discovery.find_device().unwrap().address, "/dev/ttyACM0");
    }

    #[test]
    fn first_match_in_enumeration_order_wins() {
        let discovery = linux(vec![
            DeviceDescriptor::new("/dev/ttyUSB1", "n/a"),
            DeviceDescriptor::new("/dev/ttyUSB0", "QinHeng CH340"),
        ]);
        assert_eq!(discovery.find_device().unwrap().address, "/dev/ttyUSB1");
    }

    #[test]
    fn no_match_returns_none() {
        let discovery = linux(vec![
            DeviceDescriptor::new("/dev/ttyS0", "n/a"),
            DeviceDescriptor::new("/dev/ttyS1", "PCI serial port"),
        ]);
        assert!(discovery.find_device().is_none());
    }

    #[test]
    fn enumeration_failure_is_not_an_error() {
        let discovery =
            PortDiscovery::with_platform(BrokenEnumerator, PlatformPatterns::for_os("linux"));
        assert!(discovery.find_device().is_none());
        assert!(discovery.candidates().is_empty());
    }

    #[test]
    fn platform_table_selects_patterns() {
        assert_eq!(PlatformPatterns::for_os("windows").patterns(), &["com"]);
        assert!(PlatformPatterns::for_os("macos")
            .patterns()
            .contains(&"cu.usb"));
        assert_eq!(PlatformPatterns::for_os("freebsd").patterns(), FALLBACK_PATTERNS);
    }

    #[test]
    fn macos_patterns_do_not_apply_on_linux() {
        let port = DeviceDescriptor::new("/dev/cu.usbserial-1410", "n/a");
        let mac = PortDiscovery::with_platform(
            FixedPorts(vec![port.clone()]),
            PlatformPatterns::for_os("macos"),
        );
        assert_eq!(mac.classify(&port), MatchReason::Pattern("cu.usb"));
        assert_eq!(linux(Vec::new()).classify(&port), MatchReason::None);
    }

    #[test]
    fn candidates_report_reasons() {
        let discovery = linux(vec![
            DeviceDescriptor::new("/dev/ttyS0", "n/a"),
            DeviceDescriptor::new("/dev/ttyUSB0", "FTDI FT232R"),
        ]);
        let candidates = discovery.candidates();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].1, MatchReason::None);
        assert_eq!(candidates[1].1, MatchReason::Keyword("ftdi"));
    }
}
