use std::io::IsTerminal;

use fbmirror_transport::{PlatformPatterns, PortDiscovery, PortEnumerator, SystemPorts};
use serde::Serialize;

use crate::cmd::DoctorArgs;
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::OutputFormat;

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Warn,
    Info,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: String,
    status: CheckStatus,
    detail: String,
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(_args: DoctorArgs, format: OutputFormat) -> CliResult<i32> {
    let checks = vec![
        serial_enumeration_check(&SystemPorts),
        candidate_device_check(&PortDiscovery::system()),
        platform_patterns_check(),
        terminal_check(),
        compiled_features_check(),
    ];

    let has_fail = checks.iter().any(|c| matches!(c.status, CheckStatus::Fail));
    let overall = if has_fail { "fail" } else { "pass" };

    let output = DoctorOutput { checks, overall };

    print_doctor(&output, format);

    if has_fail {
        Ok(HEALTH_CHECK_FAILED)
    } else {
        Ok(SUCCESS)
    }
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("fbmirror doctor\n");
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<20} {}",
                    status_text(c.status),
                    c.name,
                    c.detail
                );
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
        OutputFormat::Raw => {
            println!("{}", output.overall);
        }
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Warn => "WARN",
        CheckStatus::Info => "INFO",
    }
}

fn serial_enumeration_check<E: PortEnumerator>(enumerator: &E) -> CheckResult {
    match enumerator.ports() {
        Ok(ports) => CheckResult {
            name: "serial_enumeration".to_string(),
            status: CheckStatus::Pass,
            detail: format!("{} port(s) visible", ports.len()),
        },
        Err(err) => CheckResult {
            name: "serial_enumeration".to_string(),
            status: CheckStatus::Fail,
            detail: err.to_string(),
        },
    }
}

fn candidate_device_check<E: PortEnumerator>(discovery: &PortDiscovery<E>) -> CheckResult {
    match discovery.find_device() {
        Some(device) => CheckResult {
            name: "candidate_device".to_string(),
            status: CheckStatus::Pass,
            detail: format!("{} ({})", device.address, device.description),
        },
        None => CheckResult {
            name: "candidate_device".to_string(),
            status: CheckStatus::Warn,
            detail: "no matching device; pass the port explicitly".to_string(),
        },
    }
}

fn platform_patterns_check() -> CheckResult {
    CheckResult {
        name: "platform_patterns".to_string(),
        status: CheckStatus::Info,
        detail: format!(
            "{}: {}",
            std::env::consts::OS,
            PlatformPatterns::current().patterns().join(", ")
        ),
    }
}

fn terminal_check() -> CheckResult {
    if std::io::stdout().is_terminal() {
        CheckResult {
            name: "terminal".to_string(),
            status: CheckStatus::Pass,
            detail: "stdout is a terminal; live view available".to_string(),
        }
    } else {
        CheckResult {
            name: "terminal".to_string(),
            status: CheckStatus::Info,
            detail: "stdout is not a terminal; view defaults to json".to_string(),
        }
    }
}

fn compiled_features_check() -> CheckResult {
    let mut features = Vec::new();
    if cfg!(feature = "link") {
        features.push("link");
    }
    if cfg!(feature = "async") {
        features.push("async");
    }
    if cfg!(feature = "cli") {
        features.push("cli");
    }

    CheckResult {
        name: "compiled_features".to_string(),
        status: CheckStatus::Info,
        detail: features.join(", "),
    }
}
