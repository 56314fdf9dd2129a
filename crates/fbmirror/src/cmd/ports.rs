use fbmirror_transport::{PortDiscovery, PortEnumerator, SystemPorts};

use crate::cmd::PortsArgs;
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_ports, OutputFormat};

pub fn run(args: PortsArgs, format: OutputFormat) -> CliResult<i32> {
    let ports = SystemPorts
        .ports()
        .map_err(|err| transport_error("failed to list serial ports", err))?;

    let discovery = PortDiscovery::system();
    let classified: Vec<_> = ports
        .into_iter()
        .map(|port| {
            let reason = discovery.classify(&port);
            (port, reason)
        })
        .filter(|(_, reason)| !args.candidates || reason.is_match())
        .collect();

    print_ports(&classified, format);
    Ok(SUCCESS)
}
