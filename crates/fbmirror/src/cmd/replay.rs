use std::fs::File;
use std::io::{self, BufReader, Read};

use fbmirror_frame::{DisplayGeometry, FrameReader};
use tracing::info;

use crate::cmd::ReplayArgs;
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

/// Decode a capture with the same decoder the live link uses.
pub fn run(args: ReplayArgs, format: OutputFormat) -> CliResult<i32> {
    let geometry = args.geometry.geometry()?;
    let source = args.file.display().to_string();

    let input: Box<dyn Read> = if source == "-" {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(&args.file)
            .map_err(|err| io_error(&format!("failed to open {source}"), err))?;
        Box::new(BufReader::new(file))
    };

    let printed = replay(input, &source, geometry, args.count, format)?;
    info!(frames = printed, source = %source, "replay finished");
    Ok(SUCCESS)
}

fn replay<R: Read>(
    input: R,
    source: &str,
    geometry: DisplayGeometry,
    count: Option<usize>,
    format: OutputFormat,
) -> CliResult<usize> {
    let mut reader = FrameReader::new(input);
    let mut printed = 0usize;

    for frame in reader.by_ref() {
        let frame = frame.map_err(|err| frame_error("replay failed", err))?;
        printed += 1;
        print_frame(&frame, printed, source, geometry, format);
        if count.is_some_and(|n| printed >= n) {
            break;
        }
    }

    let stats = reader.decoder().stats();
    info!(
        malformed = stats.malformed,
        discarded = stats.bytes_discarded,
        "decoder statistics"
    );
    Ok(printed)
}
