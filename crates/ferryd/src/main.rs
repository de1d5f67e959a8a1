//! Binary entry point: the dispatch loop wired over process stdio with the
//! built-in handler catalogue.

use std::io;
use std::process::ExitCode;

use ferry_config::Config;
use ferryd::{
    EnvelopeWriter, HandlerCatalogue, LineInput, Listener, PlaceholderCaseFactory,
    initialise_telemetry,
};

fn main() -> ExitCode {
    let config = Config::load();

    if let Err(error) = initialise_telemetry(&config) {
        eprintln!("ferryd: {error}");
        return ExitCode::FAILURE;
    }

    let input = LineInput::new(io::BufReader::new(io::stdin()));
    let sink = EnvelopeWriter::new(
        io::stdout(),
        io::stderr(),
        config.severity_threshold(),
    );
    let mut listener = Listener::new(
        input,
        sink,
        HandlerCatalogue::builtin(),
        Box::new(PlaceholderCaseFactory),
    );

    let status = listener.run();
    u8::try_from(status).map_or(ExitCode::FAILURE, ExitCode::from)
}
