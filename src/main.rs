//! keyshow: display held keys and mouse buttons in the terminal.
//!
//! Press 'q' (or Ctrl+C) to exit. Log lines go to stderr, which shares the
//! terminal with the display; set `RUST_LOG` and redirect stderr
//! (`2>keyshow.log`) to read listener diagnostics without disturbing it.

use std::io::{self, Write};
use std::process::ExitCode;

/// One log line in the form `[LEVEL target] message`.
///
/// The display keeps the terminal in raw mode, where a bare `\n` does not
/// return the cursor, so lines end in `\r\n`.
fn write_record(out: &mut impl Write, record: &log::Record) -> io::Result<()> {
    write!(
        out,
        "[{:<5} {}] {}\r\n",
        record.level(),
        record.target(),
        record.args()
    )
}

fn main() -> ExitCode {
    env_logger::builder()
        .filter_level(log::LevelFilter::Warn)
        .format(|buf, record| write_record(buf, record))
        .parse_default_env()
        .init();

    match keyshow::run(&keyshow::Config::default()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("keyshow: {}", e);
            ExitCode::FAILURE
        }
    }
}
