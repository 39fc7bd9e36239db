// Streamscrub example program: scrubpipe
//
// Copies stdin to stdout, redacting every pattern supplied on the command
// line, including hex / base-64 / percent / separator-encoded forms.
// Patterns may arrive split across reads; the scrubber handles the
// boundaries.
//
// Usage:
//
//     scrubpipe <pattern>...
//
// where each <pattern> is `value` or `value=>placeholder`.
//
// Example:
//
//     tail -f app.log | cargo run --example scrubpipe -- 'hunter2=>[PASSWORD]'
//

use std::env;
use std::io::{self, Read, Write};
use std::process::exit;

use streamscrub::{Pattern, PatternProvider, Patterns, Scrubber};

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.is_empty() {
        eprintln!("Usage: scrubpipe <pattern>...");
        exit(2);
    }

    let patterns = match args.iter().map(|arg| arg.parse::<Pattern>()).collect::<Result<Patterns, _>>() {
        Ok(patterns) => patterns,
        Err(err) => {
            eprintln!("ERROR: unable to parse pattern: {}", err);
            exit(2);
        }
    };

    let stdin = io::stdin();
    let stdout = io::stdout();

    let mut input = stdin.lock();
    let mut scrubber = Scrubber::new(stdout.lock()).with_secret_provider(PatternProvider::with_variants(patterns));

    let mut chunk = [0u8; 4096];

    loop {
        let n = match input.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(ref err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                eprintln!("ERROR: unable to read input: {}", err);
                exit(1);
            }
        };

        if let Err(err) = scrubber.write_all(&chunk[..n]) {
            eprintln!("ERROR: unable to write output: {}", err);
            exit(1);
        }
    }

    if let Err(err) = scrubber.close() {
        eprintln!("ERROR: unable to finalize output: {}", err);
        exit(1);
    }
}
