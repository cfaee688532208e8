use std::io::{self, Write};

use log::info;

use mvccdb::{Config, Mvcc, Result};

/// Interactive shell: one engine, one session, one command per line.
/// `RUST_LOG=debug` traces transaction lifecycles.
fn main() -> Result<()> {
    env_logger::init();

    let config = Config::from_env();
    if let Some(url) = &config.db_url {
        info!("configured data source {url}");
    }

    let engine = Mvcc::new();
    let mut session = engine.session();
    let mut input = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        input.clear();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let line = input.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        match session.execute(line) {
            Ok(output) if output.is_empty() => {}
            Ok(output) => println!("{output}"),
            Err(err) => println!("error: {err}"),
        }
    }
    Ok(())
}
