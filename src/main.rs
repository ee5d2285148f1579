use anyhow::{Context, Result};
use fsh::command::ExitCode;
use fsh::config::Config;
use fsh::env::Environment;
use fsh::fs::{Filesystem, OsFs};
use fsh::{Interpreter, logging, report};
use std::io::Write;

fn main() {
    let config: Config = argh::from_env();
    logging::init(config.log_filter());

    match start(config) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("fsh: {:#}", e);
            std::process::exit(2);
        }
    }
}

fn start(config: Config) -> Result<ExitCode> {
    let mut shell = match &config.directory {
        Some(dir) => {
            let mut fs = OsFs::process();
            let dir = fs
                .canonicalize(dir)
                .with_context(|| format!("can't open start directory {}", dir.display()))?;
            fs.set_current_dir(&dir)
                .with_context(|| format!("can't chdir to {}", dir.display()))?;
            Interpreter::new(fs, Environment::new(dir)?)
        }
        None => Interpreter::from_process().context("can't determine working directory")?,
    };

    if let Some(line) = &config.command {
        return Ok(match shell.run_line(line) {
            Ok(output) => {
                print!("{}", output);
                std::io::stdout().flush()?;
                0
            }
            Err(e) => {
                eprintln!("{}", report(line, &e));
                1
            }
        });
    }

    shell.repl().context("terminal error")?;
    Ok(0)
}
