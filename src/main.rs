use std::process;

use structopt::StructOpt;

#[cfg(target_os = "linux")]
mod console;
mod error;
mod paste;
mod probe;
mod push;

/// Inject a command into a victim terminal so its foreground shell runs it.
#[derive(Debug, StructOpt)]
#[structopt(name = "ttystuff")]
struct Opt {
    /// Deliver through the console selection buffer (TIOCLINUX paste)
    /// instead of typing bytes with TIOCSTI
    #[structopt(short = "L")]
    paste: bool,

    /// Command to inject, joined with spaces exactly as typed
    #[structopt(name = "COMMAND", required = true)]
    command: Vec<String>,
}

fn main() {
    env_logger::init();
    let opt = Opt::from_args();
    let result = if opt.paste {
        paste::run(&opt.command)
    } else {
        push::run(&opt.command)
    };
    if let Err(err) = result {
        eprintln!("ttystuff: {}", err);
        process::exit(1);
    }
}
