use std::{env, path::PathBuf, process};

use quote_wizard::{
    cli::{run_cli, CliOptions},
    init,
};

fn main() {
    init();

    let options = match parse_args(env::args().skip(1)) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}");
            print_usage();
            process::exit(2);
        }
    };

    if let Err(err) = run_cli(options) {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| "--config requires a path".to_string())?;
                options.config_path = Some(PathBuf::from(path));
            }
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            other => return Err(format!("unexpected argument `{other}`")),
        }
    }
    Ok(options)
}

fn print_usage() {
    eprintln!(
        "Usage: quote_wizard [--config <file.json>]\n\
         Set QUOTE_WIZARD_CLI_SCRIPT=1 to read commands from stdin."
    );
}
