use std::fs;
use std::time::Duration;

use uawire_conn::{ConnConfig, Connection};
use uawire_edf::EdfData;

use crate::cmd::SendArgs;
use crate::exit::{
    connect_error, io_error, no_connection_error, send_error, CliError, CliResult, DATA_INVALID,
    SUCCESS, USAGE,
};
use crate::output::{print_tree, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let tree = resolve_request(&args)?;
    let reply_timeout = parse_duration(&args.reply_timeout)?;

    let config = ConnConfig {
        reply_timeout,
        ..ConnConfig::default()
    };
    let conn = Connection::with_config(config);
    conn.connect(&args.addr)
        .map_err(|err| connect_error("connect failed", err))?;

    if args.wait {
        let reply = conn
            .send_and_receive(&tree)
            .map_err(|err| no_connection_error("request failed", err))?;
        print_tree(&reply, format);
    } else {
        conn.send(&tree).map_err(|err| send_error("send failed", err))?;
    }

    conn.close();
    Ok(SUCCESS)
}

fn resolve_request(args: &SendArgs) -> CliResult<EdfData> {
    let text = if let Some(edf) = &args.edf {
        edf.clone()
    } else if let Some(path) = &args.file {
        fs::read_to_string(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?
    } else {
        return Err(CliError::new(USAGE, "one of --edf or --file is required"));
    };

    text.trim()
        .parse()
        .map_err(|err| CliError::new(DATA_INVALID, format!("invalid EDF request: {err}")))
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}
