use serde::Serialize;
use uawire_session::Session;

use crate::cmd::BannerArgs;
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct BannerOutput<'a> {
    banner: &'a str,
}

pub fn run(args: BannerArgs, format: OutputFormat) -> CliResult<i32> {
    let mut session = Session::new();
    session
        .connect(&args.addr)
        .map_err(|err| session_error("connect failed", err))?;
    let banner = session
        .banner()
        .map_err(|err| session_error("banner request failed", err))?;
    session.close();

    match format {
        OutputFormat::Json => {
            let out = BannerOutput { banner: &banner };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        _ => println!("{banner}"),
    }
    Ok(SUCCESS)
}
