use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use uawire_conn::Connection;
use uawire_edf::EdfData;

use crate::cmd::WatchArgs;
use crate::exit::{connect_error, CliError, CliResult, FAILURE, SUCCESS};
use crate::output::{print_tree, OutputFormat};

pub fn run(args: WatchArgs, format: OutputFormat) -> CliResult<i32> {
    let conn = Connection::new();
    let (tx, rx) = mpsc::channel();
    // Subscribe before connecting so nothing is missed.
    for kind in &args.kinds {
        let tx = tx.clone();
        conn.subscribe(
            kind.clone(),
            Arc::new(move |tree: EdfData| {
                let _ = tx.send(tree);
            }),
        );
    }

    conn.connect(&args.addr)
        .map_err(|err| connect_error("connect failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(Duration::from_millis(200)) {
            Ok(tree) => {
                print_tree(&tree, format);
                printed = printed.saturating_add(1);
                if let Some(count) = args.count {
                    if printed >= count {
                        break;
                    }
                }
            }
            // Queued announcements drain before a disconnect is reported.
            Err(RecvTimeoutError::Timeout) => {
                if !conn.is_connected() {
                    let (_, message) = conn.status_detail();
                    return Err(CliError::new(FAILURE, message));
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    conn.close();
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
