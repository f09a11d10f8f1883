use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use uawire_session::{Folder, FolderList, Session};

use crate::cmd::FoldersArgs;
use crate::exit::{session_error, CliError, CliResult, AUTH_FAILED, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct FolderRow<'a> {
    id: i32,
    name: &'a str,
    unread: i32,
    editors: &'a [i32],
}

pub fn run(args: FoldersArgs, format: OutputFormat) -> CliResult<i32> {
    let mut session = Session::new();
    session
        .connect(&args.addr)
        .map_err(|err| session_error("connect failed", err))?;

    let accepted = session
        .login(&args.user, &args.password)
        .map_err(|err| session_error("login failed", err))?;
    if !accepted {
        return Err(CliError::new(AUTH_FAILED, "login rejected by server"));
    }

    let mut folders = FolderList::new(session.connection().clone());
    folders
        .refresh()
        .map_err(|err| session_error("folder list request failed", err))?;
    print_folders(&folders.sorted(), format);

    let _ = session.logout();
    session.close();
    Ok(SUCCESS)
}

fn print_folders(folders: &[&Folder], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let rows: Vec<FolderRow> = folders
                .iter()
                .map(|folder| FolderRow {
                    id: folder.id,
                    name: &folder.name,
                    unread: folder.unread,
                    editors: &folder.editors,
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string(&rows).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "NAME", "UNREAD", "EDITORS"]);
            for folder in folders {
                let editors = folder
                    .editors
                    .iter()
                    .map(i32::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                table.add_row(vec![
                    folder.id.to_string(),
                    folder.name.clone(),
                    folder.unread.to_string(),
                    editors,
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for folder in folders {
                println!("{} ({}): {} unread", folder.name, folder.id, folder.unread);
            }
        }
        OutputFormat::Compact => {
            for folder in folders {
                println!("{}", folder.name);
            }
        }
    }
}
