//! Log in to a UA server and print the folder list.
//!
//! Run with:
//!   cargo run --example list-folders -- <host:port> <user> <password>

use std::env;

use uawire::session::{FolderList, Session};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let (Some(addr), Some(user), Some(password)) = (args.next(), args.next(), args.next()) else {
        eprintln!("usage: list-folders <host:port> <user> <password>");
        std::process::exit(64);
    };

    let mut session = Session::new();
    session.connect(&addr)?;
    eprintln!("Connected to {addr}");
    eprintln!("{}", session.banner()?);

    if !session.login(&user, &password)? {
        eprintln!("Login rejected");
        std::process::exit(50);
    }
    eprintln!("Logged in as {user} (userid {})", session.user_id());

    let mut folders = FolderList::new(session.connection().clone());
    folders.refresh()?;
    for folder in folders.sorted() {
        println!("{} ({}): {} unread", folder.name, folder.id, folder.unread);
    }

    session.logout()?;
    session.close();
    Ok(())
}
