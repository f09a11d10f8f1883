//! Users and the server user list.

use std::collections::HashMap;

use uawire_conn::Connection;
use uawire_edf::{EdfData, ValueKind};

use crate::error::{Result, SessionError};

/// Access level names, indexed by level.
pub const ACCESS_NAMES: [&str; 6] = ["None", "Guest", "Messages", "Editor", "Witness", "Sysop"];

/// One user account on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub access_level: i32,
}

impl User {
    /// Build a user from a `<user=[id]>` tree.
    ///
    /// The root must carry an integer id and the children must include a
    /// non-empty string `name` and an integer `accesslevel`.
    pub fn from_tree(tree: &EdfData) -> Result<Self> {
        if !tree.is_named("user") || tree.kind() != ValueKind::Int {
            return Err(SessionError::WrongEdf("expected <user=[number]>".to_string()));
        }
        let id = tree.integer_value()?;

        let mut name = None;
        let mut access_level = None;
        for child in tree.children() {
            match child.name() {
                "name" => {
                    let value = child.string_value().map_err(|_| {
                        SessionError::WrongEdf("expected <name=[string]>".to_string())
                    })?;
                    if value.is_empty() {
                        return Err(SessionError::WrongEdf(
                            "expected <name=[string]>".to_string(),
                        ));
                    }
                    name = Some(value.to_string());
                }
                "accesslevel" => {
                    access_level = Some(child.integer_value().map_err(|_| {
                        SessionError::WrongEdf("expected <accesslevel=[number]>".to_string())
                    })?);
                }
                _ => {}
            }
        }

        match (name, access_level) {
            (Some(name), Some(access_level)) => Ok(Self {
                id,
                name,
                access_level,
            }),
            _ => Err(SessionError::WrongEdf(
                "<user> is missing a required element".to_string(),
            )),
        }
    }

    /// Human-readable name for this user's access level, if it is a
    /// level the server defines.
    pub fn access_name(&self) -> Option<&'static str> {
        usize::try_from(self.access_level)
            .ok()
            .and_then(|level| ACCESS_NAMES.get(level).copied())
    }

    /// Look up a single user by name. `None` if the server knows no such
    /// user.
    pub fn fetch(conn: &Connection, name: &str) -> Result<Option<User>> {
        let request = EdfData::string("request", "user_list").with_string("name", name);
        let reply = conn.send_and_receive(&request)?;
        match reply.child("user") {
            Some(tree) => Ok(Some(User::from_tree(tree)?)),
            None => Ok(None),
        }
    }
}

/// The server's user list, keyed by user name.
pub struct UserList {
    conn: Connection,
    users: HashMap<String, User>,
}

impl UserList {
    /// An empty list that refreshes over `conn`.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            users: HashMap::new(),
        }
    }

    /// Fetch the user list from the server, replacing the cached one.
    pub fn refresh(&mut self) -> Result<()> {
        let reply = self
            .conn
            .send_and_receive(&EdfData::string("request", "user_list"))?;

        let mut users = HashMap::new();
        for tree in reply.children_named("user") {
            let user = User::from_tree(tree)?;
            users.insert(user.name.clone(), user);
        }
        self.users = users;
        Ok(())
    }

    /// Look up a user by exact name.
    pub fn get(&self, name: &str) -> Option<&User> {
        self.users.get(name)
    }

    /// All cached users, sorted case-insensitively by name.
    pub fn sorted(&self) -> Vec<&User> {
        let mut list: Vec<&User> = self.users.values().collect();
        list.sort_by_key(|user| user.name.to_ascii_lowercase());
        list
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
