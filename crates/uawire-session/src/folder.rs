//! Message folders and the server folder list.

use std::collections::HashMap;

use uawire_conn::Connection;
use uawire_edf::{EdfData, ValueKind};

use crate::error::{Result, SessionError};

/// One message folder on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    pub id: i32,
    pub name: String,
    /// Unread message count for the logged-in user.
    pub unread: i32,
    /// User ids with editor rights on this folder.
    pub editors: Vec<i32>,
}

impl Folder {
    /// Build a folder from a `<folder=[id]>` tree.
    ///
    /// The root must carry an integer id and the children must include a
    /// non-empty string `name`. `unread` defaults to 0, every `editor`
    /// child is collected, and unknown children are ignored.
    pub fn from_tree(tree: &EdfData) -> Result<Self> {
        if !tree.is_named("folder") || tree.kind() != ValueKind::Int {
            return Err(SessionError::WrongEdf(
                "expected <folder=[number]>".to_string(),
            ));
        }
        let id = tree.integer_value()?;

        let mut name = None;
        let mut unread = 0;
        let mut editors = Vec::new();
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
                "unread" => {
                    unread = child.integer_value().map_err(|_| {
                        SessionError::WrongEdf("expected <unread=[number]>".to_string())
                    })?;
                }
                "editor" => {
                    editors.push(child.integer_value().map_err(|_| {
                        SessionError::WrongEdf("expected <editor=[number]>".to_string())
                    })?);
                }
                _ => {}
            }
        }

        let Some(name) = name else {
            return Err(SessionError::WrongEdf(
                "<folder> is missing a required element".to_string(),
            ));
        };

        Ok(Self {
            id,
            name,
            unread,
            editors,
        })
    }
}

/// The server's folder list, keyed by folder name.
pub struct FolderList {
    conn: Connection,
    folders: HashMap<String, Folder>,
}

impl FolderList {
    /// An empty list that refreshes over `conn`.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            folders: HashMap::new(),
        }
    }

    /// Fetch the folder list from the server, replacing the cached one.
    pub fn refresh(&mut self) -> Result<()> {
        let reply = self
            .conn
            .send_and_receive(&EdfData::string("request", "folder_list"))?;

        let mut folders = HashMap::new();
        for tree in reply.children_named("folder") {
            let folder = Folder::from_tree(tree)?;
            folders.insert(folder.name.clone(), folder);
        }
        self.folders = folders;
        Ok(())
    }

    /// Look up a folder by exact name.
    pub fn get(&self, name: &str) -> Option<&Folder> {
        self.folders.get(name)
    }

    /// All cached folders, sorted case-insensitively by name.
    pub fn sorted(&self) -> Vec<&Folder> {
        let mut list: Vec<&Folder> = self.folders.values().collect();
        list.sort_by_key(|folder| folder.name.to_ascii_lowercase());
        list
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testutil::{connected, scripted_server};

    fn parse(wire: &str) -> EdfData {
        wire.parse().unwrap()
    }

    #[test]
    fn parses_full_folder() {
        let tree = parse(r#"<folder=3><name="Private"/><unread=7/><editor=1/><editor=9/></>"#);
        let folder = Folder::from_tree(&tree).unwrap();
        assert_eq!(folder.id, 3);
        assert_eq!(folder.name, "Private");
        assert_eq!(folder.unread, 7);
        assert_eq!(folder.editors, vec![1, 9]);
    }

    #[test]
    fn unread_defaults_to_zero() {
        let tree = parse(r#"<folder=1><name="announce"/></>"#);
        let folder = Folder::from_tree(&tree).unwrap();
        assert_eq!(folder.unread, 0);
        assert!(folder.editors.is_empty());
    }

    #[test]
    fn root_name_is_case_insensitive() {
        let tree = parse(r#"<Folder=1><name="a"/></>"#);
        assert!(Folder::from_tree(&tree).is_ok());
    }

    #[test]
    fn unknown_children_are_ignored() {
        let tree = parse(r#"<folder=1><name="a"/><mystery="x"/></>"#);
        assert!(Folder::from_tree(&tree).is_ok());
    }

    #[test]
    fn rejects_wrong_root() {
        let tree = parse(r#"<user=1><name="a"/></>"#);
        let err = Folder::from_tree(&tree).unwrap_err();
        assert!(matches!(err, SessionError::WrongEdf(_)));
    }

    #[test]
    fn rejects_string_id() {
        let tree = parse(r#"<folder="one"><name="a"/></>"#);
        assert!(matches!(
            Folder::from_tree(&tree),
            Err(SessionError::WrongEdf(_))
        ));
    }

    #[test]
    fn rejects_missing_name() {
        let tree = parse("<folder=1><unread=2/></>");
        let err = Folder::from_tree(&tree).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unexpected EDF: <folder> is missing a required element"
        );
    }

    #[test]
    fn rejects_empty_name() {
        let tree = parse(r#"<folder=1><name=""/></>"#);
        assert!(matches!(
            Folder::from_tree(&tree),
            Err(SessionError::WrongEdf(_))
        ));
    }

    #[test]
    fn rejects_non_integer_unread() {
        let tree = parse(r#"<folder=1><name="a"/><unread="lots"/></>"#);
        assert!(matches!(
            Folder::from_tree(&tree),
            Err(SessionError::WrongEdf(_))
        ));
    }

    #[test]
    fn refresh_builds_sorted_list() {
        let (addr, requests, server) = scripted_server(vec![
            r#"<reply="folder_list"><folder=2><name="Private"/><unread=1/></><folder=1><name="announce"/></></>"#,
        ]);
        let conn = connected(addr);

        let mut list = FolderList::new(conn.clone());
        list.refresh().unwrap();

        let request = requests.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(request.string_value().unwrap(), "folder_list");

        assert_eq!(list.len(), 2);
        let names: Vec<&str> = list.sorted().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["announce", "Private"]);

        assert_eq!(list.get("Private").unwrap().id, 2);
        assert!(list.get("private").is_none());

        conn.close();
        server.join().unwrap();
    }

    #[test]
    fn refresh_replaces_stale_entries() {
        let (addr, _requests, server) = scripted_server(vec![
            r#"<reply="folder_list"><folder=1><name="Old"/></></>"#,
            r#"<reply="folder_list"><folder=2><name="New"/></></>"#,
        ]);
        let conn = connected(addr);

        let mut list = FolderList::new(conn.clone());
        list.refresh().unwrap();
        assert!(list.get("Old").is_some());

        list.refresh().unwrap();
        assert!(list.get("Old").is_none());
        assert_eq!(list.get("New").unwrap().id, 2);

        conn.close();
        server.join().unwrap();
    }
}
