//! Login sessions over an EDF connection.

use std::fmt;
use std::net::{IpAddr, ToSocketAddrs};

use tracing::debug;
use uawire_conn::{Connection, ConnectionStatus};
use uawire_edf::EdfData;

use crate::error::{Result, SessionError};

const DEFAULT_CLIENT_NAME: &str = concat!("uawire ", env!("CARGO_PKG_VERSION"));

/// Protocol version reported to servers unless overridden.
pub const DEFAULT_PROTOCOL: &str = "2.6-beta17";

/// Shadow logins are hidden from user listings.
const SHADOW_LOGIN_STATUS: i32 = 256;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    NotConnected,
    ConnectFailed,
    Connected,
    LoggedIn,
    LoggedOut,
    LostConnection,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionStatus::NotConnected => "not connected",
            SessionStatus::ConnectFailed => "connect failed",
            SessionStatus::Connected => "connected",
            SessionStatus::LoggedIn => "logged in",
            SessionStatus::LoggedOut => "logged out",
            SessionStatus::LostConnection => "lost connection",
        })
    }
}

/// Optional login parameters.
#[derive(Debug, Clone, Default)]
pub struct LoginOptions {
    /// Client address to report to the server, for login auditing.
    pub address: Option<IpAddr>,
    /// Log in as a shadow user, hidden from user listings.
    pub shadow: bool,
}

/// A user session on a UA server.
///
/// Wraps a [`Connection`] with the login lifecycle and tracks the reply
/// tree of a successful login for user metadata.
pub struct Session {
    conn: Connection,
    status: SessionStatus,
    client_name: String,
    protocol: String,
    user: Option<EdfData>,
}

impl Session {
    /// A session over a fresh, unconnected [`Connection`].
    pub fn new() -> Self {
        Self::with_connection(Connection::new())
    }

    /// A session over an existing connection, typically shared with
    /// announcement subscribers.
    pub fn with_connection(conn: Connection) -> Self {
        let status = match conn.status() {
            ConnectionStatus::NotConnected => SessionStatus::NotConnected,
            ConnectionStatus::ConnectFailed => SessionStatus::ConnectFailed,
            ConnectionStatus::Connected => SessionStatus::Connected,
            ConnectionStatus::LostConnection => SessionStatus::LostConnection,
        };
        Self {
            conn,
            status,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            protocol: DEFAULT_PROTOCOL.to_string(),
            user: None,
        }
    }

    /// The underlying connection, for subscriptions and domain objects.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Client software name reported at login.
    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn set_client_name(&mut self, name: impl Into<String>) {
        self.client_name = name.into();
    }

    /// Protocol version reported at login.
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn set_protocol(&mut self, protocol: impl Into<String>) {
        self.protocol = protocol.into();
    }

    /// Connect the underlying transport.
    pub fn connect(&mut self, addr: impl ToSocketAddrs) -> Result<()> {
        match self.conn.connect(addr) {
            Ok(()) => {
                self.status = SessionStatus::Connected;
                Ok(())
            }
            Err(err) => {
                self.status = SessionStatus::ConnectFailed;
                Err(SessionError::Connect(err))
            }
        }
    }

    /// Log in with a username and password.
    ///
    /// `Ok(false)` means the server rejected the credentials; errors are
    /// reserved for the connection itself failing.
    pub fn login(&mut self, username: &str, password: &str) -> Result<bool> {
        self.login_with(username, password, LoginOptions::default())
    }

    /// Log in with explicit options.
    pub fn login_with(
        &mut self,
        username: &str,
        password: &str,
        options: LoginOptions,
    ) -> Result<bool> {
        let mut request = EdfData::string("request", "user_login")
            .with_string("name", username)
            .with_string("password", password)
            .with_string("client", self.client_name.as_str())
            .with_string("protocol", self.protocol.as_str());
        if let Some(address) = options.address {
            let host = address.to_string();
            request.add_string("hostname", host.as_str());
            request.add_string("address", host.as_str());
        }
        if options.shadow {
            request.add_integer("status", SHADOW_LOGIN_STATUS);
        }

        let reply = self.request(&request)?;
        if reply.string_value().is_ok_and(|v| v == "user_login") {
            debug!(user = %username, "login accepted");
            self.user = Some(reply);
            self.status = SessionStatus::LoggedIn;
            Ok(true)
        } else {
            debug!(user = %username, "login rejected");
            Ok(false)
        }
    }

    /// Log out of the server.
    pub fn logout(&mut self) -> Result<()> {
        if self.status != SessionStatus::LoggedIn {
            return Err(SessionError::NotLoggedIn);
        }

        self.request(&EdfData::string("request", "user_logout"))?;
        self.status = SessionStatus::LoggedOut;
        self.user = None;
        Ok(())
    }

    /// Fetch the login banner.
    ///
    /// Works before login. A server with no banner configured yields a
    /// placeholder.
    pub fn banner(&mut self) -> Result<String> {
        let reply = self.request(&EdfData::string("request", "system_list"))?;
        let banner = reply
            .child("banner")
            .and_then(|child| child.string_value().ok())
            .unwrap_or("No banner");
        Ok(banner.to_string())
    }

    /// The logged-in user's id, or -1 when not logged in.
    pub fn user_id(&self) -> i32 {
        self.user
            .as_ref()
            .and_then(|user| user.child("userid"))
            .and_then(|child| child.integer_value().ok())
            .unwrap_or(-1)
    }

    /// The reply tree from a successful login, if any.
    pub fn user(&self) -> Option<&EdfData> {
        self.user.as_ref()
    }

    /// Send a request and wait for its reply.
    pub fn send_and_receive(&mut self, tree: &EdfData) -> Result<EdfData> {
        self.request(tree)
    }

    /// Disconnect.
    pub fn close(&mut self) {
        self.conn.close();
        self.status = SessionStatus::NotConnected;
    }

    fn request(&mut self, tree: &EdfData) -> Result<EdfData> {
        match self.conn.send_and_receive(tree) {
            Ok(reply) => Ok(reply),
            Err(err) => {
                // A request can only lose a connection the session had.
                if matches!(
                    self.status,
                    SessionStatus::Connected | SessionStatus::LoggedIn
                ) {
                    self.status = SessionStatus::LostConnection;
                }
                Err(SessionError::NoConnection(err))
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;
    use std::time::Duration;

    use uawire_conn::DisconnectReason;

    use super::*;
    use crate::testutil::{connected, scripted_server};

    const LOGIN_OK: &str = r#"<reply="user_login"><userid=42/></>"#;

    fn connected_session(addr: std::net::SocketAddr) -> Session {
        let mut session = Session::new();
        session.connect(addr).unwrap();
        session
    }

    #[test]
    fn login_success_stores_user() {
        let (addr, requests, server) = scripted_server(vec![LOGIN_OK]);
        let mut session = connected_session(addr);
        assert_eq!(session.status(), SessionStatus::Connected);

        assert!(session.login("brian", "secret").unwrap());
        assert_eq!(session.status(), SessionStatus::LoggedIn);
        assert_eq!(session.user_id(), 42);

        let request = requests.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(request.string_value().unwrap(), "user_login");
        assert_eq!(
            request.child("name").unwrap().string_value().unwrap(),
            "brian"
        );
        assert_eq!(
            request.child("password").unwrap().string_value().unwrap(),
            "secret"
        );
        assert_eq!(
            request.child("client").unwrap().string_value().unwrap(),
            DEFAULT_CLIENT_NAME
        );
        assert_eq!(
            request.child("protocol").unwrap().string_value().unwrap(),
            "2.6-beta17"
        );
        assert!(request.child("hostname").is_none());
        assert!(request.child("status").is_none());

        session.close();
        server.join().unwrap();
    }

    #[test]
    fn login_rejection_returns_false() {
        let (addr, _requests, server) = scripted_server(vec![r#"<reply="user_login_failed"/>"#]);
        let mut session = connected_session(addr);

        assert!(!session.login("brian", "wrong").unwrap());
        assert_eq!(session.status(), SessionStatus::Connected);
        assert_eq!(session.user_id(), -1);
        assert!(session.user().is_none());

        session.close();
        server.join().unwrap();
    }

    #[test]
    fn login_options_extend_request() {
        let (addr, requests, server) = scripted_server(vec![LOGIN_OK]);
        let mut session = connected_session(addr);

        let options = LoginOptions {
            address: Some(IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3))),
            shadow: true,
        };
        assert!(session.login_with("brian", "secret", options).unwrap());

        let request = requests.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(
            request.child("hostname").unwrap().string_value().unwrap(),
            "10.1.2.3"
        );
        assert_eq!(
            request.child("address").unwrap().string_value().unwrap(),
            "10.1.2.3"
        );
        assert_eq!(request.child("status").unwrap().integer_value().unwrap(), 256);

        session.close();
        server.join().unwrap();
    }

    #[test]
    fn custom_client_identity_is_reported() {
        let (addr, requests, server) = scripted_server(vec![LOGIN_OK]);
        let mut session = connected_session(addr);
        session.set_client_name("testclient 1.0");
        session.set_protocol("9.9");

        session.login("brian", "secret").unwrap();

        let request = requests.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(
            request.child("client").unwrap().string_value().unwrap(),
            "testclient 1.0"
        );
        assert_eq!(
            request.child("protocol").unwrap().string_value().unwrap(),
            "9.9"
        );

        session.close();
        server.join().unwrap();
    }

    #[test]
    fn logout_requires_login() {
        let (addr, _requests, server) = scripted_server(vec![]);
        let mut session = connected_session(addr);

        let err = session.logout().unwrap_err();
        assert!(matches!(err, SessionError::NotLoggedIn));

        session.close();
        server.join().unwrap();
    }

    #[test]
    fn logout_completes_session() {
        let (addr, requests, server) =
            scripted_server(vec![LOGIN_OK, r#"<reply="user_logout"/>"#]);
        let mut session = connected_session(addr);

        session.login("brian", "secret").unwrap();
        session.logout().unwrap();
        assert_eq!(session.status(), SessionStatus::LoggedOut);
        assert_eq!(session.user_id(), -1);

        let _login = requests.recv_timeout(Duration::from_secs(2)).unwrap();
        let logout = requests.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(logout.string_value().unwrap(), "user_logout");

        session.close();
        server.join().unwrap();
    }

    #[test]
    fn banner_returns_server_banner() {
        let (addr, requests, server) =
            scripted_server(vec![r#"<reply="system_list"><banner="Welcome to UA"/></>"#]);
        let mut session = connected_session(addr);

        assert_eq!(session.banner().unwrap(), "Welcome to UA");
        let request = requests.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(request.string_value().unwrap(), "system_list");

        session.close();
        server.join().unwrap();
    }

    #[test]
    fn banner_defaults_when_server_has_none() {
        let (addr, _requests, server) = scripted_server(vec![r#"<reply="system_list"/>"#]);
        let mut session = connected_session(addr);

        assert_eq!(session.banner().unwrap(), "No banner");

        session.close();
        server.join().unwrap();
    }

    #[test]
    fn dropped_connection_marks_session_lost() {
        let (addr, _requests, server) = scripted_server(vec![]);
        let mut session = connected_session(addr);

        let err = session.login("brian", "secret").unwrap_err();
        match err {
            SessionError::NoConnection(e) => {
                assert_eq!(e.reason, DisconnectReason::ConnectionLost)
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(session.status(), SessionStatus::LostConnection);
        server.join().unwrap();
    }

    #[test]
    fn session_shares_an_existing_connection() {
        let (addr, _requests, server) = scripted_server(vec![r#"<reply="system_list"/>"#]);
        let conn = connected(addr);

        let mut session = Session::with_connection(conn.clone());
        assert_eq!(session.status(), SessionStatus::Connected);
        assert_eq!(session.banner().unwrap(), "No banner");

        conn.close();
        server.join().unwrap();
    }
}
