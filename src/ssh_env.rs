use std::env;

const GIT_PROTOCOL_ENV: &str = "GIT_PROTOCOL";
const SSH_CONNECTION_ENV: &str = "SSH_CONNECTION";
const SSH_ORIGINAL_COMMAND_ENV: &str = "SSH_ORIGINAL_COMMAND";

/// Connection details exposed by the SSH daemon to the spawned process.
///
/// Forwarded to the Wharf internal API so it can attribute requests to
/// the originating session.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SshEnv {
    /// Value of `GIT_PROTOCOL`, empty when unset.
    pub git_protocol_version: String,
    /// Whether the process was spawned by an SSH connection.
    pub is_ssh_connection: bool,
    /// Value of `SSH_ORIGINAL_COMMAND`, empty when unset.
    pub original_command: String,
    /// Client address taken from `SSH_CONNECTION`.
    pub remote_addr: String,
}

impl SshEnv {
    /// Reads the SSH connection details from the process environment.
    pub fn from_env() -> Self {
        Self::from_parts(
            env::var(SSH_CONNECTION_ENV).unwrap_or_default(),
            env::var(GIT_PROTOCOL_ENV).unwrap_or_default(),
            env::var(SSH_ORIGINAL_COMMAND_ENV).unwrap_or_default(),
        )
    }

    fn from_parts(
        ssh_connection: String,
        git_protocol_version: String,
        original_command: String,
    ) -> Self {
        Self {
            git_protocol_version,
            is_ssh_connection: !ssh_connection.is_empty(),
            original_command,
            remote_addr: remote_addr_from(&ssh_connection),
        }
    }
}

/// First field of `SSH_CONNECTION`, the client address.
fn remote_addr_from(ssh_connection: &str) -> String {
    ssh_connection
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_owned()
}
