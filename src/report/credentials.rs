// User accounts: password checks and the account store.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::report::*;

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";

#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn parse(role: &str) -> ReportResult<Role> {
        match role.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            _ => UnknownRoleSnafu { role }.fail(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

/// Checks a username and password. Returns the role of the user, or `None`
/// if the pair is not valid.
pub trait Authenticator {
    fn verify(&self, username: &str, password: &str) -> ReportResult<Option<Role>>;
}

pub fn hash_password(password: &str) -> String {
    sha256::digest(password)
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    username: String,
    #[serde(rename = "passwordHash")]
    password_hash: String,
    role: Role,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
struct UserFile {
    users: Vec<UserRecord>,
}

/// Accounts kept in a JSON file, passwords stored as SHA-256 digests.
///
/// A missing file is created with a single administrator account
/// (`admin` / `admin`).
#[derive(Debug, Clone)]
pub struct JsonUserStore {
    path: PathBuf,
    file: UserFile,
}

impl JsonUserStore {
    pub fn open(path: &Path) -> ReportResult<JsonUserStore> {
        let path_s = path.display().to_string();
        if !path.exists() {
            info!("Creating the user store {} with the default administrator", path_s);
            let store = JsonUserStore {
                path: path.to_path_buf(),
                file: UserFile {
                    users: vec![UserRecord {
                        username: DEFAULT_ADMIN_USERNAME.to_string(),
                        password_hash: hash_password(DEFAULT_ADMIN_PASSWORD),
                        role: Role::Admin,
                    }],
                },
            };
            store.save()?;
            return Ok(store);
        }
        let contents = fs::read_to_string(path).context(CredentialStoreSnafu { path: path_s.as_str() })?;
        let file: UserFile = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
        debug!("Loaded {} accounts from {}", file.users.len(), path_s);
        Ok(JsonUserStore {
            path: path.to_path_buf(),
            file,
        })
    }

    fn save(&self) -> ReportResult<()> {
        let path_s = self.path.display().to_string();
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context(CredentialStoreSnafu { path: path_s.as_str() })?;
        }
        let js = serde_json::to_string_pretty(&self.file).context(ParsingJsonSnafu {})?;
        fs::write(&self.path, js).context(CredentialStoreSnafu { path: path_s.as_str() })
    }

    /// Adds an account and saves the store. Usernames are unique.
    pub fn add_user(&mut self, username: &str, password: &str, role: Role) -> ReportResult<()> {
        let username = username.trim();
        ensure_whatever!(!username.is_empty(), "The username cannot be empty");
        ensure_whatever!(!password.is_empty(), "The password cannot be empty");
        ensure!(
            !self.file.users.iter().any(|u| u.username == username),
            UserExistsSnafu { username }
        );
        self.file.users.push(UserRecord {
            username: username.to_string(),
            password_hash: hash_password(password),
            role,
        });
        self.save()?;
        info!("Added user {:?} with role {}", username, role.as_str());
        Ok(())
    }

    pub fn list_users(&self) -> Vec<(String, Role)> {
        self.file
            .users
            .iter()
            .map(|u| (u.username.clone(), u.role))
            .collect()
    }
}

impl Authenticator for JsonUserStore {
    fn verify(&self, username: &str, password: &str) -> ReportResult<Option<Role>> {
        let digest = hash_password(password);
        Ok(self
            .file
            .users
            .iter()
            .find(|u| u.username == username && u.password_hash == digest)
            .map(|u| u.role))
    }
}

/// Accounts held in memory, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthenticator {
    users: Vec<(String, String, Role)>,
}

impl StaticAuthenticator {
    pub fn single(username: &str, password: &str, role: Role) -> StaticAuthenticator {
        StaticAuthenticator {
            users: vec![(username.to_string(), hash_password(password), role)],
        }
    }
}

impl Authenticator for StaticAuthenticator {
    fn verify(&self, username: &str, password: &str) -> ReportResult<Option<Role>> {
        let digest = hash_password(password);
        Ok(self
            .users
            .iter()
            .find(|(u, h, _)| u == username && *h == digest)
            .map(|(_, _, r)| *r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_digest() {
        assert_eq!(
            hash_password("admin"),
            "8c6976e5b5410415bde908bd4dee15dfb167a9c873fc4bb8a81f6f2ab448a918"
        );
    }

    #[test]
    fn new_store_has_default_admin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        let store = JsonUserStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.list_users(), vec![("admin".to_string(), Role::Admin)]);
        assert_eq!(store.verify("admin", "admin").unwrap(), Some(Role::Admin));
        assert_eq!(store.verify("admin", "Admin").unwrap(), None);
        assert_eq!(store.verify("nobody", "admin").unwrap(), None);
    }

    #[test]
    fn added_users_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        let mut store = JsonUserStore::open(&path).unwrap();
        store.add_user("grader", "s3cret", Role::User).unwrap();
        let err = store.add_user("grader", "other", Role::Admin).unwrap_err();
        assert!(matches!(err, ReportError::UserExists { .. }));
        assert!(store.add_user(" ", "x", Role::User).is_err());

        let reopened = JsonUserStore::open(&path).unwrap();
        assert_eq!(
            reopened.list_users(),
            vec![
                ("admin".to_string(), Role::Admin),
                ("grader".to_string(), Role::User)
            ]
        );
        assert_eq!(reopened.verify("grader", "s3cret").unwrap(), Some(Role::User));
        let contents = fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("s3cret"));
    }

    #[test]
    fn roles() {
        assert_eq!(Role::parse("Admin").unwrap(), Role::Admin);
        assert!(Role::parse("root").is_err());
    }
}
