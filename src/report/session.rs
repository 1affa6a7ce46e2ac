// The state of one logged-in user.

use crate::report::credentials::{Authenticator, Role};
use crate::report::metadata::ReportMetadata;
use crate::report::report_types::ReportType;
use crate::report::*;

/// A report being generated: what it is about and the responses it uses.
#[derive(PartialEq, Debug, Clone)]
pub struct PendingReport {
    pub report_type: ReportType,
    pub metadata: ReportMetadata,
    pub dataset: Dataset,
}

/// A logged-in user with at most one report in progress.
///
/// Starting a report replaces the one in progress. Sessions are independent
/// of each other.
#[derive(Debug)]
pub struct Session {
    username: String,
    role: Role,
    pending: Option<PendingReport>,
}

impl Session {
    pub fn login(auth: &dyn Authenticator, username: &str, password: &str) -> ReportResult<Session> {
        match auth.verify(username, password)? {
            Some(role) => {
                info!("User {:?} logged in as {}", username, role.as_str());
                Ok(Session {
                    username: username.to_string(),
                    role,
                    pending: None,
                })
            }
            None => {
                warn!("Failed login for {:?}", username);
                InvalidCredentialsSnafu {}.fail()
            }
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn require_admin(&self) -> ReportResult<()> {
        ensure!(
            self.role == Role::Admin,
            NotAuthorizedSnafu {
                username: self.username.as_str()
            }
        );
        Ok(())
    }

    pub fn begin_report(&mut self, report: PendingReport) -> &PendingReport {
        if self.pending.is_some() {
            debug!("Replacing the report in progress of {:?}", self.username);
        }
        self.pending.insert(report)
    }

    pub fn pending_report(&self) -> Option<&PendingReport> {
        self.pending.as_ref()
    }

    pub fn clear_report(&mut self) -> Option<PendingReport> {
        self.pending.take()
    }

    pub fn logout(self) {
        info!("User {:?} logged out", self.username);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::credentials::StaticAuthenticator;

    fn pending(code: &str) -> PendingReport {
        PendingReport {
            report_type: ReportType::Course,
            metadata: ReportMetadata::from_entries(vec![(
                "Course Code".to_string(),
                code.to_string(),
            )]),
            dataset: dataset_from_columns(&[("Timestamp", vec!["t1"])]).unwrap(),
        }
    }

    #[test]
    fn login_checks_password() {
        let auth = StaticAuthenticator::single("amy", "pw", Role::User);
        assert!(matches!(
            Session::login(&auth, "amy", "wrong"),
            Err(ReportError::InvalidCredentials {})
        ));
        let s = Session::login(&auth, "amy", "pw").unwrap();
        assert_eq!(s.username(), "amy");
        assert_eq!(s.role(), Role::User);
        assert!(matches!(
            s.require_admin(),
            Err(ReportError::NotAuthorized { .. })
        ));
    }

    #[test]
    fn report_lifecycle() {
        let auth = StaticAuthenticator::single("root", "pw", Role::Admin);
        let mut s = Session::login(&auth, "root", "pw").unwrap();
        assert!(s.require_admin().is_ok());
        assert!(s.pending_report().is_none());
        s.begin_report(pending("A"));
        s.begin_report(pending("B"));
        assert_eq!(
            s.pending_report().unwrap().metadata.get("Course Code"),
            Some("B")
        );
        let cleared = s.clear_report().unwrap();
        assert_eq!(cleared.report_type, ReportType::Course);
        assert!(s.pending_report().is_none());
        s.logout();
    }
}
