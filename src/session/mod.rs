use tracing::{info, warn};

use crate::client::ApiClient;
use crate::model::CurrentUser;

/// Who is signed in. Fetched once at startup and passed down explicitly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Session {
    /// `/me` has not been asked yet.
    #[default]
    NotLoaded,
    Anonymous,
    Authenticated(CurrentUser),
}

impl Session {
    pub fn user(&self) -> Option<&CurrentUser> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::NotLoaded | Self::Anonymous => None,
        }
    }
}

/// Never fails: any problem reaching `/me` reads as "nobody signed in".
pub async fn fetch_session(client: &ApiClient) -> Session {
    match client.current_user().await {
        Ok(Some(user)) => {
            info!(id = user.id, role = %user.role, "session loaded");
            Session::Authenticated(user)
        }
        Ok(None) => Session::Anonymous,
        Err(err) => {
            warn!(error = %err, "could not load session");
            Session::Anonymous
        }
    }
}
