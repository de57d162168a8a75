/// Authentication state of a session, as seen from this process.
///
/// A session starts `Authenticated` only if the server confirmed a cached
/// token at construction, and moves there otherwise through an explicit login.
/// Nothing moves it back: a token revoked server-side is only noticed by the
/// next call that fails with `AuthRejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated)
    }
}
