pub(crate) mod server_target;
pub(crate) mod session_state;
