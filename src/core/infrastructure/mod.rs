pub(crate) mod api_client;
pub(crate) mod rpc;
pub(crate) mod token_cache;
