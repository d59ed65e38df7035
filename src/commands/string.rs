//! String commands (SET, GET)

use super::{arg, Client};
use crate::error::Result;
use crate::protocol::RequestType;
use crate::response::{decode_ok, decode_string, Reply};

impl Client {
    /// SET key value
    ///
    /// Returns `"OK"` on success.
    pub async fn set(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<Reply<String>> {
        self.executor
            .execute(RequestType::Set, vec![arg(key), arg(value)], decode_ok)
            .await
    }

    /// GET key
    ///
    /// A missing key is an absent reply, not an error.
    pub async fn get(&self, key: impl AsRef<[u8]>) -> Result<Reply<String>> {
        self.executor
            .execute(RequestType::Get, vec![arg(key)], decode_string)
            .await
    }
}
