//! Set commands (SADD, SREM, SMEMBERS, SCARD, SINTER, ...)
//!
//! Commands taking several keys require all of them to hash to one slot
//! when the client talks to a cluster. A violation fails before anything is
//! sent.

use super::{arg, to_args, Client};
use crate::error::Result;
use crate::protocol::RequestType;
use crate::response::{
    decode_bool, decode_bool_array, decode_int, decode_string, decode_string_array, decode_string_set, Reply,
};
use bytes::Bytes;
use std::collections::HashSet;

impl Client {
    /// SADD key member [member ...]
    ///
    /// Returns the number of members that were not already in the set.
    pub async fn sadd<I, B>(&self, key: impl AsRef<[u8]>, members: I) -> Result<Reply<i64>>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut args = vec![arg(key)];
        args.extend(to_args(members));
        self.executor.execute(RequestType::SAdd, args, decode_int).await
    }

    /// SREM key member [member ...]
    pub async fn srem<I, B>(&self, key: impl AsRef<[u8]>, members: I) -> Result<Reply<i64>>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut args = vec![arg(key)];
        args.extend(to_args(members));
        self.executor.execute(RequestType::SRem, args, decode_int).await
    }

    /// SMEMBERS key
    ///
    /// A missing key gives an empty set.
    pub async fn smembers(&self, key: impl AsRef<[u8]>) -> Result<Reply<HashSet<Reply<String>>>> {
        self.executor
            .execute(RequestType::SMembers, vec![arg(key)], decode_string_set)
            .await
    }

    /// SCARD key
    pub async fn scard(&self, key: impl AsRef<[u8]>) -> Result<Reply<i64>> {
        self.executor
            .execute(RequestType::SCard, vec![arg(key)], decode_int)
            .await
    }

    /// SISMEMBER key member
    pub async fn sismember(&self, key: impl AsRef<[u8]>, member: impl AsRef<[u8]>) -> Result<Reply<bool>> {
        self.executor
            .execute(RequestType::SIsMember, vec![arg(key), arg(member)], decode_bool)
            .await
    }

    /// SMISMEMBER key member [member ...]
    ///
    /// One entry per member, in request order.
    pub async fn smismember<I, B>(&self, key: impl AsRef<[u8]>, members: I) -> Result<Reply<Vec<Reply<bool>>>>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut args = vec![arg(key)];
        args.extend(to_args(members));
        self.executor
            .execute(RequestType::SMIsMember, args, decode_bool_array)
            .await
    }

    /// SINTER key [key ...]
    pub async fn sinter<I, B>(&self, keys: I) -> Result<Reply<HashSet<Reply<String>>>>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let keys = to_args(keys);
        self.ensure_same_slot(&keys)?;
        self.executor
            .execute(RequestType::SInter, keys, decode_string_set)
            .await
    }

    /// SINTERCARD numkeys key [key ...]
    pub async fn sintercard<I, B>(&self, keys: I) -> Result<Reply<i64>>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let keys = to_args(keys);
        self.ensure_same_slot(&keys)?;
        let mut args = vec![Bytes::from(keys.len().to_string())];
        args.extend(keys);
        self.executor
            .execute(RequestType::SInterCard, args, decode_int)
            .await
    }

    /// SINTERCARD numkeys key [key ...] LIMIT limit
    ///
    /// Counting stops at `limit`; 0 means unlimited.
    pub async fn sintercard_limit<I, B>(&self, keys: I, limit: u64) -> Result<Reply<i64>>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let keys = to_args(keys);
        self.ensure_same_slot(&keys)?;
        let mut args = vec![Bytes::from(keys.len().to_string())];
        args.extend(keys);
        args.push(Bytes::from_static(b"LIMIT"));
        args.push(Bytes::from(limit.to_string()));
        self.executor
            .execute(RequestType::SInterCard, args, decode_int)
            .await
    }

    /// SPOP key
    ///
    /// Absent when the set is empty or missing.
    pub async fn spop(&self, key: impl AsRef<[u8]>) -> Result<Reply<String>> {
        self.executor
            .execute(RequestType::SPop, vec![arg(key)], decode_string)
            .await
    }

    /// SPOP key count
    pub async fn spop_count(&self, key: impl AsRef<[u8]>, count: u64) -> Result<Reply<HashSet<Reply<String>>>> {
        self.executor
            .execute(
                RequestType::SPop,
                vec![arg(key), Bytes::from(count.to_string())],
                decode_string_set,
            )
            .await
    }

    /// SRANDMEMBER key
    pub async fn srandmember(&self, key: impl AsRef<[u8]>) -> Result<Reply<String>> {
        self.executor
            .execute(RequestType::SRandMember, vec![arg(key)], decode_string)
            .await
    }

    /// SRANDMEMBER key count
    ///
    /// A negative `count` allows repeated members, hence a sequence.
    pub async fn srandmember_count(&self, key: impl AsRef<[u8]>, count: i64) -> Result<Reply<Vec<Reply<String>>>> {
        self.executor
            .execute(
                RequestType::SRandMember,
                vec![arg(key), Bytes::from(count.to_string())],
                decode_string_array,
            )
            .await
    }

    /// SMOVE source destination member
    pub async fn smove(
        &self,
        source: impl AsRef<[u8]>,
        destination: impl AsRef<[u8]>,
        member: impl AsRef<[u8]>,
    ) -> Result<Reply<bool>> {
        let keys = vec![arg(source), arg(destination)];
        self.ensure_same_slot(&keys)?;
        let mut args = keys;
        args.push(arg(member));
        self.executor.execute(RequestType::SMove, args, decode_bool).await
    }
}
