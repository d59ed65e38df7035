//! Sorted set commands (ZADD, ZSCORE, ZPOPMIN, BZPOPMIN)

use super::{arg, to_args, Client};
use crate::error::Result;
use crate::protocol::RequestType;
use crate::response::{decode_float, decode_int, decode_key_with_member_and_score, decode_member_scores, KeyWithMemberAndScore, Reply};
use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;

impl Client {
    /// ZADD key score member [score member ...]
    ///
    /// Returns the number of new members.
    pub async fn zadd<I, M>(&self, key: impl AsRef<[u8]>, members: I) -> Result<Reply<i64>>
    where
        I: IntoIterator<Item = (M, f64)>,
        M: AsRef<[u8]>,
    {
        let mut args = vec![arg(key)];
        for (member, score) in members {
            args.push(Bytes::from(score.to_string()));
            args.push(arg(member));
        }
        self.executor.execute(RequestType::ZAdd, args, decode_int).await
    }

    /// ZSCORE key member
    ///
    /// Absent when the key or the member does not exist.
    pub async fn zscore(&self, key: impl AsRef<[u8]>, member: impl AsRef<[u8]>) -> Result<Reply<f64>> {
        self.executor
            .execute(RequestType::ZScore, vec![arg(key), arg(member)], decode_float)
            .await
    }

    /// ZPOPMIN key
    pub async fn zpopmin(&self, key: impl AsRef<[u8]>) -> Result<Reply<HashMap<String, f64>>> {
        self.executor
            .execute(RequestType::ZPopMin, vec![arg(key)], decode_member_scores)
            .await
    }

    /// ZPOPMIN key count
    pub async fn zpopmin_count(&self, key: impl AsRef<[u8]>, count: u64) -> Result<Reply<HashMap<String, f64>>> {
        self.executor
            .execute(
                RequestType::ZPopMin,
                vec![arg(key), Bytes::from(count.to_string())],
                decode_member_scores,
            )
            .await
    }

    /// BZPOPMIN key [key ...] timeout
    ///
    /// Absent when `timeout` elapsed with every set empty. The keys must
    /// share a slot in cluster mode.
    pub async fn bzpopmin<I, B>(&self, keys: I, timeout: Duration) -> Result<Reply<KeyWithMemberAndScore>>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut args = to_args(keys);
        self.ensure_same_slot(&args)?;
        args.push(Bytes::from(timeout.as_secs_f64().to_string()));
        self.executor
            .execute(RequestType::BZPopMin, args, decode_key_with_member_and_score)
            .await
    }
}

#[cfg(test)]
mod tests {
    use crate::cluster::ClusterTopology;
    use crate::commands::testing::fake_client;
    use crate::response::KeyWithMemberAndScore;
    use std::collections::HashMap;
    use std::time::Duration;

    #[tokio::test]
    async fn test_zadd_and_zscore() {
        let client = fake_client(ClusterTopology::default());

        let added = client.zadd("zset", [("one", 1.0), ("two", 2.5)]).await.unwrap();
        assert_eq!(*added.value(), 2);

        assert_eq!(*client.zscore("zset", "two").await.unwrap().value(), 2.5);

        let missing = client.zscore("zset", "nobody").await.unwrap();
        assert!(missing.is_absent());
        assert_eq!(*missing.value(), 0.0);
    }

    #[tokio::test]
    async fn test_zpopmin() {
        let client = fake_client(ClusterTopology::default());
        client.zadd("zset", [("a", 1.0), ("b", 2.0), ("c", 3.0)]).await.unwrap();

        let popped = client.zpopmin("zset").await.unwrap();
        assert_eq!(popped.value(), &HashMap::from([("a".to_string(), 1.0)]));

        let popped = client.zpopmin_count("zset", 5).await.unwrap();
        assert_eq!(
            popped.value(),
            &HashMap::from([("b".to_string(), 2.0), ("c".to_string(), 3.0)])
        );

        assert!(client.zpopmin("zset").await.unwrap().value().is_empty());
    }

    #[tokio::test]
    async fn test_bzpopmin() {
        let client = fake_client(ClusterTopology::default());
        client.zadd("{z}2", [("m", 4.0)]).await.unwrap();

        let popped = client.bzpopmin(["{z}1", "{z}2"], Duration::from_millis(100)).await.unwrap();
        assert_eq!(popped.value(), &KeyWithMemberAndScore::new("{z}2", "m", 4.0));

        let empty = client.bzpopmin(["{z}1", "{z}2"], Duration::from_millis(100)).await.unwrap();
        assert!(empty.is_absent());
    }
}
