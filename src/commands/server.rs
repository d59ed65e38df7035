//! Connection and server commands (PING, ECHO, INFO, custom commands)

use super::{arg, to_args, Client};
use crate::cluster::{ClusterValue, Route};
use crate::error::Result;
use crate::protocol::RequestType;
use crate::response::{decode_string, decode_value, Reply, Value};

impl Client {
    /// PING
    pub async fn ping(&self) -> Result<Reply<String>> {
        self.executor
            .execute(RequestType::Ping, Vec::new(), decode_string)
            .await
    }

    /// PING message
    pub async fn ping_with_message(&self, message: impl AsRef<[u8]>) -> Result<Reply<String>> {
        self.executor
            .execute(RequestType::Ping, vec![arg(message)], decode_string)
            .await
    }

    /// PING sent to the nodes selected by `route`
    ///
    /// Fan-out routes give one `"PONG"` per node, keyed by node address.
    pub async fn ping_with_route(&self, route: &Route) -> Result<ClusterValue<String>> {
        self.executor
            .execute_with_route(RequestType::Ping, Vec::new(), route, decode_string)
            .await
    }

    /// ECHO message
    pub async fn echo(&self, message: impl AsRef<[u8]>) -> Result<Reply<String>> {
        self.executor
            .execute(RequestType::Echo, vec![arg(message)], decode_string)
            .await
    }

    /// INFO [section ...]
    pub async fn info<I, B>(&self, sections: I) -> Result<Reply<String>>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        self.executor
            .execute(RequestType::Info, to_args(sections), decode_string)
            .await
    }

    /// INFO [section ...] sent to the nodes selected by `route`
    pub async fn info_with_route<I, B>(&self, sections: I, route: &Route) -> Result<ClusterValue<String>>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        self.executor
            .execute_with_route(RequestType::Info, to_args(sections), route, decode_string)
            .await
    }

    /// Any command, the first argument being its name
    pub async fn custom_command<I, B>(&self, args: I) -> Result<Reply<Value>>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        self.executor
            .execute(RequestType::CustomCommand, to_args(args), decode_value)
            .await
    }

    /// Any command with an optional route
    ///
    /// Without a route the engine picks the node and the answer is a single
    /// node value.
    pub async fn custom_command_with_route<I, B>(&self, args: I, route: Option<&Route>) -> Result<ClusterValue<Value>>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        match route {
            Some(route) => {
                self.executor
                    .execute_with_route(RequestType::CustomCommand, to_args(args), route, decode_value)
                    .await
            }
            None => self
                .custom_command(args)
                .await
                .map(ClusterValue::SingleNode),
        }
    }
}
