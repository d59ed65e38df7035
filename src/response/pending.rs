//! Consumer-group pending-entry records (XPENDING)
//!
//! Records can be built from the positional wire form or from an already
//! typed record. Both go through the same entry points and produce
//! field-identical results, so tests can build expected values directly.

use super::decode::{collect_soft, numeric_integer, text};
use super::Reply;
use crate::error::DecodeError;
use crate::protocol::RawResponse;

/// Number of pending messages owned by one consumer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConsumerPendingMessage {
    pub consumer_name: String,
    pub message_count: i64,
}

impl ConsumerPendingMessage {
    pub fn new(consumer_name: impl Into<String>, message_count: i64) -> Self {
        ConsumerPendingMessage {
            consumer_name: consumer_name.into(),
            message_count,
        }
    }
}

/// Summary form of XPENDING
///
/// A group with nothing pending has a zero count and absent ids and consumers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PendingEntrySummary {
    pub num_of_messages: i64,
    pub start_id: Reply<String>,
    pub end_id: Reply<String>,
    pub consumer_messages: Reply<Vec<ConsumerPendingMessage>>,
}

impl PendingEntrySummary {
    pub fn new(
        num_of_messages: i64,
        start_id: Reply<String>,
        end_id: Reply<String>,
        consumer_messages: Reply<Vec<ConsumerPendingMessage>>,
    ) -> Self {
        PendingEntrySummary {
            num_of_messages,
            start_id,
            end_id,
            consumer_messages,
        }
    }
}

/// One entry of the extended XPENDING form
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PendingEntryDetail {
    pub id: String,
    pub consumer_name: String,
    pub idle_time: i64,
    pub delivery_count: i64,
}

/// Either side of the consumer record input
#[derive(Debug, Clone, PartialEq)]
pub enum ConsumerRecord {
    /// `[consumer_name, count]` as received, the count may be a decimal string
    Raw(RawResponse),
    Typed(ConsumerPendingMessage),
}

impl From<RawResponse> for ConsumerRecord {
    fn from(raw: RawResponse) -> Self {
        ConsumerRecord::Raw(raw)
    }
}

impl From<ConsumerPendingMessage> for ConsumerRecord {
    fn from(typed: ConsumerPendingMessage) -> Self {
        ConsumerRecord::Typed(typed)
    }
}

/// Either side of the detail record input
#[derive(Debug, Clone, PartialEq)]
pub enum DetailRecord {
    /// `[id, consumer_name, idle_time, delivery_count]` as received
    Raw(RawResponse),
    Typed(PendingEntryDetail),
}

impl From<RawResponse> for DetailRecord {
    fn from(raw: RawResponse) -> Self {
        DetailRecord::Raw(raw)
    }
}

impl From<PendingEntryDetail> for DetailRecord {
    fn from(typed: PendingEntryDetail) -> Self {
        DetailRecord::Typed(typed)
    }
}

fn consumer_from_raw(raw: &RawResponse) -> Result<ConsumerPendingMessage, DecodeError> {
    match raw {
        RawResponse::Array(fields) if fields.len() == 2 => Ok(ConsumerPendingMessage {
            consumer_name: text(&fields[0], "consumer name")?,
            message_count: numeric_integer(&fields[1])?,
        }),
        other => Err(DecodeError::shape("consumer record", other.kind_name())),
    }
}

fn detail_from_raw(raw: &RawResponse) -> Result<PendingEntryDetail, DecodeError> {
    match raw {
        RawResponse::Array(fields) if fields.len() == 4 => Ok(PendingEntryDetail {
            id: text(&fields[0], "entry id")?,
            consumer_name: text(&fields[1], "consumer name")?,
            idle_time: numeric_integer(&fields[2])?,
            delivery_count: numeric_integer(&fields[3])?,
        }),
        other => Err(DecodeError::shape("pending entry", other.kind_name())),
    }
}

/// Build the per-consumer counts
///
/// Any malformed record makes the whole list absent.
pub fn consumer_pending_messages<I, R>(records: I) -> Reply<Vec<ConsumerPendingMessage>>
where
    I: IntoIterator<Item = R>,
    R: Into<ConsumerRecord>,
{
    let records: Vec<ConsumerRecord> = records.into_iter().map(Into::into).collect();
    let mut typed = Vec::with_capacity(records.len());
    let mut raw = Vec::new();
    let mut order = Vec::with_capacity(records.len());

    // Typed records pass through; raw records are decoded together so a
    // single failure drops the list.
    for record in records {
        match record {
            ConsumerRecord::Typed(message) => {
                order.push(true);
                typed.push(message);
            }
            ConsumerRecord::Raw(r) => {
                order.push(false);
                raw.push(r);
            }
        }
    }

    let decoded = match collect_soft(raw.iter(), "pending consumers", consumer_from_raw) {
        Some(decoded) => decoded,
        None => return Reply::absent(),
    };

    let mut typed = typed.into_iter();
    let mut decoded = decoded.into_iter();
    let merged = order
        .into_iter()
        .filter_map(|is_typed| if is_typed { typed.next() } else { decoded.next() })
        .collect();
    Reply::present(merged)
}

impl PendingEntryDetail {
    pub fn new(
        id: impl Into<String>,
        consumer_name: impl Into<String>,
        idle_time: i64,
        delivery_count: i64,
    ) -> Self {
        PendingEntryDetail {
            id: id.into(),
            consumer_name: consumer_name.into(),
            idle_time,
            delivery_count,
        }
    }

    /// Build a detail from either a positional wire record or a typed one
    pub fn from_record(record: impl Into<DetailRecord>) -> Result<Self, DecodeError> {
        match record.into() {
            DetailRecord::Typed(detail) => Ok(detail),
            DetailRecord::Raw(raw) => detail_from_raw(&raw),
        }
    }
}

/// Decode the summary form `[count, start_id, end_id, consumers]`
///
/// The count and ids decode independently of the consumer list: a malformed
/// consumer record leaves only `consumer_messages` absent.
pub fn decode_pending_summary(raw: RawResponse) -> Result<Reply<PendingEntrySummary>, DecodeError> {
    let fields = match raw {
        RawResponse::Nil => return Ok(Reply::absent()),
        RawResponse::Array(fields) if fields.len() == 4 => fields,
        other => return Err(DecodeError::shape("pending summary", other.kind_name())),
    };
    let mut fields = fields.into_iter();
    let (count, start, end, consumers) = match (fields.next(), fields.next(), fields.next(), fields.next()) {
        (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
        _ => return Err(DecodeError::shape("pending summary", "short array")),
    };

    let id = |raw: RawResponse| -> Result<Reply<String>, DecodeError> {
        match raw {
            RawResponse::Nil => Ok(Reply::absent()),
            other => text(&other, "entry id").map(Reply::present),
        }
    };

    let consumer_messages = match consumers {
        RawResponse::Nil => Reply::absent(),
        RawResponse::Array(records) => consumer_pending_messages(records),
        other => {
            tracing::warn!("Pending consumers have unexpected shape: {}", other.kind_name());
            Reply::absent()
        }
    };

    Ok(Reply::present(PendingEntrySummary {
        num_of_messages: numeric_integer(&count)?,
        start_id: id(start)?,
        end_id: id(end)?,
        consumer_messages,
    }))
}

/// Decode the extended form, a list of `[id, consumer, idle, deliveries]`
pub fn decode_pending_details(raw: RawResponse) -> Result<Reply<Vec<PendingEntryDetail>>, DecodeError> {
    let entries = match raw {
        RawResponse::Nil => return Ok(Reply::absent()),
        RawResponse::Array(entries) => entries,
        other => return Err(DecodeError::shape("pending entries", other.kind_name())),
    };
    Ok(collect_soft(entries.iter(), "pending entries", detail_from_raw)
        .map(Reply::present)
        .unwrap_or_else(Reply::absent))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consumer(name: &str, count: &str) -> RawResponse {
        RawResponse::bulk_array([name.to_string(), count.to_string()])
    }

    #[test]
    fn test_summary_from_wire() {
        let raw = RawResponse::Array(vec![
            RawResponse::Int(3),
            RawResponse::bulk_string("1-0"),
            RawResponse::bulk_string("3-0"),
            RawResponse::Array(vec![consumer("alice", "2"), consumer("bob", "1")]),
        ]);
        let summary = decode_pending_summary(raw).unwrap().into_value();

        let expected = PendingEntrySummary::new(
            3,
            Reply::from("1-0"),
            Reply::from("3-0"),
            consumer_pending_messages(vec![
                ConsumerPendingMessage::new("alice", 2),
                ConsumerPendingMessage::new("bob", 1),
            ]),
        );
        assert_eq!(summary, expected);
    }

    #[test]
    fn test_malformed_consumer_only_drops_consumers() {
        let raw = RawResponse::Array(vec![
            RawResponse::Int(3),
            RawResponse::bulk_string("1-0"),
            RawResponse::bulk_string("3-0"),
            RawResponse::Array(vec![consumer("alice", "2"), consumer("bob", "many")]),
        ]);
        let summary = decode_pending_summary(raw).unwrap().into_value();

        assert_eq!(summary.num_of_messages, 3);
        assert_eq!(summary.start_id, Reply::from("1-0"));
        assert_eq!(summary.end_id, Reply::from("3-0"));
        assert!(summary.consumer_messages.is_absent());
        assert!(summary.consumer_messages.value().is_empty());
    }

    #[test]
    fn test_empty_group_summary() {
        let raw = RawResponse::Array(vec![
            RawResponse::Int(0),
            RawResponse::Nil,
            RawResponse::Nil,
            RawResponse::Nil,
        ]);
        let summary = decode_pending_summary(raw).unwrap().into_value();
        assert_eq!(summary, PendingEntrySummary::default());
    }

    #[test]
    fn test_summary_rejects_wrong_shape() {
        assert!(decode_pending_summary(RawResponse::Int(1)).is_err());
        assert!(decode_pending_summary(RawResponse::Array(vec![RawResponse::Int(1)])).is_err());
    }

    #[test]
    fn test_mixed_consumer_records_keep_order() {
        let messages = consumer_pending_messages(vec![
            ConsumerRecord::from(consumer("alice", "2")),
            ConsumerRecord::from(ConsumerPendingMessage::new("bob", 5)),
            ConsumerRecord::from(RawResponse::Array(vec![
                RawResponse::bulk_string("carol"),
                RawResponse::Int(1),
            ])),
        ]);
        assert_eq!(
            messages.into_value(),
            vec![
                ConsumerPendingMessage::new("alice", 2),
                ConsumerPendingMessage::new("bob", 5),
                ConsumerPendingMessage::new("carol", 1),
            ]
        );
    }

    #[test]
    fn test_detail_from_wire_matches_typed() {
        let raw = RawResponse::Array(vec![
            RawResponse::bulk_string("1526984818136-0"),
            RawResponse::bulk_string("consumer-123"),
            RawResponse::Int(196415),
            RawResponse::Int(1),
        ]);
        let typed = PendingEntryDetail::new("1526984818136-0", "consumer-123", 196415, 1);

        let from_wire = PendingEntryDetail::from_record(raw).unwrap();
        let from_typed = PendingEntryDetail::from_record(typed.clone()).unwrap();
        assert_eq!(from_wire, from_typed);
        assert_eq!(from_wire, typed);
    }

    #[test]
    fn test_detail_list_fail_soft() {
        let good = RawResponse::Array(vec![
            RawResponse::bulk_string("1-0"),
            RawResponse::bulk_string("alice"),
            RawResponse::Int(10),
            RawResponse::Int(1),
        ]);
        let decoded = decode_pending_details(RawResponse::Array(vec![good.clone()])).unwrap();
        assert_eq!(decoded.value().len(), 1);

        let bad = RawResponse::bulk_array(["1-0"]);
        let decoded = decode_pending_details(RawResponse::Array(vec![good, bad])).unwrap();
        assert!(decoded.is_absent());
    }
}
