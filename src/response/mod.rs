//! Typed replies and the decoders that produce them

mod reply;
mod value;
mod decode;
mod pending;

pub use reply::Reply;
pub use value::Value;
pub use decode::{
    decode_bool, decode_bool_array, decode_bytes, decode_float, decode_int,
    decode_key_with_member_and_score, decode_member_scores, decode_ok, decode_string,
    decode_string_array, decode_string_map, decode_string_set, decode_value,
    KeyWithMemberAndScore,
};
pub use pending::{
    consumer_pending_messages, decode_pending_details, decode_pending_summary,
    ConsumerPendingMessage, ConsumerRecord, DetailRecord, PendingEntryDetail,
    PendingEntrySummary,
};
