//! JSON messages exchanged with the chunk streaming server.
//!
//! Every server message is wrapped as `{"dataoutput": {...}}`. A payload with
//! a non-null `endmessage` field ends the stream; anything else is a batch.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{region::ChunkPos, selection::Batch};

#[derive(Clone, Debug, PartialEq)]
pub enum StreamMessage {
    Batch(Batch),
    End,
}

#[derive(Deserialize)]
struct Envelope {
    dataoutput: Value,
}

impl StreamMessage {
    pub fn from_json(text: &str) -> serde_json::Result<StreamMessage> {
        let Envelope { dataoutput } = serde_json::from_str(text)?;
        let ended = dataoutput
            .get("endmessage")
            .is_some_and(|marker| !marker.is_null());
        if ended {
            return Ok(StreamMessage::End);
        }
        Batch::deserialize(dataoutput).map(StreamMessage::Batch)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let payload = match self {
            StreamMessage::Batch(batch) => serde_json::to_value(batch)?,
            StreamMessage::End => json!({ "endmessage": true }),
        };
        serde_json::to_string(&json!({ "dataoutput": payload }))
    }
}

/// Request sent once the connection opens.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChunkRequest {
    event: &'static str,
    datainput: RequestedChunk,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
struct RequestedChunk {
    chunkx: i32,
    chunkz: i32,
}

impl ChunkRequest {
    /// The server currently streams its own choice of chunks and ignores the
    /// position.
    pub fn new(pos: ChunkPos) -> ChunkRequest {
        ChunkRequest {
            event: "chunk",
            datainput: RequestedChunk {
                chunkx: pos.x,
                chunkz: pos.z,
            },
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
