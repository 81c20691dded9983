use serde::{Deserialize, Serialize};

pub mod metrics;

/// A raw gateway event as put on the queue by the gateway.
#[derive(Serialize, Deserialize, Debug)]
pub struct DiscordEvent {
    pub meta: DiscordEventMeta,
    pub payload: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DiscordEventMeta {
    pub uuid: uuid::Uuid, // used for tracing
    pub shard: u32,
}

impl DiscordEvent {
    pub fn new(shard: u32, payload: String) -> Self {
        Self {
            meta: DiscordEventMeta {
                uuid: uuid::Uuid::now_v7(),
                shard,
            },
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discord_event_from_queue_test() {
        let event = DiscordEvent::new(3, r#"{"op":0}"#.into());
        let json = serde_json::to_string(&event).unwrap();

        let parsed: DiscordEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.meta.shard, 3);
        assert_eq!(parsed.meta.uuid, event.meta.uuid);
        assert_eq!(parsed.payload, r#"{"op":0}"#);
    }
}
