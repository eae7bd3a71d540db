// Topic layout shared with the emitter bridge firmware

pub const ROOT: &str = "irremote";

pub fn emitter_root(emitter_id: &str) -> String {
    format!("{}/{}", ROOT, emitter_id)
}

pub fn pin_topic(emitter_id: &str) -> String { format!("{}/pin", emitter_root(emitter_id)) }
pub fn raw_topic(emitter_id: &str) -> String { format!("{}/raw", emitter_root(emitter_id)) }
pub fn encoded_topic(emitter_id: &str) -> String { format!("{}/encoded", emitter_root(emitter_id)) }
pub fn status_topic(emitter_id: &str) -> String { format!("{}/status", emitter_root(emitter_id)) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topics_are_scoped_by_emitter() {
        assert_eq!(pin_topic("sala"), "irremote/sala/pin");
        assert_eq!(raw_topic("sala"), "irremote/sala/raw");
        assert_eq!(encoded_topic("sala"), "irremote/sala/encoded");
        assert_eq!(status_topic("sala"), "irremote/sala/status");
    }
}
