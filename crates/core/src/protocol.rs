use serde::Serialize;

// Protocol names accepted in "protocolo". Matching is exact and case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Nec,
    Nec1,
    Nec2,
    Rc5,
    Rc6,
    Panasonic,
}

/// Backend call a protocol is transmitted with. The whole NEC family shares one.
/// Serializes with its wire name for the emitter bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProtocolFamily {
    #[serde(rename = "NEC")]
    Nec,
    #[serde(rename = "RC5")]
    Rc5,
    #[serde(rename = "RC6")]
    Rc6,
    Panasonic,
}

/// Selector value for raw transmissions; never a named protocol.
pub const RAW_SELECTOR: &str = "raw";

const PROTOCOL_TABLE: [(&str, Protocol); 6] = [
    ("NEC", Protocol::Nec),
    ("NEC1", Protocol::Nec1),
    ("NEC2", Protocol::Nec2),
    ("RC5", Protocol::Rc5),
    ("RC6", Protocol::Rc6),
    ("Panasonic", Protocol::Panasonic),
];

impl Protocol {
    pub fn from_name(name: &str) -> Option<Self> {
        PROTOCOL_TABLE
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, p)| *p)
    }

    pub fn name(self) -> &'static str {
        match self {
            Protocol::Nec => "NEC",
            Protocol::Nec1 => "NEC1",
            Protocol::Nec2 => "NEC2",
            Protocol::Rc5 => "RC5",
            Protocol::Rc6 => "RC6",
            Protocol::Panasonic => "Panasonic",
        }
    }

    pub fn family(self) -> ProtocolFamily {
        match self {
            Protocol::Nec | Protocol::Nec1 | Protocol::Nec2 => ProtocolFamily::Nec,
            Protocol::Rc5 => ProtocolFamily::Rc5,
            Protocol::Rc6 => ProtocolFamily::Rc6,
            Protocol::Panasonic => ProtocolFamily::Panasonic,
        }
    }
}

impl ProtocolFamily {
    pub fn name(self) -> &'static str {
        match self {
            ProtocolFamily::Nec => "NEC",
            ProtocolFamily::Rc5 => "RC5",
            ProtocolFamily::Rc6 => "RC6",
            ProtocolFamily::Panasonic => "Panasonic",
        }
    }

    // RC5/RC6 always send with the toggle bit enabled; the others have no toggle.
    pub fn toggle(self) -> Option<bool> {
        match self {
            ProtocolFamily::Rc5 | ProtocolFamily::Rc6 => Some(true),
            ProtocolFamily::Nec | ProtocolFamily::Panasonic => None,
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::fmt::Display for ProtocolFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
