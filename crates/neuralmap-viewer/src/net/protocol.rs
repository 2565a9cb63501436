use neuralmap_core::Msg;

#[derive(Debug, Clone)]
pub struct Incoming {
    pub stream: String,
    pub kind: IncomingKind,
}

#[derive(Debug, Clone)]
pub enum IncomingKind {
    Connected,
    Disconnected,
    Message(Msg),
    Error(String),
}

impl Incoming {
    pub fn connected(stream: String) -> Self {
        Self {
            stream,
            kind: IncomingKind::Connected,
        }
    }

    pub fn disconnected(stream: String) -> Self {
        Self {
            stream,
            kind: IncomingKind::Disconnected,
        }
    }

    pub fn message(stream: String, msg: Msg) -> Self {
        Self {
            stream,
            kind: IncomingKind::Message(msg),
        }
    }

    pub fn error(stream: String, msg: String) -> Self {
        Self {
            stream,
            kind: IncomingKind::Error(msg),
        }
    }
}
