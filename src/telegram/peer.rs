use grammers_tl_types as tl;

/// Offset added to channel ids before negating them
const CHANNEL_MARK: i64 = 1_000_000_000_000;

/// Bare peer id tagged with its kind
///
/// The HTTP API speaks "marked" ids only: users keep their id, basic groups
/// are negated and channels/supergroups become `-(10^12 + id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerRef {
    User(i64),
    Chat(i64),
    Channel(i64),
}

impl PeerRef {
    pub fn from_marked(id: i64) -> Self {
        if id >= 0 {
            Self::User(id)
        } else if id < -CHANNEL_MARK {
            Self::Channel(-id - CHANNEL_MARK)
        } else {
            Self::Chat(-id)
        }
    }

    pub fn marked(self) -> i64 {
        match self {
            Self::User(id) => id,
            Self::Chat(id) => -id,
            Self::Channel(id) => -(CHANNEL_MARK + id),
        }
    }

    pub fn from_peer(peer: &tl::enums::Peer) -> Self {
        match peer {
            tl::enums::Peer::User(p) => Self::User(p.user_id),
            tl::enums::Peer::Chat(p) => Self::Chat(p.chat_id),
            tl::enums::Peer::Channel(p) => Self::Channel(p.channel_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marking() {
        assert_eq!(PeerRef::User(12345).marked(), 12345);
        assert_eq!(PeerRef::Chat(777).marked(), -777);
        assert_eq!(PeerRef::Channel(1234567890).marked(), -1001234567890);
    }

    #[test]
    fn test_unmarking() {
        assert_eq!(PeerRef::from_marked(12345), PeerRef::User(12345));
        assert_eq!(PeerRef::from_marked(-777), PeerRef::Chat(777));
        assert_eq!(PeerRef::from_marked(-1001234567890), PeerRef::Channel(1234567890));
        assert_eq!(PeerRef::from_marked(0), PeerRef::User(0));
    }

    #[test]
    fn test_from_peer() {
        let peer = tl::enums::Peer::Channel(tl::types::PeerChannel { channel_id: 99 });
        assert_eq!(PeerRef::from_peer(&peer).marked(), -1000000000099);

        let peer = tl::enums::Peer::User(tl::types::PeerUser { user_id: 5 });
        assert_eq!(PeerRef::from_peer(&peer), PeerRef::User(5));
    }
}
