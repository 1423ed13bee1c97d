//! Packet families, actions and class identifiers.
//!
//! Byte 0 of every packet is the action code and byte 1 the family code.
//! Both tables are bijections: each declared byte has exactly one name and
//! each name exactly one byte. Undeclared bytes have no name.

use std::fmt;

macro_rules! byte_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident = $byte:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum $name {
            $($variant = $byte),+
        }

        impl $name {
            /// Every declared value, in byte order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Look up the value for a wire byte.
            pub fn from_byte(byte: u8) -> Option<Self> {
                match byte {
                    $($byte => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Look up the value for a symbolic name (exact match).
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $(stringify!($variant) => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// The wire byte.
            pub fn to_byte(self) -> u8 {
                self as u8
            }

            /// The symbolic name.
            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant),)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

byte_enum! {
    /// High-level packet category.
    #[allow(clippy::upper_case_acronyms)]
    pub enum PacketFamily {
        Connection = 1,
        Account = 2,
        Character = 3,
        Login = 4,
        Welcome = 5,
        Walk = 6,
        Face = 7,
        Chair = 8,
        Emote = 9,
        Attack = 11,
        Spell = 12,
        Shop = 13,
        Item = 14,
        StatSkill = 16,
        Global = 17,
        Talk = 18,
        Warp = 19,
        Jukebox = 21,
        Players = 22,
        Avatar = 23,
        Party = 24,
        Refresh = 25,
        NPC = 26,
        PlayerRange = 27,
        NPCRange = 28,
        Range = 29,
        Paperdoll = 30,
        Effect = 31,
        Trade = 32,
        Chest = 33,
        Door = 34,
        Message = 35,
        Bank = 36,
        Locker = 37,
        Barber = 38,
        Guild = 39,
        Music = 40,
        Sit = 41,
        Recover = 42,
        Board = 43,
        Cast = 44,
        Arena = 45,
        Priest = 46,
        Marriage = 47,
        AdminInteract = 48,
        Citizen = 49,
        Quest = 50,
        Book = 51,
        Init = 255,
    }
}

byte_enum! {
    /// Operation within a family.
    pub enum PacketAction {
        Request = 1,
        Accept = 2,
        Reply = 3,
        Remove = 4,
        Agree = 5,
        Create = 6,
        Add = 7,
        Player = 8,
        Take = 9,
        Use = 10,
        Buy = 11,
        Sell = 12,
        Open = 13,
        Close = 14,
        Msg = 15,
        Spec = 16,
        Admin = 17,
        List = 18,
        Tell = 20,
        Report = 21,
        Announce = 22,
        Server = 23,
        Drop = 24,
        Junk = 25,
        Obtain = 26,
        Get = 27,
        Kick = 28,
        Rank = 29,
        TargetSelf = 30,
        TargetOther = 31,
        TargetGroup = 33,
        Dialog = 34,
        Ping = 240,
        Pong = 241,
        Net3 = 242,
        Init = 255,
    }
}

/// Which side sent a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// Client to server.
    Client,
    /// Server to client.
    Server,
}

impl Direction {
    /// Lowercase name, as used in protocol descriptions.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Client => "client",
            Direction::Server => "server",
        }
    }

    /// Parse a direction name (case-insensitive).
    pub fn parse(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("client") {
            Some(Direction::Client)
        } else if name.eq_ignore_ascii_case("server") {
            Some(Direction::Server)
        } else {
            None
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Client => f.write_str("Client"),
            Direction::Server => f.write_str("Server"),
        }
    }
}

/// Key addressing a packet layout: who sent it, its family and its action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId {
    pub direction: Direction,
    pub family: PacketFamily,
    pub action: PacketAction,
}

impl ClassId {
    /// Build an identifier from already-resolved parts.
    pub fn new(direction: Direction, family: PacketFamily, action: PacketAction) -> Self {
        Self {
            direction,
            family,
            action,
        }
    }

    /// Direction-less `Family_Action` form.
    pub fn packet_id(&self) -> String {
        format!("{}_{}", self.family, self.action)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}_{}", self.direction, self.family, self.action)
    }
}

/// Resolve the class identifier for raw family and action bytes.
///
/// Returns `None` when either byte has no name.
pub fn resolve_identifier(direction: Direction, family: u8, action: u8) -> Option<ClassId> {
    Some(ClassId::new(
        direction,
        PacketFamily::from_byte(family)?,
        PacketAction::from_byte(action)?,
    ))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn families_round_trip() {
        for family in PacketFamily::ALL {
            assert_eq!(PacketFamily::from_byte(family.to_byte()), Some(*family));
            assert_eq!(PacketFamily::from_name(family.name()), Some(*family));
        }
        assert_eq!(PacketFamily::ALL.len(), 49);
    }

    #[test]
    fn actions_round_trip() {
        for action in PacketAction::ALL {
            assert_eq!(PacketAction::from_byte(action.to_byte()), Some(*action));
            assert_eq!(PacketAction::from_name(action.name()), Some(*action));
        }
        assert_eq!(PacketAction::ALL.len(), 36);
    }

    #[test]
    fn tables_are_bijective() {
        let bytes: HashSet<u8> = PacketFamily::ALL.iter().map(|f| f.to_byte()).collect();
        let names: HashSet<&str> = PacketFamily::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(bytes.len(), PacketFamily::ALL.len());
        assert_eq!(names.len(), PacketFamily::ALL.len());

        let bytes: HashSet<u8> = PacketAction::ALL.iter().map(|a| a.to_byte()).collect();
        let names: HashSet<&str> = PacketAction::ALL.iter().map(|a| a.name()).collect();
        assert_eq!(bytes.len(), PacketAction::ALL.len());
        assert_eq!(names.len(), PacketAction::ALL.len());
    }

    #[test]
    fn known_codes() {
        assert_eq!(PacketFamily::Welcome.to_byte(), 5);
        assert_eq!(PacketFamily::Init.to_byte(), 255);
        assert_eq!(PacketAction::Player.to_byte(), 8);
        assert_eq!(PacketAction::Net3.to_byte(), 242);
        assert_eq!(PacketFamily::from_name("NPCRange"), Some(PacketFamily::NPCRange));
    }

    #[test]
    fn undeclared_bytes_miss() {
        assert_eq!(PacketFamily::from_byte(250), None);
        assert_eq!(PacketFamily::from_byte(0), None);
        assert_eq!(PacketFamily::from_byte(10), None);
        assert_eq!(PacketAction::from_byte(19), None);
        assert_eq!(PacketFamily::from_name("welcome"), None);
    }

    #[test]
    fn resolve_identifier_hits_and_misses() {
        let id = resolve_identifier(Direction::Server, 5, 8).unwrap();
        assert_eq!(id.family, PacketFamily::Welcome);
        assert_eq!(id.action, PacketAction::Player);
        assert_eq!(id.to_string(), "Server:Welcome_Player");
        assert_eq!(id.packet_id(), "Welcome_Player");

        assert!(resolve_identifier(Direction::Server, 250, 8).is_none());
        assert!(resolve_identifier(Direction::Client, 5, 19).is_none());
    }

    #[test]
    fn same_inputs_same_identifier() {
        let a = resolve_identifier(Direction::Client, 4, 1);
        let b = resolve_identifier(Direction::Client, 4, 1);
        assert_eq!(a, b);
        assert_ne!(a, resolve_identifier(Direction::Server, 4, 1));
    }

    #[test]
    fn direction_parsing() {
        assert_eq!(Direction::parse("Client"), Some(Direction::Client));
        assert_eq!(Direction::parse("server"), Some(Direction::Server));
        assert_eq!(Direction::parse("proxy"), None);
        assert_eq!(Direction::Server.as_str(), "server");
    }
}
