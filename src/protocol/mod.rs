pub mod chunk;
pub mod codec;
pub mod handshake;
pub mod keep_alive;
pub mod kick;
pub mod login;
pub mod packet;
pub mod player_position_and_look;
pub mod spawn_position;

pub use codec::{ClientCodec, ServerCodec};
pub use packet::{ClientPacket, Frame, Packet, ServerPacket};
