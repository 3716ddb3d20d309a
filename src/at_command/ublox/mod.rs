//! u-blox SARA-R4/R5 command set.
//!
//! Socket payloads travel in hex mode (`+UDCONF=1,1`) so binary data never
//! shares a line with the CSV framing.

pub mod ccid;
pub mod cpwroff;
pub mod hex;
pub mod ubandmask;
pub mod udconf;
pub mod udnsrn;
pub mod umnoprof;
pub mod upsv;
pub mod urat;
pub mod urc;
pub mod usocl;
pub mod usoco;
pub mod usocr;
pub mod usoctl;
pub mod usord;
pub mod usorf;
pub mod usoso;
pub mod usost;
pub mod usowr;

pub use ccid::GetIccid;
pub use cpwroff::PowerOff;
pub use ubandmask::{GetBandMask, RatBandMask, SetBandMask};
pub use udconf::SetHexMode;
pub use udnsrn::ResolveHost;
pub use umnoprof::{GetMnoProfile, MnoProfile, SetMnoProfile};
pub use upsv::SetUartPowerSaving;
pub use urat::{GetRatSelection, RatSelection, SetRatSelection};
pub use usocl::CloseSocket;
pub use usoco::ConnectSocket;
pub use usocr::{CreateSocket, Protocol, SocketId};
pub use usoctl::{GetOutboundPending, OutboundPending};
pub use usord::ReadSocket;
pub use usorf::ReceiveFrom;
pub use usoso::SetSocketOption;
pub use usost::SendTo;
pub use usowr::WriteSocket;
