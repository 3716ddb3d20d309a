//! Sequans Monarch command set. Socket ids run 1..=6 on this chip.

pub mod sqnbandsel;
pub mod sqnccid;
pub mod sqndnslkup;
pub mod sqnipscfg;
pub mod sqnscfg;
pub mod sqnsd;
pub mod sqnsh;
pub mod sqnsi;
pub mod sqnsrecv;
pub mod sqnssendext;
pub mod sqnsshdn;
pub mod urc;

pub use sqnbandsel::SelectBands;
pub use sqnccid::GetIccid;
pub use sqndnslkup::ResolveHost;
pub use sqnipscfg::{SetInitialBaudRate, SetUartPowerSaving};
pub use sqnscfg::{ConfigureSocket, ConfigureSocketExt};
pub use sqnsd::{Dial, Transport};
pub use sqnsh::CloseSocket;
pub use sqnsi::{GetSocketInfo, SocketInfo};
pub use sqnsrecv::ReceiveData;
pub use sqnssendext::SendDataExt;
pub use sqnsshdn::{Reset, Shutdown};
