//! Quectel BG96 command set.

pub mod qccid;
pub mod qcfg;
pub mod qiclose;
pub mod qicsgp;
pub mod qidnsgip;
pub mod qigeterror;
pub mod qiopen;
pub mod qird;
pub mod qisend;
pub mod qpowd;
pub mod qurccfg;
pub mod urc;

pub use qccid::GetIccid;
pub use qcfg::{
    BandMask, GetBandMask, GetIotOpMode, GetScanMode, SetBandMask, SetIotOpMode, SetScanMode,
    SetPsmUrc,
};
pub use qiclose::CloseSocket;
pub use qicsgp::SetContextApn;
pub use qidnsgip::ResolveHost;
pub use qigeterror::{GetLastError, SocketError};
pub use qiopen::{ActivateContext, DeactivateContext, OpenSocket, SocketService};
pub use qird::ReadSocket;
pub use qisend::{SendData, SendDataTo};
pub use qpowd::PowerDown;
pub use qurccfg::RouteUrcsToUart;
