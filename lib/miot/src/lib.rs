mod command;
mod device;
mod property;
mod spec;

mod dehumidifier;
mod relay;
mod switch;

mod error;
pub use error::Error;

pub use command::Command;
#[cfg(feature = "stub")]
pub use device::StubCommandExecutor;
pub use device::{CommandExecutor, CommandExecutorTrait, Device};
pub use property::{Mapping, PropertyId, PropertyParam, PropertyResult};

pub use dehumidifier::{
    Dehumidifier, Mode, Status as DehumidifierStatus, MAX_HUMIDITY, MIN_HUMIDITY,
};
pub use relay::{RelayBank, RelayStatus, SubSwitch};
pub use spec::{Property, Service, Spec};
pub use switch::{DeviceClass, MiotSwitch, SWITCH_SERVICES};

pub type Result<T> = std::result::Result<T, Error>;
