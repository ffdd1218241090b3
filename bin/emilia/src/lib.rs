mod action;
mod entity;
mod state;
mod storage;
mod topic;

pub use action::{Action, SwitchKey};
pub use entity::{Config, Entity};
pub use state::{RelayState, State, SubSwitchState, SwitchState};
pub use storage::Storage;
pub use topic::Topic;

use log::debug;

pub type ErasedError = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T> = std::result::Result<T, ErasedError>;

pub async fn perform_action(payload: &[u8], entity: &mut Entity) -> Result<()> {
    let action: Action = serde_json::from_slice(payload)?;
    debug!("performing action: {action:?}");

    entity.perform(action).await
}
