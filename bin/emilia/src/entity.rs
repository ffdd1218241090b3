use crate::state::{RelayState, State, SwitchState};
use crate::{Action, Result, SwitchKey};

use log::{error, info, warn};
use miot::{
    CommandExecutor, CommandExecutorTrait, Dehumidifier, Device, MiotSwitch, RelayBank, Spec,
    SWITCH_SERVICES,
};

pub struct Config {
    pub model: String,
    pub miot_type: Option<String>,
    pub advanced: bool,
}

pub enum Entity<E = CommandExecutor> {
    Dehumidifier(Dehumidifier<E>),
    Relay {
        bank: RelayBank<E>,
        advanced: bool,
    },
    Switches(Vec<MiotSwitch<E>>),
}

impl Entity {
    pub async fn setup(config: Config, device: Device) -> Result<Entity> {
        if config.model.contains("derh") {
            info!("created dehumidifier for {}", config.model);

            return Ok(Entity::Dehumidifier(Dehumidifier::new(
                CommandExecutor::new(device),
            )));
        }

        if config.model == "pwzn.relay.banana" {
            info!("created relay bank for {}", config.model);

            return Ok(Entity::Relay {
                bank: RelayBank::new(CommandExecutor::new(device)),
                advanced: config.advanced,
            });
        }

        let miot_type = config
            .miot_type
            .ok_or("set ENV variable MIOT_TYPE for unknown models")?;
        let spec = Spec::for_type(&miot_type).await?;

        let mut switches = Vec::new();
        for service in spec.services(SWITCH_SERVICES) {
            if let Some(switch) = MiotSwitch::from_service(
                CommandExecutor::new(device.clone()),
                &config.model,
                &spec,
                service,
            ) {
                info!("created switch {} ({})", switch.key(), switch.name());
                switches.push(switch);
            }
        }

        if switches.is_empty() {
            return Err(format!("no switch services in {miot_type}").into());
        }

        Ok(Entity::Switches(switches))
    }
}

impl<E: CommandExecutorTrait + Send> Entity<E> {
    pub async fn update(&mut self) -> Result<()> {
        match self {
            Entity::Dehumidifier(dehumidifier) => {
                dehumidifier.update().await?;
            }
            Entity::Relay { bank, .. } => {
                bank.update().await?;
            }
            Entity::Switches(switches) => {
                // one broken service must not hide the others
                for switch in switches.iter_mut() {
                    if let Err(err) = switch.update().await {
                        error!("Error updating switch {}: {}", switch.key(), err);
                    }
                }
            }
        }

        Ok(())
    }

    /// `None` until the first successful update.
    pub fn state(&self) -> Option<State> {
        match self {
            Entity::Dehumidifier(dehumidifier) => {
                dehumidifier.status().cloned().map(State::Dehumidifier)
            }
            Entity::Relay { bank, advanced } => bank
                .status()
                .map(|status| State::Relay(RelayState::new(status, *advanced))),
            Entity::Switches(switches) => {
                let states: Vec<_> = switches.iter().filter_map(SwitchState::new).collect();

                if states.is_empty() {
                    None
                } else {
                    Some(State::Switches(states))
                }
            }
        }
    }

    pub async fn perform(&mut self, action: Action) -> Result<()> {
        let accepted = match self {
            Entity::Dehumidifier(dehumidifier) => match action {
                Action::SetIsEnabled(is_enabled) => dehumidifier.set_enabled(is_enabled).await?,
                Action::SetHumidity(humidity) => {
                    dehumidifier.set_target_humidity(humidity).await?
                }
                Action::SetMode(mode) => dehumidifier.set_mode(mode).await?,
                Action::SetSwitch { .. } => {
                    return Err("dehumidifier has no sub-switches".into())
                }
            },
            Entity::Relay { bank, .. } => match action {
                Action::SetIsEnabled(is_enabled) => bank.power_all(is_enabled).await?,
                Action::SetSwitch { key, is_enabled } => match key {
                    SwitchKey::Relay { group, switch } => {
                        let index = {
                            let status = bank.status().ok_or("relay state is not known yet")?;

                            status
                                .switches()
                                .into_iter()
                                .find(|sub| sub.group == group && sub.switch == switch)
                                .map(|sub| sub.index)
                                .ok_or_else(|| format!("unknown switch g{group}s{switch}"))?
                        };

                        bank.set_switch(index, is_enabled).await?
                    }
                    SwitchKey::G2Enable => bank.set_g2_enable(is_enabled).await?,
                    SwitchKey::CodeEnable => bank.set_code_enable(is_enabled).await?,
                    SwitchKey::Service(name) => {
                        return Err(format!("unknown switch key {name}").into())
                    }
                },
                _ => return Err("unsupported action for relay".into()),
            },
            Entity::Switches(switches) => match action {
                Action::SetSwitch {
                    key: SwitchKey::Service(name),
                    is_enabled,
                } => {
                    let switch = switches
                        .iter_mut()
                        .find(|switch| switch.key() == name)
                        .ok_or_else(|| format!("unknown switch {name}"))?;

                    switch.set_enabled(is_enabled).await?
                }
                _ => return Err("only set_switch is supported for switch entities".into()),
            },
        };

        if !accepted {
            warn!("device refused the command");
        }

        Ok(())
    }
}
