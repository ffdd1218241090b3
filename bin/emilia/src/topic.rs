use std::fmt;
use std::str::FromStr;

use serde::de::{value, Error};

#[derive(Debug, PartialEq)]
pub enum Topic {
    State(String),
    ActionRequest(String),
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Topic::State(device_id) => write!(f, "emilia/state/{}", device_id),
            Topic::ActionRequest(device_id) => write!(f, "emilia/action/request/{}", device_id),
        }
    }
}

impl FromStr for Topic {
    type Err = value::Error;

    fn from_str(s: &str) -> std::result::Result<Topic, Self::Err> {
        const ERROR_MSG: &str =
            "supported topics are emilia/state/<id> and emilia/action/request/<id>";

        let (topic, device_id) = s
            .rsplit_once('/')
            .ok_or_else(|| value::Error::custom(ERROR_MSG))?;

        match topic {
            "emilia/state" => Ok(Topic::State(device_id.to_string())),
            "emilia/action/request" => Ok(Topic::ActionRequest(device_id.to_string())),
            _ => Err(value::Error::custom(ERROR_MSG)),
        }
    }
}
