//! Operator console commands for managing employees.

use std::str::FromStr;

use feedback_database::{ChatId, FeedbackStore};
use thiserror::Error;
use tracing::info;

use crate::error::BotResult;

pub const HELP: &[&str] = &[
    "Here are the available commands:",
    "abi <id> - adds employee by user ID",
    "abn <nickname> - adds an employee by user Nickname",
    "rbi <id> - removes an employee by user ID",
    "rbn <nickname> - removes an employee by user Nickname",
    "ge - displays a list of employees",
    "close - closes the program",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Help,
    AddById(ChatId),
    AddByNickname(String),
    RemoveById(ChatId),
    RemoveByNickname(String),
    ListEmployees,
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleParseError {
    #[error("Wrong format")]
    WrongFormat,
    #[error("Enter value")]
    MissingValue,
    #[error("Unknown command, use \"help\"")]
    Unknown(String),
}

impl FromStr for ConsoleCommand {
    type Err = ConsoleParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().unwrap_or_default();
        let value = words.next();

        let chat_id = |value: Option<&str>| -> Result<ChatId, ConsoleParseError> {
            value
                .ok_or(ConsoleParseError::MissingValue)?
                .parse()
                .map_err(|_| ConsoleParseError::WrongFormat)
        };
        let nickname = |value: Option<&str>| -> Result<String, ConsoleParseError> {
            let nick = value
                .map(|nick| nick.trim_start_matches('@'))
                .filter(|nick| !nick.is_empty())
                .ok_or(ConsoleParseError::MissingValue)?;
            Ok(nick.to_string())
        };

        match name {
            "help" => Ok(Self::Help),
            "abi" => chat_id(value).map(Self::AddById),
            "abn" => nickname(value).map(Self::AddByNickname),
            "rbi" => chat_id(value).map(Self::RemoveById),
            "rbn" => nickname(value).map(Self::RemoveByNickname),
            "ge" => Ok(Self::ListEmployees),
            "close" => Ok(Self::Close),
            other => Err(ConsoleParseError::Unknown(other.to_string())),
        }
    }
}

/// What the console prints, and whether the process should stop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleReply {
    pub lines: Vec<String>,
    pub close: bool,
}

impl ConsoleReply {
    fn say(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
            close: false,
        }
    }
}

#[derive(Clone)]
pub struct OperatorConsole {
    store: FeedbackStore,
}

impl OperatorConsole {
    pub fn new(store: FeedbackStore) -> Self {
        Self { store }
    }

    /// Parse and run one console line. Blank lines produce no output.
    pub async fn execute_line(&self, line: &str) -> BotResult<ConsoleReply> {
        if line.trim().is_empty() {
            return Ok(ConsoleReply::default());
        }
        match line.parse::<ConsoleCommand>() {
            Ok(command) => self.execute(command).await,
            Err(error) => Ok(ConsoleReply::say(error.to_string())),
        }
    }

    pub async fn execute(&self, command: ConsoleCommand) -> BotResult<ConsoleReply> {
        let users = self.store.users();

        let reply = match command {
            ConsoleCommand::Help => ConsoleReply {
                lines: HELP.iter().map(|line| line.to_string()).collect(),
                close: false,
            },
            ConsoleCommand::AddById(chat_id) => {
                users.set_employee_by_chat_id(chat_id, true).await?;
                info!(chat_id, "employee added from console");
                ConsoleReply::say("Employee added")
            }
            ConsoleCommand::AddByNickname(nickname) => {
                users.set_employee_by_nickname(&nickname, true).await?;
                info!(%nickname, "employee added from console");
                ConsoleReply::say("Employee added")
            }
            ConsoleCommand::RemoveById(chat_id) => {
                if users.find_by_chat_id(chat_id).await?.is_none() {
                    return Ok(ConsoleReply::say("Employee not found"));
                }
                users.set_employee_by_chat_id(chat_id, false).await?;
                info!(chat_id, "employee removed from console");
                ConsoleReply::say("Employee removed")
            }
            ConsoleCommand::RemoveByNickname(nickname) => {
                if users.find_by_nickname(&nickname).await?.is_none() {
                    return Ok(ConsoleReply::say("Employee not found"));
                }
                users.set_employee_by_nickname(&nickname, false).await?;
                info!(%nickname, "employee removed from console");
                ConsoleReply::say("Employee removed")
            }
            ConsoleCommand::ListEmployees => {
                let employees = users.list_employees().await?;
                if employees.is_empty() {
                    return Ok(ConsoleReply::say("No employees"));
                }
                let mut lines: Vec<String> = employees
                    .iter()
                    .map(|employee| {
                        format!(
                            "UserID: {} Nickname: {}",
                            employee
                                .chat_id
                                .map(|id| id.to_string())
                                .unwrap_or_default(),
                            employee.nickname.as_deref().unwrap_or_default()
                        )
                    })
                    .collect();
                lines.push("(empty fields are filled when the employee uses the bot)".to_string());
                ConsoleReply {
                    lines,
                    close: false,
                }
            }
            ConsoleCommand::Close => ConsoleReply {
                lines: Vec::new(),
                close: true,
            },
        };
        Ok(reply)
    }
}
