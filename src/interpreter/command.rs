use std::str::FromStr;

use thiserror::Error;

/// A parsed script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `create type <type> <num_fields> <pk_index> (<field> <str|int>)*`
    CreateType {
        type_name: String,
        /// 1-based, as written in the script
        primary_key: usize,
        fields: Vec<(String, String)>,
    },

    /// `create record <type> <value>*`
    CreateRecord {
        type_name: String,
        values: Vec<String>,
    },

    /// `search record <type> <key>`
    SearchRecord { type_name: String, key: String },

    /// `delete record <type> <key>`
    DeleteRecord { type_name: String, key: String },
}

/// Why a line could not be turned into a command.
///
/// `Empty` and `UnknownOperation` mean the line does not name an operation at
/// all. The other variants are bad arguments to a recognized operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Empty operation")]
    Empty,

    #[error("Invalid operation: {0}")]
    UnknownOperation(String),

    #[error("Insufficient arguments for '{0}'")]
    MissingArguments(String),

    #[error("Too many arguments for '{0}'")]
    TooManyArguments(String),

    #[error("'{value}' is not a valid {what}")]
    InvalidNumber { what: &'static str, value: String },

    #[error("Expected {expected} field arguments, got {actual}")]
    FieldArgumentCount { expected: usize, actual: usize },
}

impl Command {
    /// Returns true for lines the interpreter skips (blank or `#` comment).
    pub fn is_skippable(line: &str) -> bool {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    }
}

impl CommandError {
    /// True when the line names no known operation, as opposed to an
    /// operation with bad arguments.
    pub fn is_malformed(&self) -> bool {
        matches!(self, CommandError::Empty | CommandError::UnknownOperation(_))
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((verb, rest)) = tokens.split_first() else {
            return Err(CommandError::Empty);
        };
        let verb = verb.to_ascii_lowercase();
        let unknown = || CommandError::UnknownOperation(line.trim().to_string());

        let (noun, args) = rest.split_first().ok_or_else(unknown)?;
        // Fewest tokens after the noun for the line to name an operation at all
        let min_args = match (verb.as_str(), *noun) {
            ("create", "type") | ("create", "record") => 2,
            ("search", "record") | ("delete", "record") => 1,
            _ => return Err(unknown()),
        };
        if args.len() < min_args {
            return Err(unknown());
        }

        match (verb.as_str(), *noun) {
            ("create", "type") => parse_create_type(args),
            ("create", "record") => Ok(Command::CreateRecord {
                type_name: args[0].to_string(),
                values: args[1..].iter().map(|v| v.to_string()).collect(),
            }),
            ("search", "record") => {
                let (type_name, key) = type_and_key("search record", args)?;
                Ok(Command::SearchRecord { type_name, key })
            }
            _ => {
                let (type_name, key) = type_and_key("delete record", args)?;
                Ok(Command::DeleteRecord { type_name, key })
            }
        }
    }
}

fn parse_create_type(args: &[&str]) -> Result<Command, CommandError> {
    let [type_name, num_fields, primary_key, field_args @ ..] = args else {
        return Err(CommandError::MissingArguments("create type".to_string()));
    };

    let num_fields = parse_number("field count", num_fields)?;
    let primary_key = parse_number("primary key index", primary_key)?;
    if primary_key == 0 {
        return Err(CommandError::InvalidNumber {
            what: "primary key index (1-based)",
            value: "0".to_string(),
        });
    }

    if Some(field_args.len()) != num_fields.checked_mul(2) {
        return Err(CommandError::FieldArgumentCount {
            expected: num_fields.saturating_mul(2),
            actual: field_args.len(),
        });
    }

    let fields = field_args
        .chunks_exact(2)
        .map(|pair| (pair[0].to_string(), pair[1].to_string()))
        .collect();

    Ok(Command::CreateType {
        type_name: type_name.to_string(),
        primary_key,
        fields,
    })
}

fn type_and_key(op: &str, args: &[&str]) -> Result<(String, String), CommandError> {
    match args {
        [type_name, key] => Ok((type_name.to_string(), key.to_string())),
        [_, _, _, ..] => Err(CommandError::TooManyArguments(op.to_string())),
        _ => Err(CommandError::MissingArguments(op.to_string())),
    }
}

fn parse_number(what: &'static str, token: &str) -> Result<usize, CommandError> {
    token.parse().map_err(|_| CommandError::InvalidNumber {
        what,
        value: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create_type() {
        let cmd: Command = "create type house 6 1 name str origin str leader str military_strength int wealth int spice_production int"
            .parse()
            .unwrap();
        match cmd {
            Command::CreateType {
                type_name,
                primary_key,
                fields,
            } => {
                assert_eq!(type_name, "house");
                assert_eq!(primary_key, 1);
                assert_eq!(fields.len(), 6);
                assert_eq!(fields[3], ("military_strength".to_string(), "int".to_string()));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_record_commands() {
        assert_eq!(
            "create record planet Dune 500".parse::<Command>().unwrap(),
            Command::CreateRecord {
                type_name: "planet".to_string(),
                values: vec!["Dune".to_string(), "500".to_string()],
            }
        );
        assert_eq!(
            "  search   record planet Dune ".parse::<Command>().unwrap(),
            Command::SearchRecord {
                type_name: "planet".to_string(),
                key: "Dune".to_string(),
            }
        );
        assert_eq!(
            "DELETE record planet Dune".parse::<Command>().unwrap(),
            Command::DeleteRecord {
                type_name: "planet".to_string(),
                key: "Dune".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert!(matches!(
            "update record planet Dune".parse::<Command>(),
            Err(CommandError::UnknownOperation(_))
        ));
        assert!(matches!(
            "create type planet 2".parse::<Command>(),
            Err(CommandError::MissingArguments(_))
        ));
        assert!(matches!(
            "create type planet two 1 name str size int".parse::<Command>(),
            Err(CommandError::InvalidNumber { .. })
        ));
        assert!(matches!(
            "create type planet 1 0 name str".parse::<Command>(),
            Err(CommandError::InvalidNumber { .. })
        ));
        assert_eq!(
            "create type planet 2 1 name str size".parse::<Command>(),
            Err(CommandError::FieldArgumentCount {
                expected: 4,
                actual: 3
            })
        );
        assert!(matches!(
            "create record planet".parse::<Command>(),
            Err(CommandError::UnknownOperation(_))
        ));
        assert!(matches!(
            "search record".parse::<Command>(),
            Err(CommandError::UnknownOperation(_))
        ));
        assert!(matches!(
            "create type planet 1 -1 name str".parse::<Command>(),
            Err(CommandError::InvalidNumber { .. })
        ));
        assert!(matches!(
            "search record planet".parse::<Command>(),
            Err(CommandError::MissingArguments(_))
        ));
        assert!(matches!(
            "search record planet Dune extra".parse::<Command>(),
            Err(CommandError::TooManyArguments(_))
        ));
    }

    #[test]
    fn test_malformed_versus_bad_arguments() {
        let kind = |line: &str| line.parse::<Command>().unwrap_err().is_malformed();

        assert!(kind("update record planet Dune"));
        assert!(kind("create"));
        assert!(kind("create type planet"));
        assert!(kind("delete record"));

        assert!(!kind("create type moon 2"));
        assert!(!kind("create type sun 1 0 name str"));
        assert!(!kind("search record planet"));
        assert!(!kind("delete record planet Dune extra"));
    }

    #[test]
    fn test_skippable() {
        assert!(Command::is_skippable("   "));
        assert!(Command::is_skippable("# a comment"));
        assert!(!Command::is_skippable("search record planet Dune"));
    }
}
