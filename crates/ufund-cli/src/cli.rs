use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

pub(crate) fn cli() -> Command {
    Command::new("ufund")
        .version(ufund_core::VERSION)
        .about("uFund cupboard client")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(std::path::PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .global(true)
                .help("Backend base URL (overrides config and UFUND_API_URL)"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .short('u')
                .global(true)
                .help("User name for commands that need a login"),
        )
        .arg(
            Arg::new("password")
                .long("password")
                .short('p')
                .global(true)
                .help("Password for --user"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("JSON logs and output"),
        )
        .subcommand(
            Command::new("needs").about("List cupboard needs").arg(
                Arg::new("search")
                    .long("search")
                    .short('s')
                    .help("Only needs whose name contains this"),
            ),
        )
        .subcommand(Command::new("basket").about("Show your basket"))
        .subcommand(
            Command::new("add")
                .about("Add a need to your basket")
                .arg(
                    Arg::new("need-id")
                        .required(true)
                        .value_parser(value_parser!(i32))
                        .help("Need to add"),
                )
                .arg(
                    Arg::new("count")
                        .long("count")
                        .short('c')
                        .default_value("1")
                        .value_parser(value_parser!(i32))
                        .help("Amount to contribute"),
                ),
        )
        .subcommand(
            Command::new("edit")
                .about("Change the count of a basket entry")
                .arg(position_arg())
                .arg(
                    Arg::new("count")
                        .required(true)
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(i32))
                        .help("New count"),
                ),
        )
        .subcommand(
            Command::new("remove")
                .about("Remove a basket entry")
                .arg(position_arg()),
        )
        .subcommand(Command::new("checkout").about("Commit every basket entry that fits"))
        .subcommand(
            Command::new("create-need")
                .about("Create a need (manager only)")
                .arg(Arg::new("name").long("name").required(true).help("Need name"))
                .arg(
                    Arg::new("cost")
                        .long("cost")
                        .required(true)
                        .value_parser(value_parser!(i32))
                        .help("Capacity ceiling"),
                )
                .arg(
                    Arg::new("type")
                        .long("type")
                        .default_value("goods")
                        .help("Need category"),
                )
                .arg(
                    Arg::new("quantity")
                        .long("quantity")
                        .default_value("0")
                        .value_parser(value_parser!(i32))
                        .help("Amount already committed"),
                )
                .arg(
                    Arg::new("description")
                        .long("description")
                        .default_value("")
                        .help("Description shown to helpers"),
                ),
        )
        .subcommand(
            Command::new("delete-need")
                .about("Delete a need (manager only)")
                .arg(
                    Arg::new("need-id")
                        .required(true)
                        .value_parser(value_parser!(i32))
                        .help("Need to delete"),
                ),
        )
        .subcommand(
            Command::new("restrict")
                .about("List restrictable users, or toggle one (manager only)")
                .arg(Arg::new("user-name").help("Account to toggle")),
        )
        .subcommand(Command::new("personalities").about("List chat personalities"))
        .subcommand(
            Command::new("chat")
                .about("Send a message to a chat personality")
                .arg(
                    Arg::new("personality-id")
                        .required(true)
                        .value_parser(value_parser!(i32))
                        .help("Personality to talk to"),
                )
                .arg(
                    Arg::new("message")
                        .required(true)
                        .num_args(1..)
                        .help("Message text"),
                ),
        )
}

fn position_arg() -> Arg {
    Arg::new("position")
        .required(true)
        .value_parser(value_parser!(usize))
        .help("Entry position as shown by `basket` (1-based)")
}

/// Argument that clap guarantees or defaults
pub(crate) fn arg<T>(args: &ArgMatches, name: &str) -> anyhow::Result<T>
where
    T: Clone + Send + Sync + 'static,
{
    args.get_one::<T>(name)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("missing argument `{name}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let matches = cli()
            .try_get_matches_from(["ufund", "add", "4", "--count", "3", "--user", "sam", "--json"])
            .unwrap();
        assert_eq!(matches.get_one::<String>("user").map(String::as_str), Some("sam"));
        assert!(matches.get_flag("json"));

        let (name, add) = matches.subcommand().unwrap();
        assert_eq!(name, "add");
        assert_eq!(arg::<i32>(add, "need-id").unwrap(), 4);
        assert_eq!(arg::<i32>(add, "count").unwrap(), 3);
    }

    #[test]
    fn edit_accepts_negative_count() {
        let matches = cli()
            .try_get_matches_from(["ufund", "edit", "1", "-2"])
            .unwrap();
        let (_, edit) = matches.subcommand().unwrap();
        assert_eq!(arg::<i32>(edit, "count").unwrap(), -2);
    }

    #[test]
    fn chat_collects_words() {
        let matches = cli()
            .try_get_matches_from(["ufund", "chat", "2", "where", "are", "the", "coats"])
            .unwrap();
        let (_, chat) = matches.subcommand().unwrap();
        let words: Vec<&String> = chat.get_many::<String>("message").unwrap().collect();
        assert_eq!(words.len(), 4);
    }

    #[test]
    fn missing_subcommand_is_error() {
        assert!(cli().try_get_matches_from(["ufund"]).is_err());
    }
}
